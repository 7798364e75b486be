use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::user::{CreateUser, UpdateUser, User};
use services::services::{auth::AuthUser, users::UserService};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, extract::{ApiJson, ApiPath}, routes::staff_only};

pub async fn list_users(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let users = UserService::list(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

pub async fn create_user(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateUser>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<User>>), ApiError> {
    let user =
        UserService::create(&deployment.db().pool, deployment.auth(), &actor, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(user))))
}

pub async fn update_user(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateUser>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = UserService::update(
        &deployment.db().pool,
        deployment.auth(),
        &actor,
        id,
        &payload,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub async fn delete_user(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = UserService::delete(&deployment.db().pool, &actor, id).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/users",
        staff_only(
            deployment,
            Router::new()
                .route("/", get(list_users).post(create_user))
                .route("/{id}", put(update_user).delete(delete_user)),
        ),
    )
}
