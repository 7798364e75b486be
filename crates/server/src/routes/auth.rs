use axum::{
    Extension, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::UserSummary;
use services::services::auth::{AuthService, AuthUser, LoginRequest, LoginResponse};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, extract::ApiJson, routes::authenticated};

/// POST /api/auth/login
pub async fn login(
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    let response = deployment
        .auth()
        .login(&deployment.db().pool, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

/// GET /api/auth/me
pub async fn me(
    State(deployment): State<DeploymentImpl>,
    Extension(user): Extension<AuthUser>,
) -> Result<ResponseJson<ApiResponse<UserSummary>>, ApiError> {
    let summary = AuthService::me(&deployment.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/login", post(login))
            .merge(authenticated(deployment, Router::new().route("/me", get(me)))),
    )
}
