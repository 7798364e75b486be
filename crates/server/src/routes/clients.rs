use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::client::{Client, CreateClient, UpdateClient};
use services::services::clients::ClientService;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    routes::staff_only,
};

pub async fn list_clients(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Client>>>, ApiError> {
    let clients = ClientService::list(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(clients)))
}

pub async fn create_client(
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<CreateClient>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Client>>), ApiError> {
    let client = ClientService::create(&deployment.db().pool, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(client))))
}

pub async fn update_client(
    State(deployment): State<DeploymentImpl>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateClient>,
) -> Result<ResponseJson<ApiResponse<Client>>, ApiError> {
    let client = ClientService::update(&deployment.db().pool, id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(client)))
}

pub async fn delete_client(
    State(deployment): State<DeploymentImpl>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ResponseJson<ApiResponse<Client>>, ApiError> {
    let client = ClientService::delete(&deployment.db().pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(client)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/clients",
        staff_only(
            deployment,
            Router::new()
                .route("/", get(list_clients).post(create_client))
                .route("/{id}", put(update_client).delete(delete_client)),
        ),
    )
}
