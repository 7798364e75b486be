use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    trade_person::{CreateTradePerson, TradePerson, TradePersonWithDetails, UpdateTradePerson},
    trade_role::TradeRole,
};
use services::services::tradies::TradieService;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, extract::{ApiJson, ApiPath}, routes::staff_only};

pub async fn list_tradies(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<TradePersonWithDetails>>>, ApiError> {
    let tradies = TradieService::list(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(tradies)))
}

pub async fn get_tradie(
    State(deployment): State<DeploymentImpl>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ResponseJson<ApiResponse<TradePersonWithDetails>>, ApiError> {
    let tradie = TradieService::get(&deployment.db().pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(tradie)))
}

/// GET /api/tradies/roles/list
pub async fn list_trade_roles(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<TradeRole>>>, ApiError> {
    let roles = TradieService::trade_roles(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(roles)))
}

pub async fn create_tradie(
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<CreateTradePerson>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<TradePersonWithDetails>>), ApiError> {
    let tradie = TradieService::create(&deployment.db().pool, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(tradie))))
}

pub async fn update_tradie(
    State(deployment): State<DeploymentImpl>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateTradePerson>,
) -> Result<ResponseJson<ApiResponse<TradePersonWithDetails>>, ApiError> {
    let tradie = TradieService::update(&deployment.db().pool, id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(tradie)))
}

pub async fn delete_tradie(
    State(deployment): State<DeploymentImpl>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ResponseJson<ApiResponse<TradePerson>>, ApiError> {
    let tradie = TradieService::delete(&deployment.db().pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(tradie)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/tradies",
        staff_only(
            deployment,
            Router::new()
                .route("/", get(list_tradies).post(create_tradie))
                .route("/roles/list", get(list_trade_roles))
                .route(
                    "/{id}",
                    get(get_tradie).put(update_tradie).delete(delete_tradie),
                ),
        ),
    )
}
