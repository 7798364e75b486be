use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::allocation::{Allocation, AllocationDetails, CreateAllocation};
use services::services::{
    auth::AuthUser,
    schedule::{AllocationOutcome, GridResponse, ScheduleService, WeekQuery, WeekSchedule},
};
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::{authenticated, staff_only},
};

/// GET /api/schedule/grid?weekStart=YYYY-MM-DD
pub async fn get_grid(
    State(deployment): State<DeploymentImpl>,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> Result<ResponseJson<ApiResponse<GridResponse>>, ApiError> {
    let grid = ScheduleService::grid(&deployment.db().pool, &query).await?;
    Ok(ResponseJson(ApiResponse::success(grid)))
}

/// GET /api/schedule/gantt/{trade_person_id}?weekStart=YYYY-MM-DD
pub async fn get_gantt(
    State(deployment): State<DeploymentImpl>,
    Extension(user): Extension<AuthUser>,
    ApiPath(trade_person_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> Result<ResponseJson<ApiResponse<WeekSchedule>>, ApiError> {
    let week =
        ScheduleService::gantt(&deployment.db().pool, &user, trade_person_id, &query).await?;
    Ok(ResponseJson(ApiResponse::success(week)))
}

/// GET /api/schedule/my-schedule?weekStart=YYYY-MM-DD
pub async fn get_my_schedule(
    State(deployment): State<DeploymentImpl>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> Result<ResponseJson<ApiResponse<WeekSchedule>>, ApiError> {
    let week = ScheduleService::my_schedule(&deployment.db().pool, &user, &query).await?;
    Ok(ResponseJson(ApiResponse::success(week)))
}

/// POST /api/schedule
/// 201 for a new booking, 200 when a previously removed slot is reused
pub async fn create_allocation(
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<CreateAllocation>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<AllocationDetails>>), ApiError> {
    let (allocation, outcome) =
        ScheduleService::create_allocation(&deployment.db().pool, &payload).await?;
    let status = match outcome {
        AllocationOutcome::Created => StatusCode::CREATED,
        AllocationOutcome::Restored => StatusCode::OK,
    };
    Ok((status, ResponseJson(ApiResponse::success(allocation))))
}

pub async fn delete_allocation(
    State(deployment): State<DeploymentImpl>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ResponseJson<ApiResponse<Allocation>>, ApiError> {
    let allocation = ScheduleService::delete_allocation(&deployment.db().pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(allocation)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let staff = staff_only(
        deployment,
        Router::new()
            .route("/grid", get(get_grid))
            .route("/", post(create_allocation))
            .route("/{id}", delete(delete_allocation)),
    );
    let viewers = authenticated(
        deployment,
        Router::new()
            .route("/gantt/{trade_person_id}", get(get_gantt))
            .route("/my-schedule", get(get_my_schedule)),
    );
    Router::new().nest("/schedule", staff.merge(viewers))
}
