use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::job::{CreateJob, Job, JobSummary, JobWithAllocations, JobWithDetails, UpdateJob};
use services::services::jobs::JobService;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, extract::{ApiJson, ApiPath}, routes::staff_only};

/// GET /api/jobs
/// Live jobs with how many of each requirement's slots are booked
pub async fn list_jobs(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<JobSummary>>>, ApiError> {
    let jobs = JobService::list(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(jobs)))
}

pub async fn get_job(
    State(deployment): State<DeploymentImpl>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ResponseJson<ApiResponse<JobWithAllocations>>, ApiError> {
    let job = JobService::get(&deployment.db().pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(job)))
}

pub async fn create_job(
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<CreateJob>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<JobWithDetails>>), ApiError> {
    let job = JobService::create(&deployment.db().pool, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(job))))
}

pub async fn update_job(
    State(deployment): State<DeploymentImpl>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateJob>,
) -> Result<ResponseJson<ApiResponse<JobWithDetails>>, ApiError> {
    let job = JobService::update(&deployment.db().pool, id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(job)))
}

pub async fn delete_job(
    State(deployment): State<DeploymentImpl>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ResponseJson<ApiResponse<Job>>, ApiError> {
    let job = JobService::delete(&deployment.db().pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(job)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/jobs",
        staff_only(
            deployment,
            Router::new()
                .route("/", get(list_jobs).post(create_job))
                .route("/{id}", get(get_job).put(update_job).delete(delete_job)),
        ),
    )
}
