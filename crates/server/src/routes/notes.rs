use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::note::{CreateNote, NoteWithDetails};
use services::services::{
    auth::AuthUser,
    notes::{NoteQuery, NoteService},
};
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{ApiJson, ApiQuery},
    routes::authenticated,
};

/// GET /api/notes?clientId=&tradePersonId=&allocationId=
pub async fn list_notes(
    State(deployment): State<DeploymentImpl>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<NoteQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<NoteWithDetails>>>, ApiError> {
    let notes = NoteService::list(&deployment.db().pool, &user, &query).await?;
    Ok(ResponseJson(ApiResponse::success(notes)))
}

pub async fn create_note(
    State(deployment): State<DeploymentImpl>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateNote>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<NoteWithDetails>>), ApiError> {
    let note = NoteService::create(&deployment.db().pool, &user, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(note))))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/notes",
        authenticated(
            deployment,
            Router::new().route("/", get(list_notes).post(create_note)),
        ),
    )
}
