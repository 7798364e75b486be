use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use services::services::{
    auth::AuthError, clients::ClientError, jobs::JobError, notes::NoteError,
    schedule::ScheduleError, tradies::TradieError, users::UserError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Tradie(#[from] TradieError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Note(#[from] NoteError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(err) => match err {
                AuthError::Database(db) => database_status(db),
                AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::Password(_) | AuthError::TokenEncoding(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::User(err) => match err {
                UserError::Database(db) => database_status(db),
                UserError::Validation(_) => StatusCode::BAD_REQUEST,
                UserError::NotFound => StatusCode::NOT_FOUND,
                UserError::Forbidden(_) => StatusCode::FORBIDDEN,
                UserError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Client(err) => match err {
                ClientError::Database(db) => database_status(db),
                ClientError::Validation(_) => StatusCode::BAD_REQUEST,
                ClientError::NotFound => StatusCode::NOT_FOUND,
            },
            ApiError::Tradie(err) => match err {
                TradieError::Database(db) => database_status(db),
                TradieError::NotFound => StatusCode::NOT_FOUND,
                TradieError::Validation(_)
                | TradieError::InvalidUser
                | TradieError::AlreadyRegistered
                | TradieError::UnknownTradeRoles(_) => StatusCode::BAD_REQUEST,
            },
            ApiError::Job(err) => match err {
                JobError::Database(db) => database_status(db),
                JobError::NotFound => StatusCode::NOT_FOUND,
                JobError::Validation(_)
                | JobError::ClientNotFound
                | JobError::UnknownTradeRoles(_) => StatusCode::BAD_REQUEST,
            },
            ApiError::Schedule(err) => match err {
                ScheduleError::Database(db) => database_status(db),
                ScheduleError::Validation(_)
                | ScheduleError::AlreadyAllocated
                | ScheduleError::JobNotFound
                | ScheduleError::TradePersonNotFound => StatusCode::BAD_REQUEST,
                ScheduleError::NotFound | ScheduleError::NoTradePersonRecord => {
                    StatusCode::NOT_FOUND
                }
                                ScheduleError::Forbidden(_) => StatusCode::FORBIDDEN,
            },
            ApiError::Note(err) => match err {
                NoteError::Database(db) => database_status(db),
                NoteError::Validation(_) => StatusCode::BAD_REQUEST,
                NoteError::Forbidden(_) => StatusCode::FORBIDDEN,
                NoteError::NotFound => StatusCode::NOT_FOUND,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(db) => database_status(db),
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn database_error(&self) -> Option<&sqlx::Error> {
        match self {
            ApiError::Auth(AuthError::Database(db))
            | ApiError::User(UserError::Database(db))
            | ApiError::Client(ClientError::Database(db))
            | ApiError::Tradie(TradieError::Database(db))
            | ApiError::Job(JobError::Database(db))
            | ApiError::Schedule(ScheduleError::Database(db))
            | ApiError::Note(NoteError::Database(db))
            | ApiError::Database(db) => Some(db),
            _ => None,
        }
    }

    /// Text sent to the client. Internal failures are not described.
    pub fn public_message(&self) -> String {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            return "Internal server error".to_string();
        }
        match self.database_error() {
            Some(_) if status == StatusCode::CONFLICT => "Resource already exists".to_string(),
            Some(_) if status == StatusCode::BAD_REQUEST => {
                "Referenced record does not exist".to_string()
            }
            Some(_) if status == StatusCode::NOT_FOUND => "Not found".to_string(),
            _ => self.to_string(),
        }
    }
}

fn database_status(err: &sqlx::Error) -> StatusCode {
    match err {
        sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
        sqlx::Error::Database(db) if db.is_unique_violation() => StatusCode::CONFLICT,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }
        let body = ApiResponse::<()>::error(&self.public_message());
        (status, ResponseJson(body)).into_response()
    }
}
