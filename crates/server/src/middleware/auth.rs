use axum::{
    Extension,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use services::services::auth::AuthUser;

use crate::{DeploymentImpl, error::ApiError};

/// Verify the bearer token and attach the caller's [`AuthUser`] to the request.
pub async fn require_auth(
    State(deployment): State<DeploymentImpl>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = {
        let token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized(
                "Missing or invalid Authorization header",
            ))?;
        deployment.auth().verify_token(token)?
    };
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Only SystemAdmin and OfficeStaff get past. Must run after [`require_auth`].
pub async fn require_staff(
    Extension(user): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !user.is_staff() {
        tracing::debug!(user_id = %user.id, role = %user.role, "Staff route refused");
        return Err(ApiError::Forbidden("Forbidden"));
    }
    Ok(next.run(request).await)
}
