use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    DeploymentImpl,
    middleware::auth::{require_auth, require_staff},
};

pub mod auth;
pub mod clients;
pub mod health;
pub mod jobs;
pub mod notes;
pub mod schedule;
pub mod tradies;
pub mod users;

pub fn router(deployment: DeploymentImpl) -> Router {
    let api = Router::new()
        .merge(auth::router(&deployment))
        .merge(users::router(&deployment))
        .merge(clients::router(&deployment))
        .merge(tradies::router(&deployment))
        .merge(jobs::router(&deployment))
        .merge(schedule::router(&deployment))
        .merge(notes::router(&deployment));

    Router::new()
        .merge(health::router())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(deployment)
}

/// Wrap `routes` so only authenticated callers reach them.
pub(crate) fn authenticated(
    deployment: &DeploymentImpl,
    routes: Router<DeploymentImpl>,
) -> Router<DeploymentImpl> {
    routes.route_layer(from_fn_with_state(deployment.clone(), require_auth))
}

/// Wrap `routes` so only authenticated staff reach them.
pub(crate) fn staff_only(
    deployment: &DeploymentImpl,
    routes: Router<DeploymentImpl>,
) -> Router<DeploymentImpl> {
    authenticated(deployment, routes.route_layer(from_fn(require_staff)))
}
