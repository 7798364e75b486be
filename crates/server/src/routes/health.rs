use axum::{Router, response::Json as ResponseJson, routing::get};
use serde::Serialize;

use crate::DeploymentImpl;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

pub async fn health_check() -> ResponseJson<HealthStatus> {
    ResponseJson(HealthStatus { status: "ok" })
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/health", get(health_check))
}
