//! Health endpoint.
//!
//! `GET /health` reports liveness and the size of the active rule set. It is
//! routed directly by axum and hardened through
//! [`HelmetLayer`](crate::helmet::HelmetLayer) rather than the dispatcher.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_rules: usize,
    pub uptime_seconds: u64,
}

/// Health check endpoint.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "active_rules": 13,
///   "uptime_seconds": 42
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_rules: state.helmet.rules().len(),
        uptime_seconds: state.uptime_seconds(),
    })
}
