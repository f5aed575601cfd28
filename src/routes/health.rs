//! Liveness endpoint
//!
//! `/health` always answers 200 while the process is serving, and reports
//! build and runtime details for deployment checks.

use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::routes::response::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
    pub commit: String,
    pub build_time: String,
    /// Uptime in seconds
    pub uptime: u64,
    pub node_id: String,
    /// `development` or `production`
    pub mode: String,
    /// Active storage backend
    pub store: String,
    pub timestamp: String,
}

pub fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown").to_string(),
        uptime: state.started_at.elapsed().as_secs(),
        node_id: state.args.node_id.to_string(),
        mode: if state.args.dev_mode {
            "development".into()
        } else {
            "production".into()
        },
        store: state.store_backend.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

pub fn health_check(state: &AppState) -> Response<BoxBody> {
    json_response(StatusCode::OK, &build_health_response(state))
}
