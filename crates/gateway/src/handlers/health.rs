//! Health check handlers

use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use sitechat_search::{EngineStatus, IndexStats};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub engine: EngineStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexStats>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: sitechat_common::VERSION.to_string(),
    })
}

/// Readiness probe - ready once the search engine is built.
///
/// Chat keeps answering from rules while this reports `not_ready`.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let engine = state.engine.status();
    let index = state.engine.engine().map(|engine| engine.stats());

    let status = if engine == EngineStatus::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadyResponse {
            status: if status.is_success() { "ready" } else { "not_ready" }.to_string(),
            engine,
            error: state.engine.failure_reason(),
            index,
        }),
    )
}

/// Prometheus exposition
pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
