//! Search handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sitechat_common::errors::{AppError, Result};
use sitechat_search::{join_terms, RankedTerm};
use std::time::Instant;
use validator::Validate;

use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1, max = 2000))]
    pub query: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    /// Matched query terms, most frequent in the corpus first
    pub result: String,
    pub terms: Vec<RankedTerm>,
    pub processing_time_ms: u64,
}

/// Rank the query's terms against the knowledge corpus
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("query".to_string()),
    })?;

    let terms = state.engine.ranked_terms_now(&request.query)?;
    let result = join_terms(&terms);

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        query = %request.query,
        matched = terms.len(),
        latency_ms = processing_time_ms,
        "Search completed"
    );

    Ok(Json(SearchResponse {
        query: request.query,
        result,
        terms,
        processing_time_ms,
    }))
}
