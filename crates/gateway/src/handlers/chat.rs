//! Stateless chat handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sitechat_common::errors::{AppError, Result};
use sitechat_responder::ChatReply;
use sitechat_search::EngineStatus;
use validator::Validate;

use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

impl ChatRequest {
    pub fn validated(self) -> Result<Self> {
        self.validate().map_err(|e| AppError::Validation {
            message: e.to_string(),
            field: Some("message".to_string()),
        })?;
        Ok(self)
    }
}

#[derive(Serialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub reply: ChatReply,
    /// Engine status at reply time; search replies need `ready`
    pub engine: EngineStatus,
}

/// One-shot reply without a session
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let request = request.validated()?;
    let reply = state.responder.respond(&request.message, Some(&state.engine)).await;

    tracing::info!(tier = reply.tier.label(), "Chat reply sent");

    Ok(Json(ChatResponse {
        reply,
        engine: state.engine.status(),
    }))
}
