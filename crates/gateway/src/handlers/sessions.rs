//! Conversation session handlers
//!
//! Sessions live in memory; see [`crate::sessions::Sessions`] for the caps.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use sitechat_common::errors::{AppError, Result};
use sitechat_responder::{ChatMessage, ChatReply, Conversation};
use uuid::Uuid;

use super::chat::ChatRequest;
use crate::AppState;

#[derive(Serialize)]
pub struct MessageResponse {
    pub session_id: Uuid,
    pub reply: ChatReply,
    pub message: ChatMessage,
}

fn not_found(id: Uuid) -> AppError {
    AppError::SessionNotFound { id: id.to_string() }
}

/// Open a conversation with the welcome message
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<Conversation>) {
    let conversation = Conversation::new(&state.config.chat.welcome_message);
    let live = {
        let mut sessions = state.sessions.write().await;
        sessions.insert(conversation.clone());
        sessions.len()
    };

    tracing::info!(session_id = %conversation.id, live, "Session created");

    (StatusCode::CREATED, Json(conversation))
}

/// Full transcript
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Conversation>> {
    state
        .sessions
        .read()
        .await
        .get(&session_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(session_id))
}

/// Send a message in a conversation and return the bot's reply
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<MessageResponse>> {
    let request = request.validated()?;

    if !state.sessions.read().await.contains(&session_id) {
        return Err(not_found(session_id));
    }

    // Reply outside the lock; the session may be gone by the time we record
    let reply = state.responder.respond(&request.message, Some(&state.engine)).await;

    let message = state
        .sessions
        .write()
        .await
        .record(&session_id, &request.message, &reply)
        .ok_or_else(|| not_found(session_id))?;

    tracing::info!(
        session_id = %session_id,
        tier = reply.tier.label(),
        "Session message answered"
    );

    Ok(Json(MessageResponse {
        session_id,
        reply,
        message,
    }))
}
