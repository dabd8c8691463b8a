//! Chat transcripts

use crate::responder::{ChatReply, Responder};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sitechat_search::KnowledgeSearch;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            sent_at: Utc::now(),
        }
    }
}

/// A single visitor's chat history, opened with the welcome message
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(welcome: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            messages: vec![ChatMessage::new(Role::Bot, welcome)],
        }
    }

    /// Append a user message and the bot's reply to it
    pub fn record(&mut self, user_text: &str, reply: &ChatReply) -> &ChatMessage {
        self.messages.push(ChatMessage::new(Role::User, user_text));
        self.messages.push(ChatMessage::new(Role::Bot, reply.content.clone()));
        &self.messages[self.messages.len() - 1]
    }

    /// Drop the oldest exchanges until at most `max` messages remain.
    /// The welcome message and the latest exchange are always kept.
    /// Returns how many messages were dropped.
    pub fn trim_history(&mut self, max: usize) -> usize {
        let limit = max.max(3);
        let excess = self.messages.len().saturating_sub(limit);
        if excess == 0 {
            return 0;
        }

        // Whole exchanges only
        let dropped = excess.div_ceil(2) * 2;
        self.messages.drain(1..1 + dropped);
        dropped
    }

    /// Ask `responder` for a reply and record the exchange
    pub async fn send(
        &mut self,
        responder: &Responder,
        text: &str,
        search: Option<&dyn KnowledgeSearch>,
    ) -> ChatReply {
        let reply = responder.respond(text, search).await;
        self.record(text, &reply);
        reply
    }
}
