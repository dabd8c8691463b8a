//! In-memory conversation store
//!
//! Holds at most `max_sessions` conversations; creating one more evicts the
//! oldest. Each conversation keeps at most `max_messages` messages.

use sitechat_common::config::ChatConfig;
use sitechat_responder::{ChatMessage, ChatReply, Conversation};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

pub type SessionStore = Arc<RwLock<Sessions>>;

#[derive(Debug)]
pub struct Sessions {
    conversations: HashMap<Uuid, Conversation>,
    /// Ids in creation order, oldest first
    order: VecDeque<Uuid>,
    max_sessions: usize,
    max_messages: usize,
}

impl Sessions {
    pub fn new(max_sessions: usize, max_messages: usize) -> Self {
        Self {
            conversations: HashMap::new(),
            order: VecDeque::new(),
            max_sessions: max_sessions.max(1),
            max_messages,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.max_sessions, config.max_messages_per_session)
    }

    pub fn shared(config: &ChatConfig) -> SessionStore {
        Arc::new(RwLock::new(Self::from_config(config)))
    }

    /// Store a new conversation, evicting the oldest ones at capacity
    pub fn insert(&mut self, conversation: Conversation) {
        while self.conversations.len() >= self.max_sessions {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(evicted) = self.conversations.remove(&oldest) {
                info!(
                    session_id = %oldest,
                    created_at = %evicted.created_at,
                    "Session evicted at capacity"
                );
            }
        }

        self.order.push_back(conversation.id);
        self.conversations.insert(conversation.id, conversation);
    }

    pub fn get(&self, id: &Uuid) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.conversations.contains_key(id)
    }

    /// Append an exchange and return the recorded bot message, or `None`
    /// when the session no longer exists
    pub fn record(&mut self, id: &Uuid, user_text: &str, reply: &ChatReply) -> Option<ChatMessage> {
        let conversation = self.conversations.get_mut(id)?;
        let message = conversation.record(user_text, reply).clone();

        let dropped = conversation.trim_history(self.max_messages);
        if dropped > 0 {
            debug!(session_id = %id, dropped, "Trimmed session history");
        }

        Some(message)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }
}
