//! SiteChat Responder
//!
//! Answers chat messages in tiers:
//! 1. Keyword rules, evaluated in priority order
//! 2. The knowledge search engine, when it is ready and finds enough
//! 3. A fixed fallback message

pub mod conversation;
pub mod errors;
pub mod responder;
pub mod rules;

pub use conversation::{ChatMessage, Conversation, Role};
pub use errors::ResponderError;
pub use responder::{ChatReply, ReplyTier, Responder};
pub use rules::{Rule, RuleSet};
