//! Tiered chat responder

use crate::errors::ResponderError;
use crate::rules::RuleSet;
use serde::Serialize;
use sitechat_common::config::ChatConfig;
use sitechat_common::metrics;
use sitechat_search::KnowledgeSearch;
use std::path::Path;
use tracing::{debug, warn};

/// Which tier produced a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", content = "rule", rename_all = "snake_case")]
pub enum ReplyTier {
    /// A keyword rule, by name
    Rule(String),
    /// The knowledge search engine
    Search,
    Fallback,
}

impl ReplyTier {
    pub fn label(&self) -> &'static str {
        match self {
            ReplyTier::Rule(_) => "rule",
            ReplyTier::Search => "search",
            ReplyTier::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub content: String,
    #[serde(flatten)]
    pub tier: ReplyTier,
}

#[derive(Debug, Clone)]
pub struct Responder {
    rules: RuleSet,
    search_prefix: String,
    fallback_message: String,
    min_search_reply_len: usize,
}

impl Responder {
    pub fn new(rules: RuleSet, config: &ChatConfig) -> Self {
        Self {
            rules,
            search_prefix: config.search_prefix.clone(),
            fallback_message: config.fallback_message.clone(),
            min_search_reply_len: config.min_search_reply_len,
        }
    }

    /// Built-in rules, or the rules file named by `chat.rules_path`
    pub async fn from_config(config: &ChatConfig) -> Result<Self, ResponderError> {
        let rules = match &config.rules_path {
            Some(path) => RuleSet::load(Path::new(path)).await?,
            None => RuleSet::default(),
        };
        Ok(Self::new(rules, config))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Reply to a message.
    ///
    /// The search engine is only consulted when no rule matches. An engine
    /// that is not ready (or fails) is treated as having found nothing.
    pub async fn respond(&self, message: &str, search: Option<&dyn KnowledgeSearch>) -> ChatReply {
        let lower = message.to_lowercase();

        let reply = if let Some(rule) = self.rules.first_match(&lower) {
            ChatReply {
                content: rule.reply.clone(),
                tier: ReplyTier::Rule(rule.name.clone()),
            }
        } else if let Some(found) = self.search(&lower, search).await {
            ChatReply {
                content: format!("{}\n{}", self.search_prefix, found),
                tier: ReplyTier::Search,
            }
        } else {
            ChatReply {
                content: self.fallback_message.clone(),
                tier: ReplyTier::Fallback,
            }
        };

        debug!(tier = ?reply.tier, "Chat reply selected");
        metrics::record_chat_reply(reply.tier.label());

        reply
    }

    async fn search(&self, message: &str, search: Option<&dyn KnowledgeSearch>) -> Option<String> {
        let search = search?;

        match search.query(message).await {
            Ok(found) if found.chars().count() > self.min_search_reply_len => Some(found),
            Ok(found) => {
                debug!(found = %found, "Search result too short to use");
                None
            }
            Err(e) => {
                warn!(error = %e, status = %search.status(), "Knowledge search unavailable, using rules only");
                None
            }
        }
    }
}
