//! Configuration management for SiteChat
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local),
//!   or a single file named by APP_CONFIG_FILE
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming a config file that replaces the layered files
pub const CONFIG_FILE_ENV: &str = "APP_CONFIG_FILE";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Knowledge source locations
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Chat responder configuration
    #[serde(default)]
    pub chat: ChatConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

/// Where the search corpus comes from.
///
/// Each location is either an `http(s)://` URL or a local file path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Company profile PDF
    #[serde(default = "default_document_source")]
    pub document: String,

    /// Knowledge base JSON (object of string arrays)
    #[serde(default = "default_knowledge_source")]
    pub knowledge: String,

    /// Timeout for fetching a remote source, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatConfig {
    /// First bot message of every conversation
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    /// Reply used when neither a rule nor the search engine produced anything
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// Line placed above search engine results
    #[serde(default = "default_search_prefix")]
    pub search_prefix: String,

    /// Search results must be longer than this (in characters) to be used
    #[serde(default = "default_min_search_reply_len")]
    pub min_search_reply_len: usize,

    /// Optional JSON file replacing the built-in keyword rules
    pub rules_path: Option<String>,

    /// Live sessions kept in memory; the oldest is evicted beyond this
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Messages kept per session, welcome message included
    #[serde(default = "default_max_messages_per_session")]
    pub max_messages_per_session: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level / filter directive (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_document_source() -> String { "public/company_profile.pdf".to_string() }
fn default_knowledge_source() -> String { "public/content.json".to_string() }
fn default_fetch_timeout() -> u64 { 30 }
fn default_welcome_message() -> String {
    "Hey! 👋 I'm the Ayyappan & Co AI Assistant. What’s on your mind?".to_string()
}
fn default_fallback_message() -> String {
    "I didn’t fully get that, but I'm here to help with our Services, Projects, EPC work, \
     Company Profile, Substations, or Transmission Lines. Try asking about any of these! 😊"
        .to_string()
}
fn default_search_prefix() -> String { "Here’s what I found from our records:".to_string() }
fn default_min_search_reply_len() -> usize { 10 }
fn default_max_sessions() -> usize { 1000 }
fn default_max_messages_per_session() -> usize { 200 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_service_name() -> String { crate::DEFAULT_SERVICE_NAME.to_string() }
fn default_rate_limit() -> u32 { 20 }
fn default_burst() -> u32 { 40 }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from `path` when given, otherwise from the layered sources
    pub fn load_from(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Load from a specific file (format inferred from the extension)
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl SourcesConfig {
    /// Get fetch timeout as Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            document: default_document_source(),
            knowledge: default_knowledge_source(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            welcome_message: default_welcome_message(),
            fallback_message: default_fallback_message(),
            search_prefix: default_search_prefix(),
            min_search_reply_len: default_min_search_reply_len(),
            rules_path: None,
            max_sessions: default_max_sessions(),
            max_messages_per_session: default_max_messages_per_session(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            sources: SourcesConfig::default(),
            chat: ChatConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}
