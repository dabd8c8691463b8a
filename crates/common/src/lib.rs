//! SiteChat Common Library
//!
//! Shared code for all SiteChat crates:
//! - Configuration management
//! - Error types and HTTP mapping
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name used in logs and metrics when none is configured
pub const DEFAULT_SERVICE_NAME: &str = "sitechat";
