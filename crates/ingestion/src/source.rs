//! Knowledge source fetching
//!
//! A source is either a remote `http(s)://` URL or a local file path.

use crate::errors::IngestionError;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Location of a knowledge source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Url(String),
    LocalFile(PathBuf),
}

impl SourceLocation {
    /// Classify a configured location string
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            SourceLocation::Url(trimmed.to_string())
        } else {
            SourceLocation::LocalFile(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Url(url) => f.write_str(url),
            SourceLocation::LocalFile(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetch the raw bytes of a source. Non-2xx responses and missing files are errors.
pub async fn fetch_source(
    client: &reqwest::Client,
    location: &SourceLocation,
) -> Result<Vec<u8>, IngestionError> {
    let fetch_error = |message: String| IngestionError::Fetch {
        location: location.to_string(),
        message,
    };

    let bytes = match location {
        SourceLocation::Url(url) => {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|e| fetch_error(e.to_string()))?
                .error_for_status()
                .map_err(|e| fetch_error(e.to_string()))?;

            response
                .bytes()
                .await
                .map_err(|e| fetch_error(e.to_string()))?
                .to_vec()
        }
        SourceLocation::LocalFile(path) => tokio::fs::read(path)
            .await
            .map_err(|e| fetch_error(e.to_string()))?,
    };

    debug!(location = %location, size = bytes.len(), "Source fetched");

    Ok(bytes)
}
