//! Ingestion error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error: {message}")]
    DocumentParse { message: String },

    #[error("Knowledge base parse error: {message}")]
    KnowledgeParse { message: String },

    #[error("Failed to fetch {location}: {message}")]
    Fetch { location: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IngestionError> for sitechat_common::errors::AppError {
    fn from(e: IngestionError) -> Self {
        use sitechat_common::errors::AppError;

        match e {
            IngestionError::DocumentParse { message } => AppError::DocumentParse { message },
            IngestionError::KnowledgeParse { message } => AppError::KnowledgeParse { message },
            IngestionError::Fetch { .. } => AppError::SourceUnavailable {
                message: e.to_string(),
            },
            IngestionError::Client(err) => AppError::Internal {
                message: err.to_string(),
            },
            IngestionError::Io(err) => AppError::Internal {
                message: err.to_string(),
            },
        }
    }
}
