//! Search engine error types

use crate::lifecycle::EngineStatus;
use sitechat_common::errors::AppError;
use sitechat_ingestion::IngestionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    /// A query reached the engine before it was Ready
    #[error("Query issued while the search engine is {status}")]
    QueryOnUninitializedEngine { status: EngineStatus },

    #[error("Search engine is already {status}")]
    AlreadyInitialized { status: EngineStatus },

    #[error("Search engine construction failed: {reason}")]
    ConstructionFailed { reason: String },

    #[error(transparent)]
    Build(#[from] IngestionError),
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::QueryOnUninitializedEngine { status } => AppError::EngineNotReady {
                state: status.to_string(),
            },
            SearchError::AlreadyInitialized { .. } => AppError::Internal {
                message: e.to_string(),
            },
            SearchError::ConstructionFailed { reason } => AppError::SourceUnavailable { message: reason },
            SearchError::Build(err) => err.into(),
        }
    }
}
