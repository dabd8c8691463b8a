//! Responder error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResponderError {
    #[error("Invalid rules file {path}: {message}")]
    InvalidRules { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ResponderError> for sitechat_common::errors::AppError {
    fn from(e: ResponderError) -> Self {
        sitechat_common::errors::AppError::Configuration {
            message: e.to_string(),
        }
    }
}
