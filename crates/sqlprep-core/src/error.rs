//! Error types for sqlprep core

use thiserror::Error;

/// Core error type for sqlprep operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlprepError {
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    #[error("Unknown parameter style: {0}")]
    UnknownStyle(String),
}

/// Result type alias for sqlprep core operations
pub type Result<T> = std::result::Result<T, SqlprepError>;
