//! Error types for comanda-core

use thiserror::Error;

/// Result type alias using comanda-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in comanda-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote record service error
    #[error("Remote error: {0}")]
    Remote(#[from] crate::remote::RemoteError),
}
