//! Error types for engine operations.
//!
//! Lookups on unknown ids, full layer stacks and rejected drag candidates are
//! reported through `Option`/`bool` returns. Only configuration, transaction
//! misuse and errors raised by collaborator code end up here.

use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("An edit transaction is already open")]
    TransactionOpen,
    #[error("No edit transaction is open")]
    NoTransaction,
    #[error("Operation aborted: {0}")]
    Aborted(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
