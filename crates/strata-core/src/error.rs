use thiserror::Error;

/// Protocol-wide error types for the Strata staking engine.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Storage layer error (RocksDB, in-memory store, staging overlay).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Malformed or inconsistent state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for StrataError {
    fn from(e: serde_json::Error) -> Self {
        StrataError::Serialization(e.to_string())
    }
}
