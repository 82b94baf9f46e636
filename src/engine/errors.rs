//! Engine error types

use thiserror::Error;

use crate::schema::SchemaError;
use crate::storage::StorageError;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the public operations
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Configuration was rejected before any storage interaction
    #[error(transparent)]
    Config(#[from] SchemaError),

    /// A storage primitive failed. The operation was aborted at that point.
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),
}

impl EngineError {
    /// Returns the storage error, if this is one
    pub fn as_storage(&self) -> Option<&StorageError> {
        match self {
            EngineError::Storage(e) => Some(e),
            _ => None,
        }
    }
}
