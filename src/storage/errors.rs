//! Storage engine errors
//!
//! Every failure reported by a storage primitive surfaces to the caller
//! unchanged. There is no retry at this layer.

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage engine errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    // Catalog errors
    #[error("Object store not found: {0}")]
    StoreNotFound(String),

    #[error("Object store already exists: {0}")]
    StoreExists(String),

    #[error("Index not found: {store}.{index}")]
    IndexNotFound { store: String, index: String },

    #[error("Index already exists: {store}.{index}")]
    IndexExists { store: String, index: String },

    // Write errors
    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Invalid data: {0}")]
    Data(String),

    #[error("Transaction is read-only")]
    ReadOnly,

    // Open errors
    #[error("Requested version {requested} is lower than stored version {stored}")]
    Version { requested: u32, stored: u32 },

    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Returns true if a write was rejected by a primary-key or unique index constraint
    pub fn is_constraint(&self) -> bool {
        matches!(self, StorageError::Constraint(_))
    }
}
