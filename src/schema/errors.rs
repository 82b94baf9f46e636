//! Configuration error types
//!
//! Raised while declaring record types or validating database configuration,
//! always before any storage interaction.
//!
//! Error codes:
//! - KEYSCAN_INVALID_VERSION
//! - KEYSCAN_INVALID_STORE_NAME
//! - KEYSCAN_INVALID_PRIMARY_KEY
//! - KEYSCAN_MALFORMED_INDEX
//! - KEYSCAN_DUPLICATE_INDEX
//! - KEYSCAN_DUPLICATE_STORE
//! - KEYSCAN_MALFORMED_CONFIG

use std::fmt;

/// Configuration error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Database version is zero or not an integer
    InvalidVersion,
    /// Store name is empty
    InvalidStoreName,
    /// Primary key field is empty
    InvalidPrimaryKey,
    /// Index declaration is malformed
    MalformedIndex,
    /// Two indexes share a name within one store
    DuplicateIndex,
    /// Two record types share a store name
    DuplicateStore,
    /// Configuration document cannot be read or parsed
    MalformedConfig,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::InvalidVersion => "KEYSCAN_INVALID_VERSION",
            SchemaErrorCode::InvalidStoreName => "KEYSCAN_INVALID_STORE_NAME",
            SchemaErrorCode::InvalidPrimaryKey => "KEYSCAN_INVALID_PRIMARY_KEY",
            SchemaErrorCode::MalformedIndex => "KEYSCAN_MALFORMED_INDEX",
            SchemaErrorCode::DuplicateIndex => "KEYSCAN_DUPLICATE_INDEX",
            SchemaErrorCode::DuplicateStore => "KEYSCAN_DUPLICATE_STORE",
            SchemaErrorCode::MalformedConfig => "KEYSCAN_MALFORMED_CONFIG",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Configuration error with context
#[derive(Debug, Clone)]
pub struct SchemaError {
    /// Error code
    code: SchemaErrorCode,
    /// Human-readable message
    message: String,
    /// Store name if applicable
    store: Option<String>,
}

impl SchemaError {
    /// Create an invalid version error
    pub fn invalid_version(version: impl fmt::Display) -> Self {
        Self {
            code: SchemaErrorCode::InvalidVersion,
            message: format!("version {} must be a positive integer", version),
            store: None,
        }
    }

    /// Create an invalid store name error
    pub fn invalid_store_name(store: impl Into<String>) -> Self {
        let s = store.into();
        Self {
            code: SchemaErrorCode::InvalidStoreName,
            message: format!("store name '{}' is empty", s),
            store: Some(s),
        }
    }

    /// Create an invalid primary key error
    pub fn invalid_primary_key(store: impl Into<String>) -> Self {
        let s = store.into();
        Self {
            code: SchemaErrorCode::InvalidPrimaryKey,
            message: format!("store '{}' has an empty primary key field", s),
            store: Some(s),
        }
    }

    /// Create a malformed index error
    pub fn malformed_index(
        store: impl Into<String>,
        index: impl fmt::Display,
        reason: impl fmt::Display,
    ) -> Self {
        let s = store.into();
        Self {
            code: SchemaErrorCode::MalformedIndex,
            message: format!("index '{}' on store '{}': {}", index, s, reason),
            store: Some(s),
        }
    }

    /// Create a duplicate index error
    pub fn duplicate_index(store: impl Into<String>, index: impl fmt::Display) -> Self {
        let s = store.into();
        Self {
            code: SchemaErrorCode::DuplicateIndex,
            message: format!("index '{}' declared twice on store '{}'", index, s),
            store: Some(s),
        }
    }

    /// Create a duplicate store error
    pub fn duplicate_store(store: impl Into<String>) -> Self {
        let s = store.into();
        Self {
            code: SchemaErrorCode::DuplicateStore,
            message: format!("store '{}' declared by more than one record type", s),
            store: Some(s),
        }
    }

    /// Create a malformed config error
    pub fn malformed_config(source: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self {
            code: SchemaErrorCode::MalformedConfig,
            message: format!("malformed configuration '{}': {}", source, reason),
            store: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the store name if applicable
    pub fn store(&self) -> Option<&str> {
        self.store.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[CONFIG] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
