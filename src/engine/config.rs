//! Database configuration
//!
//! A configuration names the database, its schema version, and the record
//! types it holds. It is validated in full before the storage engine is
//! touched.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::schema::{Catalog, RecordTypeDescriptor, SchemaError, SchemaResult};

/// Configuration for one database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database name
    pub name: String,
    /// Schema version, at least 1
    pub version: u32,
    /// Record types, one store each
    #[serde(default)]
    pub record_types: Vec<RecordTypeDescriptor>,
}

/// On-disk shape, before the version is checked
#[derive(Debug, Deserialize)]
struct RawConfig {
    name: String,
    version: Number,
    #[serde(default)]
    record_types: Vec<RecordTypeDescriptor>,
}

impl DatabaseConfig {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            record_types: Vec::new(),
        }
    }

    /// Adds a record type
    pub fn with_record_type(mut self, descriptor: RecordTypeDescriptor) -> Self {
        self.record_types.push(descriptor);
        self
    }

    /// Parses and validates a JSON configuration document
    pub fn from_json_str(json: &str) -> SchemaResult<Self> {
        Self::parse("<inline>", json)
    }

    /// Loads and validates a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_config(
                path.display(),
                format!("Failed to read file: {}", e),
            )
        })?;
        Self::parse(&path.display().to_string(), &content)
    }

    fn parse(source: &str, json: &str) -> SchemaResult<Self> {
        let raw: RawConfig = serde_json::from_str(json)
            .map_err(|e| SchemaError::malformed_config(source, format!("Invalid JSON: {}", e)))?;

        let config = Self {
            name: raw.name,
            version: parse_version(&raw.version)?,
            record_types: raw.record_types,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the whole configuration
    pub fn validate(&self) -> SchemaResult<()> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::malformed_config(
                &self.name,
                "database name is empty",
            ));
        }
        if self.version == 0 {
            return Err(SchemaError::invalid_version(self.version));
        }

        let mut stores = HashSet::new();
        for descriptor in &self.record_types {
            descriptor.validate()?;
            if !stores.insert(descriptor.store_name.as_str()) {
                return Err(SchemaError::duplicate_store(&descriptor.store_name));
            }
        }
        Ok(())
    }

    /// Validates and builds the record type catalog
    pub fn catalog(&self) -> SchemaResult<Catalog> {
        self.validate()?;
        let mut catalog = Catalog::new();
        for descriptor in &self.record_types {
            catalog.register(descriptor.clone())?;
        }
        Ok(catalog)
    }
}

/// Accepts whole numbers from 1 up to `u32::MAX`
fn parse_version(number: &Number) -> SchemaResult<u32> {
    let whole = match number.as_u64() {
        Some(v) => Some(v),
        None => number
            .as_f64()
            .filter(|v| v.fract() == 0.0 && *v >= 1.0 && *v <= u32::MAX as f64)
            .map(|v| v as u64),
    };

    whole
        .filter(|v| *v >= 1)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| SchemaError::invalid_version(number))
}
