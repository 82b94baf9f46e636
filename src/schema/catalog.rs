//! Registry of record types for one database

use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::SchemaResult;
use super::types::RecordTypeDescriptor;

/// Validated record type descriptors keyed by store name.
///
/// Re-registering a store replaces its descriptor.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    record_types: BTreeMap<String, Arc<RecordTypeDescriptor>>,
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers a descriptor, replacing any previous one for the same store
    pub fn register(&mut self, descriptor: RecordTypeDescriptor) -> SchemaResult<()> {
        descriptor.validate()?;
        self.record_types
            .insert(descriptor.store_name.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Gets a descriptor by store name
    pub fn get(&self, store: &str) -> Option<&Arc<RecordTypeDescriptor>> {
        self.record_types.get(store)
    }

    /// Iterates descriptors in store-name order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RecordTypeDescriptor>> {
        self.record_types.values()
    }

    pub fn len(&self) -> usize {
        self.record_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_types.is_empty()
    }
}
