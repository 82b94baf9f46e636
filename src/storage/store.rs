//! Object store state for the in-memory engine
//!
//! Records live in a BTreeMap keyed by primary key. Each index is an
//! `IndexTree` kept in step with every write.

use std::collections::BTreeMap;

use serde_json::Value;

use super::errors::{StorageError, StorageResult};
use super::record::Record;
use crate::index::{seek, Direction, IndexKey, IndexTree, KeyRange};
use crate::schema::{IndexDescriptor, PrimaryKey};

/// A declared index and its entries
#[derive(Debug, Clone)]
pub(crate) struct StoreIndex {
    pub descriptor: IndexDescriptor,
    pub tree: IndexTree,
}

/// Largest key the generator hands out (2^53). Beyond it keys lose
/// integer precision.
pub(crate) const MAX_GENERATED_KEY: u64 = 1 << 53;

/// One object store
#[derive(Debug, Clone)]
pub(crate) struct StoreData {
    primary_key: PrimaryKey,
    records: BTreeMap<IndexKey, Record>,
    indexes: BTreeMap<String, StoreIndex>,
    /// Next generated key. Starts at 1 and never exceeds `MAX_GENERATED_KEY + 1`.
    key_generator: u64,
}

impl StoreData {
    pub fn new(primary_key: PrimaryKey) -> Self {
        Self {
            primary_key,
            records: BTreeMap::new(),
            indexes: BTreeMap::new(),
            key_generator: 1,
        }
    }

    pub fn get(&self, key: &IndexKey) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn primary_field(&self) -> &str {
        &self.primary_key.field
    }

    pub fn index(&self, name: &str) -> Option<&StoreIndex> {
        self.indexes.get(name)
    }

    pub fn index_descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexes
            .values()
            .map(|index| index.descriptor.clone())
            .collect()
    }

    /// Next primary key inside `range` strictly past `after`
    pub fn next_primary(
        &self,
        range: &KeyRange,
        after: Option<&IndexKey>,
        direction: Direction,
    ) -> Option<IndexKey> {
        seek(&self.records, range, after, direction).map(|(key, _)| key.clone())
    }

    /// Adds a new record. An existing primary key is a constraint violation.
    pub fn add(&mut self, record: Record) -> StorageResult<Value> {
        self.write(record, false)
    }

    /// Inserts or replaces a record.
    pub fn put(&mut self, record: Record) -> StorageResult<Value> {
        self.write(record, true)
    }

    /// Removes a record and its index entries
    pub fn delete(&mut self, key: &IndexKey) -> Option<Record> {
        let record = self.records.remove(key)?;
        for index in self.indexes.values_mut() {
            if let Some(index_key) = IndexKey::from_record(&record, &index.descriptor.key_path) {
                index.tree.remove(&index_key, key);
            }
        }
        Some(record)
    }

    /// Creates an index over the existing records.
    ///
    /// A unique index fails if existing records already collide.
    pub fn create_index(&mut self, store: &str, descriptor: &IndexDescriptor) -> StorageResult<()> {
        if self.indexes.contains_key(&descriptor.name) {
            return Err(StorageError::IndexExists {
                store: store.to_string(),
                index: descriptor.name.clone(),
            });
        }

        let mut tree = IndexTree::new();
        for (primary, record) in &self.records {
            let Some(key) = IndexKey::from_record(record, &descriptor.key_path) else {
                continue;
            };
            if descriptor.unique && tree.is_taken_by_other(&key, primary) {
                return Err(StorageError::Constraint(format!(
                    "unique index '{}' cannot be built: duplicate key {}",
                    descriptor.name,
                    key.to_value()
                )));
            }
            tree.insert(key, primary.clone());
        }

        self.indexes.insert(
            descriptor.name.clone(),
            StoreIndex {
                descriptor: descriptor.clone(),
                tree,
            },
        );
        Ok(())
    }

    pub fn delete_index(&mut self, store: &str, name: &str) -> StorageResult<()> {
        self.indexes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::IndexNotFound {
                store: store.to_string(),
                index: name.to_string(),
            })
    }

    fn write(&mut self, mut record: Record, overwrite: bool) -> StorageResult<Value> {
        let key = self.resolve_key(&mut record)?;

        if !overwrite && self.records.contains_key(&key) {
            return Err(StorageError::Constraint(format!(
                "primary key {} already exists",
                key.to_value()
            )));
        }
        self.check_unique(&record, &key)?;

        self.delete(&key);
        for index in self.indexes.values_mut() {
            if let Some(index_key) = IndexKey::from_record(&record, &index.descriptor.key_path) {
                index.tree.insert(index_key, key.clone());
            }
        }

        self.advance_generator(&key);
        let value = record
            .get(&self.primary_key.field)
            .cloned()
            .unwrap_or_else(|| key.to_value());
        self.records.insert(key, record);
        Ok(value)
    }

    /// Reads the primary key from the record, generating one when allowed.
    fn resolve_key(&mut self, record: &mut Record) -> StorageResult<IndexKey> {
        match record.get(&self.primary_key.field) {
            Some(value) => IndexKey::from_value(value).ok_or_else(|| {
                StorageError::Data(format!(
                    "value {} of '{}' is not a valid key",
                    value, self.primary_key.field
                ))
            }),
            None if self.primary_key.auto_increment => {
                let generated = self.key_generator;
                if generated > MAX_GENERATED_KEY {
                    return Err(StorageError::Constraint(format!(
                        "key generator for '{}' is exhausted",
                        self.primary_key.field
                    )));
                }
                record.insert(self.primary_key.field.clone(), Value::from(generated));
                Ok(IndexKey::from_f64(generated as f64).expect("generated keys are never NaN"))
            }
            None => Err(StorageError::Data(format!(
                "record has no value for primary key '{}'",
                self.primary_key.field
            ))),
        }
    }

    fn check_unique(&self, record: &Record, primary: &IndexKey) -> StorageResult<()> {
        for index in self.indexes.values().filter(|i| i.descriptor.unique) {
            if let Some(key) = IndexKey::from_record(record, &index.descriptor.key_path) {
                if index.tree.is_taken_by_other(&key, primary) {
                    return Err(StorageError::Constraint(format!(
                        "unique index '{}' already contains {}",
                        index.descriptor.name,
                        key.to_value()
                    )));
                }
            }
        }
        Ok(())
    }

    /// An explicit numeric key at or past the generator moves it to floor(key) + 1
    fn advance_generator(&mut self, key: &IndexKey) {
        if !self.primary_key.auto_increment {
            return;
        }
        if let Some(n) = key.as_f64() {
            if n >= self.key_generator as f64 {
                self.key_generator = if n >= MAX_GENERATED_KEY as f64 {
                    MAX_GENERATED_KEY + 1
                } else {
                    n.floor() as u64 + 1
                };
            }
        }
    }
}
