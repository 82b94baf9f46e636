//! Database facade
//!
//! Exposes the public operations. Each opens exactly one transaction scoped
//! to the record type's store, read-only for finds and read-write otherwise,
//! and commits it before returning.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::executor::{apply_defaults, CursorTraversal, Operation, TraversalResult};
use crate::index::IndexKey;
use crate::planner::{ExplainPlan, QueryOptions, QueryPlanner};
use crate::schema::{Catalog, RecordTypeDescriptor};
use crate::storage::{
    into_record, DatabaseHandle, Record, StorageEngine, StorageError, StorageResult, Transaction,
    TransactionMode, UpgradeTransaction,
};

use super::config::DatabaseConfig;
use super::errors::{EngineError, EngineResult};
use super::upgrade::sync_schema;

/// Handle to a registered record type
#[derive(Debug, Clone)]
pub struct RecordType {
    descriptor: Arc<RecordTypeDescriptor>,
}

impl RecordType {
    pub fn store_name(&self) -> &str {
        &self.descriptor.store_name
    }

    pub fn primary_field(&self) -> &str {
        self.descriptor.primary_field()
    }

    pub fn descriptor(&self) -> &RecordTypeDescriptor {
        &self.descriptor
    }
}

/// An open database and its record types
pub struct Database<S: StorageEngine> {
    handle: S::Handle,
    catalog: Arc<Catalog>,
}

impl<S: StorageEngine> Database<S> {
    /// Validates `config` and opens the database, synchronising stores and
    /// indexes when the version changes.
    pub async fn connect(storage: &S, config: DatabaseConfig) -> EngineResult<Self> {
        Self::connect_with_upgrade(storage, config, |_, _, _| Ok(())).await
    }

    /// Like `connect`, then runs `hook` inside the upgrade transaction with
    /// the previous version (`None` on creation) and the target version.
    ///
    /// If the hook fails the database is left as it was.
    pub async fn connect_with_upgrade<H>(
        storage: &S,
        config: DatabaseConfig,
        hook: H,
    ) -> EngineResult<Self>
    where
        H: FnOnce(&mut dyn UpgradeTransaction, Option<u32>, u32) -> StorageResult<()> + Send,
    {
        let catalog = Arc::new(config.catalog()?);

        let declared = Arc::clone(&catalog);
        let handle = storage
            .open(&config.name, config.version, move |tx, previous, version| {
                sync_schema(tx, &declared)?;
                hook(tx, previous, version)
            })
            .await?;

        info!(
            database = %config.name,
            version = config.version,
            record_types = catalog.len(),
            "connected"
        );
        Ok(Self { handle, catalog })
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn version(&self) -> u32 {
        self.handle.version()
    }

    /// Looks up a record type by store name
    pub fn record_type(&self, store: &str) -> EngineResult<RecordType> {
        self.catalog
            .get(store)
            .map(|descriptor| RecordType {
                descriptor: Arc::clone(descriptor),
            })
            .ok_or_else(|| EngineError::UnknownRecordType(store.to_string()))
    }

    /// Describes how a request would run, without touching storage
    pub fn explain(&self, record_type: &RecordType, options: &QueryOptions) -> ExplainPlan {
        ExplainPlan::from_plan(&QueryPlanner::new(record_type.descriptor()).plan(options))
    }

    /// Point lookup by primary key value
    pub async fn get(&self, record_type: &RecordType, key: &Value) -> EngineResult<Option<Record>> {
        let Some(key) = IndexKey::from_value(key) else {
            return Ok(None);
        };
        let tx = self
            .handle
            .transaction(record_type.store_name(), TransactionMode::ReadOnly)
            .await?;
        let record = tx.get(&key).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// First matching record, or None
    pub async fn find_one(
        &self,
        record_type: &RecordType,
        options: QueryOptions,
    ) -> EngineResult<Option<Record>> {
        let result = self
            .traverse(record_type, &options, Operation::Find, true)
            .await?;
        Ok(result.into_first())
    }

    /// All matching records, ordered and sliced per `options`
    pub async fn find(
        &self,
        record_type: &RecordType,
        options: QueryOptions,
    ) -> EngineResult<Vec<Record>> {
        let result = self
            .traverse(record_type, &options, Operation::Find, false)
            .await?;
        Ok(result.records)
    }

    /// Inserts one record and returns its primary key
    pub async fn insert_one(&self, record_type: &RecordType, record: Value) -> EngineResult<Value> {
        let record = self.prepare(record_type, record)?;

        let mut tx = self
            .handle
            .transaction(record_type.store_name(), TransactionMode::ReadWrite)
            .await?;
        let key = tx.add(record).await?;
        tx.commit().await?;

        debug!(store = record_type.store_name(), key = %key, "inserted record");
        Ok(key)
    }

    /// Inserts records in one transaction.
    ///
    /// Each slot holds that record's primary key or the error that rejected
    /// it, in input order. One failure does not stop the others.
    pub async fn insert(
        &self,
        record_type: &RecordType,
        records: Vec<Value>,
    ) -> EngineResult<Vec<Result<Value, StorageError>>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self
            .handle
            .transaction(record_type.store_name(), TransactionMode::ReadWrite)
            .await?;

        let mut results = Vec::with_capacity(records.len());
        for (position, record) in records.into_iter().enumerate() {
            let outcome = match self.prepare(record_type, record) {
                Ok(record) => tx.add(record).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &outcome {
                warn!(store = record_type.store_name(), position, error = %e, "insert failed");
            }
            results.push(outcome);
        }
        tx.commit().await?;

        debug!(
            store = record_type.store_name(),
            inserted = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "batch insert finished"
        );
        Ok(results)
    }

    /// Merges `patch` onto the first match and returns the updated record
    pub async fn update_one(
        &self,
        record_type: &RecordType,
        patch: Value,
        options: QueryOptions,
    ) -> EngineResult<Option<Record>> {
        let patch = into_record(patch)?;
        let result = self
            .traverse(record_type, &options, Operation::Update(patch), true)
            .await?;
        Ok(result.into_first())
    }

    /// Merges `patch` onto every match and returns the updated records.
    ///
    /// The primary key field of the patch is ignored.
    pub async fn update(
        &self,
        record_type: &RecordType,
        patch: Value,
        options: QueryOptions,
    ) -> EngineResult<Vec<Record>> {
        let patch = into_record(patch)?;
        let result = self
            .traverse(record_type, &options, Operation::Update(patch), false)
            .await?;
        Ok(result.records)
    }

    /// Deletes the first match and returns it
    pub async fn delete_one(
        &self,
        record_type: &RecordType,
        options: QueryOptions,
    ) -> EngineResult<Option<Record>> {
        let result = self
            .traverse(record_type, &options, Operation::Delete, true)
            .await?;
        Ok(result.into_first())
    }

    /// Deletes every match and returns the removed records
    pub async fn delete(
        &self,
        record_type: &RecordType,
        options: QueryOptions,
    ) -> EngineResult<Vec<Record>> {
        let result = self
            .traverse(record_type, &options, Operation::Delete, false)
            .await?;
        Ok(result.records)
    }

    fn prepare(&self, record_type: &RecordType, record: Value) -> StorageResult<Record> {
        let mut record = into_record(record)?;
        apply_defaults(&mut record, record_type.descriptor());
        Ok(record)
    }

    async fn traverse(
        &self,
        record_type: &RecordType,
        options: &QueryOptions,
        operation: Operation,
        single: bool,
    ) -> EngineResult<TraversalResult> {
        // A zero limit never reaches storage
        if options.is_zero_limit() {
            return Ok(TraversalResult::default());
        }

        let plan = QueryPlanner::new(record_type.descriptor()).plan(options);
        let mode = match operation {
            Operation::Find => TransactionMode::ReadOnly,
            Operation::Delete | Operation::Update(_) => TransactionMode::ReadWrite,
        };

        let mut tx = self
            .handle
            .transaction(record_type.store_name(), mode)
            .await?;
        let result = CursorTraversal::new(&plan, record_type.primary_field())
            .run(&mut tx, &operation, single)
            .await?;
        tx.commit().await?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::gt;
    use crate::schema::FieldType;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn config() -> DatabaseConfig {
        DatabaseConfig::new("school", 1).with_record_type(
            RecordTypeDescriptor::builder("student")
                .primary_key("id", true)
                .column_with_default("active", FieldType::Boolean, true)
                .index("by_age", "age")
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_record_type_lookup() {
        let db = Database::connect(&MemoryStorage::new(), config())
            .await
            .unwrap();
        assert_eq!(db.name(), "school");
        assert_eq!(db.version(), 1);
        assert_eq!(db.record_type("student").unwrap().primary_field(), "id");
        assert!(matches!(
            db.record_type("staff"),
            Err(EngineError::UnknownRecordType(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_applies_defaults_and_generates_keys() {
        let db = Database::connect(&MemoryStorage::new(), config())
            .await
            .unwrap();
        let student = db.record_type("student").unwrap();

        let key = db
            .insert_one(&student, json!({"name": "Ada", "age": 12}))
            .await
            .unwrap();
        assert_eq!(key, json!(1));

        let stored = db.get(&student, &key).await.unwrap().unwrap();
        assert_eq!(stored["active"], json!(true));
        assert_eq!(stored["id"], json!(1));

        assert!(db.get(&student, &json!(null)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_non_objects() {
        let db = Database::connect(&MemoryStorage::new(), config())
            .await
            .unwrap();
        let student = db.record_type("student").unwrap();

        let err = db.insert_one(&student, json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, EngineError::Storage(StorageError::Data(_))));
    }

    #[tokio::test]
    async fn test_explain() {
        let db = Database::connect(&MemoryStorage::new(), config())
            .await
            .unwrap();
        let student = db.record_type("student").unwrap();

        let explain = db.explain(&student, &QueryOptions::new().filter("age", gt(3)));
        assert_eq!(explain.scan_type, "INDEX_RANGE");
        assert_eq!(explain.index.as_deref(), Some("by_age"));
    }

    #[tokio::test]
    async fn test_invalid_config_never_opens_storage() {
        let storage = MemoryStorage::new();
        let err = Database::connect(&storage, DatabaseConfig::new("school", 0))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Config(_)));

        // Nothing was created, so version 1 still runs the upgrade
        let mut ran = false;
        Database::connect_with_upgrade(&storage, config(), |_, previous, _| {
            ran = previous.is_none();
            Ok(())
        })
        .await
        .unwrap();
        assert!(ran);
    }
}
