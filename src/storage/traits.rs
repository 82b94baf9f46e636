//! Storage engine collaborator interface
//!
//! The query engine drives storage exclusively through these traits: open a
//! database (running the version-upgrade callback when needed), start one
//! transaction per operation, and walk cursors over the primary key or a
//! named index.

use async_trait::async_trait;
use serde_json::Value;

use super::errors::StorageResult;
use super::record::Record;
use crate::index::{Direction, IndexKey, ScanSource};
use crate::schema::{IndexDescriptor, PrimaryKey};

/// Transaction access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

/// Opens databases.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    type Handle: DatabaseHandle;

    /// Opens `name` at `version`.
    ///
    /// When the stored version is older (or the database does not exist yet),
    /// `upgrade` runs with the upgrade transaction, the previous version
    /// (`None` on creation) and the target version. A failed upgrade leaves
    /// the database unchanged.
    async fn open<F>(&self, name: &str, version: u32, upgrade: F) -> StorageResult<Self::Handle>
    where
        F: FnOnce(&mut dyn UpgradeTransaction, Option<u32>, u32) -> StorageResult<()> + Send;
}

/// An open database.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    type Transaction: Transaction;

    fn name(&self) -> &str;

    fn version(&self) -> u32;

    /// Starts a transaction scoped to one object store
    async fn transaction(
        &self,
        store: &str,
        mode: TransactionMode,
    ) -> StorageResult<Self::Transaction>;
}

/// A transaction over one object store.
///
/// Writes are visible to later reads in the same transaction as soon as they
/// resolve.
#[async_trait]
pub trait Transaction: Send + Sync {
    type Cursor<'t>: Cursor
    where
        Self: 't;

    fn store(&self) -> &str;

    fn mode(&self) -> TransactionMode;

    /// Point lookup by primary key
    async fn get(&self, key: &IndexKey) -> StorageResult<Option<Record>>;

    /// Opens a cursor over `source`, walking in `direction`
    async fn open_cursor<'t>(
        &'t mut self,
        source: &ScanSource,
        direction: Direction,
    ) -> StorageResult<Self::Cursor<'t>>;

    /// Adds a new record and returns its primary key value.
    ///
    /// Fails with a constraint error if the key already exists.
    async fn add(&mut self, record: Record) -> StorageResult<Value>;

    /// Inserts or replaces a record and returns its primary key value
    async fn put(&mut self, record: Record) -> StorageResult<Value>;

    /// Removes a record by primary key, returning it if it existed
    async fn delete(&mut self, key: &IndexKey) -> StorageResult<Option<Record>>;

    async fn commit(self) -> StorageResult<()>
    where
        Self: Sized;
}

/// A stateful, key-ordered iterator over a store or index range.
#[async_trait]
pub trait Cursor: Send {
    /// Moves to the next candidate and returns its record, or `None` when exhausted
    async fn advance(&mut self) -> StorageResult<Option<Record>>;

    /// Primary key of the current candidate
    fn primary_key(&self) -> Option<&IndexKey>;

    /// Deletes the current candidate
    async fn delete(&mut self) -> StorageResult<()>;

    /// Replaces the current candidate. The primary key must not change.
    async fn update(&mut self, record: Record) -> StorageResult<()>;
}

/// Schema-changing access available only while a version upgrade runs.
pub trait UpgradeTransaction {
    fn store_names(&self) -> Vec<String>;

    fn create_store(&mut self, name: &str, primary_key: &PrimaryKey) -> StorageResult<()>;

    fn delete_store(&mut self, name: &str) -> StorageResult<()>;

    /// Indexes currently defined on `store`
    fn indexes(&self, store: &str) -> StorageResult<Vec<IndexDescriptor>>;

    /// Creates an index and populates it from existing records
    fn create_index(&mut self, store: &str, index: &IndexDescriptor) -> StorageResult<()>;

    fn delete_index(&mut self, store: &str, name: &str) -> StorageResult<()>;

    /// Adds a record, for seeding data during an upgrade
    fn add(&mut self, store: &str, record: Record) -> StorageResult<Value>;
}
