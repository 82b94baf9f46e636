//! In-memory ordered storage engine
//!
//! Each database sits behind a `tokio::sync::RwLock`. A read-only transaction
//! holds a read guard and a read-write transaction holds the write guard for
//! its whole lifetime, so transactions on one database are serialised the
//! way an ordered KV engine would serialise overlapping writers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, info};

use super::errors::{StorageError, StorageResult};
use super::record::Record;
use super::store::StoreData;
use super::traits::{
    Cursor, DatabaseHandle, StorageEngine, Transaction, TransactionMode, UpgradeTransaction,
};
use crate::index::{Direction, IndexKey, KeyRange, ScanSource};
use crate::schema::{IndexDescriptor, PrimaryKey};

/// A database: its version and object stores
#[derive(Debug, Clone, Default)]
struct MemoryDatabase {
    /// Zero until the first successful open
    version: u32,
    stores: BTreeMap<String, StoreData>,
}

impl MemoryDatabase {
    fn store(&self, name: &str) -> StorageResult<&StoreData> {
        self.stores
            .get(name)
            .ok_or_else(|| StorageError::StoreNotFound(name.to_string()))
    }

    fn store_mut(&mut self, name: &str) -> StorageResult<&mut StoreData> {
        self.stores
            .get_mut(name)
            .ok_or_else(|| StorageError::StoreNotFound(name.to_string()))
    }
}

/// In-memory storage engine.
///
/// Clones share the same databases.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    databases: Arc<Mutex<HashMap<String, Arc<RwLock<MemoryDatabase>>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageEngine for MemoryStorage {
    type Handle = MemoryHandle;

    async fn open<F>(&self, name: &str, version: u32, upgrade: F) -> StorageResult<MemoryHandle>
    where
        F: FnOnce(&mut dyn UpgradeTransaction, Option<u32>, u32) -> StorageResult<()> + Send,
    {
        let db = {
            let mut databases = self.databases.lock().await;
            databases
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(MemoryDatabase::default())))
                .clone()
        };

        let mut guard = db.clone().write_owned().await;
        let stored = guard.version;

        if version < stored {
            return Err(StorageError::Version {
                requested: version,
                stored,
            });
        }

        if version > stored {
            let previous = (stored > 0).then_some(stored);
            info!(database = name, ?previous, version, "upgrading database");

            let snapshot = (*guard).clone();
            let result = {
                let mut tx = MemoryUpgrade { db: &mut *guard };
                upgrade(&mut tx, previous, version)
            };
            if let Err(e) = result {
                *guard = snapshot;
                return Err(e);
            }
            guard.version = version;
        }

        Ok(MemoryHandle {
            name: name.to_string(),
            version,
            db,
        })
    }
}

/// Open database handle for `MemoryStorage`
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    name: String,
    version: u32,
    db: Arc<RwLock<MemoryDatabase>>,
}

#[async_trait]
impl DatabaseHandle for MemoryHandle {
    type Transaction = MemoryTransaction;

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    async fn transaction(
        &self,
        store: &str,
        mode: TransactionMode,
    ) -> StorageResult<MemoryTransaction> {
        let guard = match mode {
            TransactionMode::ReadOnly => Guard::Read(self.db.clone().read_owned().await),
            TransactionMode::ReadWrite => Guard::Write(self.db.clone().write_owned().await),
        };
        guard.db().store(store)?;

        Ok(MemoryTransaction {
            store: store.to_string(),
            mode,
            guard,
        })
    }
}

#[derive(Debug)]
enum Guard {
    Read(OwnedRwLockReadGuard<MemoryDatabase>),
    Write(OwnedRwLockWriteGuard<MemoryDatabase>),
}

impl Guard {
    fn db(&self) -> &MemoryDatabase {
        match self {
            Guard::Read(guard) => &**guard,
            Guard::Write(guard) => &**guard,
        }
    }

    fn db_mut(&mut self) -> StorageResult<&mut MemoryDatabase> {
        match self {
            Guard::Read(_) => Err(StorageError::ReadOnly),
            Guard::Write(guard) => Ok(&mut **guard),
        }
    }
}

/// Transaction over one store of a `MemoryStorage` database
#[derive(Debug)]
pub struct MemoryTransaction {
    store: String,
    mode: TransactionMode,
    guard: Guard,
}

impl MemoryTransaction {
    fn data(&self) -> StorageResult<&StoreData> {
        self.guard.db().store(&self.store)
    }

    fn data_mut(&mut self) -> StorageResult<&mut StoreData> {
        let store = &self.store;
        self.guard.db_mut()?.store_mut(store)
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    type Cursor<'t> = MemoryCursor<'t>;

    fn store(&self) -> &str {
        &self.store
    }

    fn mode(&self) -> TransactionMode {
        self.mode
    }

    async fn get(&self, key: &IndexKey) -> StorageResult<Option<Record>> {
        Ok(self.data()?.get(key).cloned())
    }

    async fn open_cursor<'t>(
        &'t mut self,
        source: &ScanSource,
        direction: Direction,
    ) -> StorageResult<MemoryCursor<'t>> {
        if let Some(name) = source.index_name() {
            if self.data()?.index(name).is_none() {
                return Err(StorageError::IndexNotFound {
                    store: self.store.clone(),
                    index: name.to_string(),
                });
            }
        }

        Ok(MemoryCursor {
            tx: self,
            source: source.clone(),
            direction,
            position: None,
            current: None,
            done: false,
        })
    }

    async fn add(&mut self, record: Record) -> StorageResult<Value> {
        self.data_mut()?.add(record)
    }

    async fn put(&mut self, record: Record) -> StorageResult<Value> {
        self.data_mut()?.put(record)
    }

    async fn delete(&mut self, key: &IndexKey) -> StorageResult<Option<Record>> {
        Ok(self.data_mut()?.delete(key))
    }

    async fn commit(self) -> StorageResult<()> {
        debug!(store = %self.store, mode = ?self.mode, "transaction committed");
        Ok(())
    }
}

/// Cursor over a `MemoryTransaction`.
///
/// The cursor remembers the (key, primary key) position it last visited and
/// seeks strictly past it on every advance, so deleting or rewriting the
/// current record never loses its place.
pub struct MemoryCursor<'t> {
    tx: &'t mut MemoryTransaction,
    source: ScanSource,
    direction: Direction,
    position: Option<(IndexKey, IndexKey)>,
    /// Primary key of the record last returned, until it is deleted
    current: Option<IndexKey>,
    done: bool,
}

impl MemoryCursor<'_> {
    fn next_position(&self) -> StorageResult<Option<(IndexKey, IndexKey)>> {
        let store = self.tx.data()?;
        let after = self.position.as_ref();

        let next = match &self.source {
            ScanSource::FullScan => store
                .next_primary(&KeyRange::unbounded(), after.map(|(k, _)| k), self.direction)
                .map(|k| (k.clone(), k)),
            ScanSource::Primary(range) => store
                .next_primary(range, after.map(|(k, _)| k), self.direction)
                .map(|k| (k.clone(), k)),
            ScanSource::Index { name, range } => {
                let index = store.index(name).ok_or_else(|| StorageError::IndexNotFound {
                    store: self.tx.store.clone(),
                    index: name.clone(),
                })?;
                index
                    .tree
                    .next_entry(range, after.map(|(k, p)| (k, p)), self.direction)
            }
        };
        Ok(next)
    }

    fn current_key(&self) -> StorageResult<IndexKey> {
        self.current
            .clone()
            .ok_or_else(|| StorageError::Internal("cursor has no current record".to_string()))
    }
}

#[async_trait]
impl Cursor for MemoryCursor<'_> {
    async fn advance(&mut self) -> StorageResult<Option<Record>> {
        if self.done {
            return Ok(None);
        }

        let Some((key, primary)) = self.next_position()? else {
            self.done = true;
            self.current = None;
            return Ok(None);
        };

        let record = self.tx.data()?.get(&primary).cloned().ok_or_else(|| {
            StorageError::Internal(format!("index entry {} has no record", primary.to_value()))
        })?;

        self.position = Some((key, primary.clone()));
        self.current = Some(primary);
        Ok(Some(record))
    }

    fn primary_key(&self) -> Option<&IndexKey> {
        self.current.as_ref()
    }

    async fn delete(&mut self) -> StorageResult<()> {
        let key = self.current_key()?;
        self.tx.data_mut()?.delete(&key);
        self.current = None;
        Ok(())
    }

    async fn update(&mut self, record: Record) -> StorageResult<()> {
        let key = self.current_key()?;
        let store = self.tx.data_mut()?;

        let unchanged = record
            .get(store.primary_field())
            .and_then(IndexKey::from_value)
            .map_or(false, |k| k == key);
        if !unchanged {
            return Err(StorageError::Data(format!(
                "cursor update must keep primary key {}",
                key.to_value()
            )));
        }

        store.put(record)?;
        Ok(())
    }
}

/// Upgrade-time access to a `MemoryDatabase` under its write guard
struct MemoryUpgrade<'a> {
    db: &'a mut MemoryDatabase,
}

impl UpgradeTransaction for MemoryUpgrade<'_> {
    fn store_names(&self) -> Vec<String> {
        self.db.stores.keys().cloned().collect()
    }

    fn create_store(&mut self, name: &str, primary_key: &PrimaryKey) -> StorageResult<()> {
        if self.db.stores.contains_key(name) {
            return Err(StorageError::StoreExists(name.to_string()));
        }
        self.db
            .stores
            .insert(name.to_string(), StoreData::new(primary_key.clone()));
        Ok(())
    }

    fn delete_store(&mut self, name: &str) -> StorageResult<()> {
        self.db
            .stores
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::StoreNotFound(name.to_string()))
    }

    fn indexes(&self, store: &str) -> StorageResult<Vec<IndexDescriptor>> {
        Ok(self.db.store(store)?.index_descriptors())
    }

    fn create_index(&mut self, store: &str, index: &IndexDescriptor) -> StorageResult<()> {
        self.db.store_mut(store)?.create_index(store, index)
    }

    fn delete_index(&mut self, store: &str, name: &str) -> StorageResult<()> {
        self.db.store_mut(store)?.delete_index(store, name)
    }

    fn add(&mut self, store: &str, record: Record) -> StorageResult<Value> {
        self.db.store_mut(store)?.add(record)
    }
}
