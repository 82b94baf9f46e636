//! Storage engine collaborator for keyscan
//!
//! The query engine never touches records directly. It opens transactions
//! and cursors through the traits in this module, and `MemoryStorage`
//! provides an ordered in-memory implementation of them.
//!
//! # Invariants
//!
//! - One store per record type, keyed by its primary key
//! - Index entries are kept in step with every write
//! - Unique indexes and primary keys reject duplicates
//! - A failed version upgrade leaves the database unchanged

mod errors;
mod memory;
mod record;
mod store;
mod traits;

pub use errors::{StorageError, StorageResult};
pub use memory::{MemoryCursor, MemoryHandle, MemoryStorage, MemoryTransaction};
pub use record::{into_record, value_kind, Record};
pub use traits::{
    Cursor, DatabaseHandle, StorageEngine, Transaction, TransactionMode, UpgradeTransaction,
};
