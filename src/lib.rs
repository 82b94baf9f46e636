//! keyscan - query planning and cursor traversal over an ordered object store
//!
//! Record types declare a primary key and secondary indexes. Requests carry
//! a where clause plus order, skip, and limit. The planner picks one scan
//! source per request and the executor walks it, re-checking every candidate
//! against the full where clause.

pub mod engine;
pub mod executor;
pub mod index;
pub mod planner;
pub mod schema;
pub mod storage;

pub use engine::{Database, DatabaseConfig, EngineError, EngineResult, RecordType};
pub use planner::{between, eq, gt, gte, lt, lte, Comparison, QueryOptions, SortDirection};
pub use schema::{FieldType, RecordTypeDescriptor};
pub use storage::{MemoryStorage, Record, StorageError};
