//! Database engine
//!
//! Ties configuration, planning, and traversal together behind one facade.
//!
//! Invariants:
//! - Configuration is validated before any storage is opened
//! - Schema synchronisation only happens inside a version upgrade
//! - Every operation runs in exactly one transaction on one store
//! - A zero limit returns an empty result without opening a transaction

mod config;
mod database;
mod errors;
mod upgrade;

pub use config::DatabaseConfig;
pub use database::{Database, RecordType};
pub use errors::{EngineError, EngineResult};
pub use upgrade::sync_schema;
