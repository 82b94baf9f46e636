//! Ordered key space for object stores and secondary indexes
//!
//! Everything a cursor can walk is ordered by `IndexKey`.
//!
//! # Invariants
//!
//! - Key ordering is total: Number < String < Array
//! - Arrays (composite keys) compare element-wise
//! - Values that cannot be keys (null, bool, object) are never indexed
//! - A scan over an empty range visits nothing

mod key;
mod range;
mod tree;

pub use key::IndexKey;
pub use range::{Direction, KeyRange, ScanSource};
pub use tree::{seek, IndexTree};
