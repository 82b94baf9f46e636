//! Query executor for keyscan
//!
//! Consumes query plans and drives cursors inside a storage transaction.
//!
//! # Execution Flow (strict order)
//!
//! 1. Open a cursor over the planned source
//! 2. Re-check every candidate against the full where clause
//! 3. Apply skip/limit while streaming, or sort then slice when materialising
//! 4. Find, delete, or merge-update the selected records
//!
//! # Invariants
//!
//! - The chosen index never changes which records qualify
//! - Updates never change a record's primary key
//! - A zero limit visits nothing

mod filters;
mod mutation;
mod result;
mod sorter;
mod traversal;

pub use filters::{compare_values, values_equal, PredicateFilter};
pub use mutation::{apply_defaults, merge_update};
pub use result::TraversalResult;
pub use sorter::ResultSorter;
pub use traversal::{CursorTraversal, Operation};
