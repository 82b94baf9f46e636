//! Result types for query execution

use crate::storage::Record;

/// Outcome of one traversal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraversalResult {
    /// Records found, deleted, or updated, in result order
    pub records: Vec<Record>,
    /// Number of candidates the cursor visited
    pub scanned: usize,
    /// Number of candidates that matched the where clause
    pub matched: usize,
}

impl TraversalResult {
    /// Takes the first record, for single-record operations
    pub fn into_first(self) -> Option<Record> {
        self.records.into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
