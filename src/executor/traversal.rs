//! Cursor traversal
//!
//! Walks the plan's scan source inside one storage transaction, re-checks
//! every candidate against the full where clause, and performs the requested
//! operation on the matches.
//!
//! Execution flow:
//! 1. Open a cursor over the plan's source in the plan's direction
//! 2. Re-check each visited record against the where clause
//! 3. Streaming plans: skip, act, and stop at the limit as matches arrive
//! 4. Materialising plans: collect every match, sort, slice, then act on the
//!    slice by primary key

use std::collections::HashSet;

use tracing::debug;

use crate::index::IndexKey;
use crate::planner::QueryPlan;
use crate::storage::{Cursor, Record, StorageError, StorageResult, Transaction};

use super::filters::PredicateFilter;
use super::mutation::merge_update;
use super::result::TraversalResult;
use super::sorter::ResultSorter;

/// What to do with each matching record
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Find,
    Delete,
    /// Merge the patch onto each match
    Update(Record),
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Find => "find",
            Operation::Delete => "delete",
            Operation::Update(_) => "update",
        }
    }
}

/// Drives one plan through a transaction
pub struct CursorTraversal<'a> {
    plan: &'a QueryPlan,
    primary_field: &'a str,
}

impl<'a> CursorTraversal<'a> {
    pub fn new(plan: &'a QueryPlan, primary_field: &'a str) -> Self {
        Self {
            plan,
            primary_field,
        }
    }

    /// Runs `operation` over the plan.
    ///
    /// In `single` mode at most one record is acted on. Storage errors abort
    /// the traversal; mutations already applied are not undone.
    pub async fn run<T: Transaction>(
        &self,
        tx: &mut T,
        operation: &Operation,
        single: bool,
    ) -> StorageResult<TraversalResult> {
        if self.plan.is_zero_limit() {
            return Ok(TraversalResult::default());
        }

        let result = if self.plan.is_streaming() {
            self.stream(tx, operation, single).await?
        } else {
            self.materialize(tx, operation, single).await?
        };

        debug!(
            store = %self.plan.store,
            operation = operation.as_str(),
            scanned = result.scanned,
            matched = result.matched,
            returned = result.len(),
            "traversal finished"
        );
        Ok(result)
    }

    /// Scan order already is result order: skip and limit apply as matches arrive.
    async fn stream<T: Transaction>(
        &self,
        tx: &mut T,
        operation: &Operation,
        single: bool,
    ) -> StorageResult<TraversalResult> {
        let mut result = TraversalResult::default();
        let mut skipped = 0;
        let limit = if single { Some(1) } else { self.plan.limit };

        // An update can move a record further along the index being walked
        let track_updates =
            matches!(operation, Operation::Update(_)) && self.plan.source.index_name().is_some();
        let mut updated: HashSet<IndexKey> = HashSet::new();

        let mut cursor = tx
            .open_cursor(&self.plan.source, self.plan.direction)
            .await?;

        while let Some(record) = cursor.advance().await? {
            result.scanned += 1;

            if track_updates {
                if let Some(key) = cursor.primary_key() {
                    if updated.contains(key) {
                        continue;
                    }
                }
            }

            if !PredicateFilter::matches(&self.plan.filter, &record) {
                continue;
            }
            result.matched += 1;

            if skipped < self.plan.skip {
                skipped += 1;
                continue;
            }

            let record = match operation {
                Operation::Find => record,
                Operation::Delete => {
                    cursor.delete().await?;
                    record
                }
                Operation::Update(patch) => {
                    let merged = merge_update(&record, patch, self.primary_field);
                    cursor.update(merged.clone()).await?;
                    if track_updates {
                        if let Some(key) = cursor.primary_key() {
                            updated.insert(key.clone());
                        }
                    }
                    merged
                }
            };
            result.records.push(record);

            if limit.map_or(false, |limit| result.records.len() >= limit) {
                // Nothing past the limit can be acted on; the caller commits
                break;
            }
        }

        Ok(result)
    }

    /// Collects every match, sorts, slices, and only then acts on the slice.
    async fn materialize<T: Transaction>(
        &self,
        tx: &mut T,
        operation: &Operation,
        single: bool,
    ) -> StorageResult<TraversalResult> {
        let mut result = TraversalResult::default();
        let mut candidates: Vec<(IndexKey, Record)> = Vec::new();

        {
            let mut cursor = tx
                .open_cursor(&self.plan.source, self.plan.direction)
                .await?;
            while let Some(record) = cursor.advance().await? {
                result.scanned += 1;
                if !PredicateFilter::matches(&self.plan.filter, &record) {
                    continue;
                }
                let key = cursor.primary_key().cloned().ok_or_else(|| {
                    StorageError::Internal("cursor returned a record without a key".to_string())
                })?;
                candidates.push((key, record));
            }
        }
        result.matched = candidates.len();

        ResultSorter::sort_by(&mut candidates, &self.plan.order, |(_, record)| record);
        let limit = if single { Some(1) } else { self.plan.limit };
        let selected = ResultSorter::slice(candidates, self.plan.skip, limit);

        for (key, record) in selected {
            let record = match operation {
                Operation::Find => record,
                Operation::Delete => {
                    tx.delete(&key).await?;
                    record
                }
                Operation::Update(patch) => {
                    let merged = merge_update(&record, patch, self.primary_field);
                    tx.put(merged.clone()).await?;
                    merged
                }
            };
            result.records.push(record);
        }

        Ok(result)
    }
}
