//! Result sorting for query execution
//!
//! Multi-key, stable sort over materialised results, followed by the
//! skip/limit slice.

use std::cmp::Ordering;

use serde_json::Value;

use crate::planner::{SortDirection, SortSpec};
use crate::storage::Record;

/// Sorts and slices materialised records
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts records by `order`, left to right.
    ///
    /// Sort is stable: records that compare equal on every key keep scan order.
    pub fn sort(records: &mut [Record], order: &[SortSpec]) {
        Self::sort_by(records, order, |record| record);
    }

    /// Sorts items carrying a record, such as (primary key, record) pairs
    pub fn sort_by<T, F>(items: &mut [T], order: &[SortSpec], record: F)
    where
        F: Fn(&T) -> &Record,
    {
        if order.is_empty() {
            return;
        }
        items.sort_by(|a, b| Self::compare(record(a), record(b), order));
    }

    /// The first sort key whose values differ decides
    pub fn compare(a: &Record, b: &Record, order: &[SortSpec]) -> Ordering {
        order
            .iter()
            .map(|spec| Self::compare_field(a.get(&spec.field), b.get(&spec.field), spec.direction))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Compares one field.
    ///
    /// Ordering rules:
    /// - A defined value sorts before a missing one, in either direction
    /// - Defined values of different types order by type:
    ///   null < boolean < number < string < array < object
    /// - Same-typed values compare naturally, then the direction applies
    fn compare_field(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
        match (a, b) {
            (Some(a_val), Some(b_val)) => {
                let ordering = Self::compare_defined(a_val, b_val);
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Total order over defined values
    fn compare_defined(a: &Value, b: &Value) -> Ordering {
        let type_order = |v: &Value| -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Number(_) => 2,
                Value::String(_) => 3,
                Value::Array(_) => 4,
                Value::Object(_) => 5,
            }
        };

        let a_type = type_order(a);
        let b_type = type_order(b);
        if a_type != b_type {
            return a_type.cmp(&b_type);
        }

        match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            // Collation ties fall back to code points
            (Value::String(x), Value::String(y)) => {
                lexicmp::lexical_cmp(x, y).then_with(|| x.cmp(y))
            }
            (Value::Array(x), Value::Array(y)) => x
                .iter()
                .zip(y)
                .map(|(a, b)| Self::compare_defined(a, b))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| x.len().cmp(&y.len())),
            // Nulls and objects are not compared
            _ => Ordering::Equal,
        }
    }

    /// Takes the `[skip, skip + limit)` slice. Out-of-range bounds clamp.
    pub fn slice<T>(items: Vec<T>, skip: usize, limit: Option<usize>) -> Vec<T> {
        let iter = items.into_iter().skip(skip);
        match limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}
