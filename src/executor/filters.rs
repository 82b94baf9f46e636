//! Predicate filtering for query execution
//!
//! Every candidate produced by any scan is checked here, whether or not an
//! index narrowed the scan. No type coercion: comparisons between values of
//! different types never match.

use std::cmp::Ordering;

use serde_json::Value;

use crate::index::IndexKey;
use crate::planner::{Comparison, WhereClause, WhereValue};
use crate::storage::Record;

/// Evaluates where clauses against records
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a record matches every entry of the where clause
    pub fn matches(filter: &WhereClause, record: &Record) -> bool {
        filter
            .iter()
            .all(|(field, predicate)| Self::matches_field(record.get(field), predicate))
    }

    /// Checks one field. A missing field never matches.
    fn matches_field(actual: Option<&Value>, predicate: &WhereValue) -> bool {
        let Some(actual) = actual else {
            return false;
        };

        match predicate {
            WhereValue::Literal(expected) => values_equal(actual, expected),
            WhereValue::Compare(Comparison::Equal(expected)) => values_equal(actual, expected),
            WhereValue::Compare(comparison) => {
                let lower_ok = comparison.lower().map_or(true, |(bound, inclusive)| {
                    match compare_values(actual, bound) {
                        Some(Ordering::Greater) => true,
                        Some(Ordering::Equal) => inclusive,
                        _ => false,
                    }
                });
                let upper_ok = comparison.upper().map_or(true, |(bound, inclusive)| {
                    match compare_values(actual, bound) {
                        Some(Ordering::Less) => true,
                        Some(Ordering::Equal) => inclusive,
                        _ => false,
                    }
                });
                lower_ok && upper_ok
            }
        }
    }
}

/// Strict equality. Numbers compare by value, so `5` equals `5.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).map_or(false, |other| values_equal(v, other)))
        }
        _ => a == b,
    }
}

/// Orders two values of the same type.
///
/// Returns None for mixed types, nulls, objects, and NaN. Strings compare by
/// code point and arrays element-wise, the same order index keys use.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Array(_), Value::Array(_)) => {
            Some(IndexKey::from_value(a)?.cmp(&IndexKey::from_value(b)?))
        }
        _ => None,
    }
}
