//! Scan range construction
//!
//! Turns the source picked by the selector, plus the predicates on its
//! fields, into a concrete `ScanSource` over the primary key or an index.

use crate::index::{IndexKey, KeyRange, ScanSource};

use super::ast::{WhereClause, WhereValue};
use super::selector::SelectedSource;

/// Builds the key range a single-field predicate covers.
///
/// Returns None when any bound is not a valid key.
pub fn key_range(value: &WhereValue) -> Option<KeyRange> {
    if let Some(exact) = value.as_exact() {
        return IndexKey::from_value(exact).map(KeyRange::only);
    }

    let lower = match value.lower() {
        Some((v, inclusive)) => Some((IndexKey::from_value(v)?, inclusive)),
        None => None,
    };
    let upper = match value.upper() {
        Some((v, inclusive)) => Some((IndexKey::from_value(v)?, inclusive)),
        None => None,
    };

    match (lower, upper) {
        (Some((l, li)), Some((u, ui))) => Some(KeyRange::bound(l, u, li, ui)),
        (Some((l, li)), None) => Some(KeyRange::lower_bound(l, li)),
        (None, Some((u, ui))) => Some(KeyRange::upper_bound(u, ui)),
        (None, None) => None,
    }
}

/// Builds the exact tuple key for a composite lookup, in declared field order.
///
/// Returns None unless every field carries an exact, valid key value.
pub fn composite_key(fields: &[&str], filter: &WhereClause) -> Option<IndexKey> {
    fields
        .iter()
        .map(|field| {
            filter
                .get(*field)
                .and_then(WhereValue::as_exact)
                .and_then(IndexKey::from_value)
        })
        .collect::<Option<Vec<_>>>()
        .map(IndexKey::Array)
}

/// Converts a selected source into a scan source
pub struct RangeBuilder;

impl RangeBuilder {
    pub fn build(selected: &SelectedSource, filter: &WhereClause) -> ScanSource {
        let source = match selected {
            SelectedSource::PrimaryKey { field } => filter
                .get(field)
                .and_then(key_range)
                .map(ScanSource::Primary),
            SelectedSource::Index(index) if index.key_path.is_composite() => {
                composite_key(&index.key_path.fields(), filter).map(|key| ScanSource::Index {
                    name: index.name.clone(),
                    range: KeyRange::only(key),
                })
            }
            SelectedSource::Index(index) => index
                .key_path
                .fields()
                .first()
                .and_then(|field| filter.get(*field))
                .and_then(key_range)
                .map(|range| ScanSource::Index {
                    name: index.name.clone(),
                    range,
                }),
            SelectedSource::FullScan => None,
        };

        source.unwrap_or(ScanSource::FullScan)
    }
}
