//! Record mutation helpers

use crate::schema::RecordTypeDescriptor;
use crate::storage::Record;

/// Merges `patch` onto `original`.
///
/// The primary key field always keeps its original value, whether or not the
/// patch carries one.
pub fn merge_update(original: &Record, patch: &Record, primary_field: &str) -> Record {
    let mut merged = original.clone();
    for (field, value) in patch {
        if field != primary_field {
            merged.insert(field.clone(), value.clone());
        }
    }
    merged
}

/// Writes declared column defaults for fields the record does not carry
pub fn apply_defaults(record: &mut Record, descriptor: &RecordTypeDescriptor) {
    for (field, def) in &descriptor.fields {
        if let Some(default) = &def.default {
            if !record.contains_key(field) {
                record.insert(field.clone(), default.clone());
            }
        }
    }
}
