//! Record representation
//!
//! A record is an opaque JSON object. Missing fields are absent keys; `null`
//! is a defined value.

use serde_json::{Map, Value};

use super::errors::{StorageError, StorageResult};

/// A stored record: field name to value
pub type Record = Map<String, Value>;

/// Converts a JSON value into a record.
///
/// Only JSON objects are records.
pub fn into_record(value: Value) -> StorageResult<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::Data(format!(
            "expected a JSON object, got {}",
            value_kind(&other)
        ))),
    }
}

/// Short name of a value's JSON type
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_record() {
        let record = into_record(json!({"id": 1, "name": "Ada"})).unwrap();
        assert_eq!(record["name"], json!("Ada"));
        assert!(!record.contains_key("age"));
    }

    #[test]
    fn test_into_record_rejects_non_objects() {
        let err = into_record(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("array"));
        assert!(into_record(Value::Null).is_err());
    }
}
