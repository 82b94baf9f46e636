//! Key encoding for primary keys and index entries

use serde_json::Value;

use crate::schema::KeyPath;
use crate::storage::Record;

/// An orderable key derived from a record value.
///
/// Ordering is deterministic: Number < String < Array.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    /// Numeric value (f64 bits rearranged for total ordering)
    Number(u64),
    /// String value
    String(String),
    /// Composite value, compared element-wise
    Array(Vec<IndexKey>),
}

impl IndexKey {
    /// Create a key from a float.
    ///
    /// NaN is not a valid key. Negative zero collapses onto zero.
    pub fn from_f64(v: f64) -> Option<Self> {
        if v.is_nan() {
            return None;
        }
        let v = if v == 0.0 { 0.0 } else { v };
        let bits = v.to_bits();
        // Negative: flip all bits. Positive: flip sign bit.
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        Some(IndexKey::Number(ordered))
    }

    /// Create a key from an integer
    pub fn from_i64(v: i64) -> Self {
        IndexKey::from_f64(v as f64).unwrap_or(IndexKey::Number(1 << 63))
    }

    /// Create a key from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Create a key from a JSON value.
    ///
    /// Returns None for values that cannot be keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().and_then(IndexKey::from_f64),
            Value::String(s) => Some(IndexKey::from_string(s)),
            Value::Array(items) => items
                .iter()
                .map(IndexKey::from_value)
                .collect::<Option<Vec<_>>>()
                .map(IndexKey::Array),
            _ => None,
        }
    }

    /// Extract the key a record has under `key_path`.
    ///
    /// A composite key path yields a key only if every component is a valid key.
    pub fn from_record(record: &Record, key_path: &KeyPath) -> Option<Self> {
        match key_path {
            KeyPath::Single(field) => record.get(field).and_then(IndexKey::from_value),
            KeyPath::Composite(fields) => fields
                .iter()
                .map(|f| record.get(f).and_then(IndexKey::from_value))
                .collect::<Option<Vec<_>>>()
                .map(IndexKey::Array),
        }
    }

    /// Returns the numeric value if this is a number key
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            IndexKey::Number(ordered) => {
                let bits = if (ordered >> 63) == 1 {
                    ordered ^ (1 << 63)
                } else {
                    !ordered
                };
                Some(f64::from_bits(bits))
            }
            _ => None,
        }
    }

    /// Converts the key back into a JSON value.
    ///
    /// Whole numbers inside the exactly-representable range come back as integers.
    pub fn to_value(&self) -> Value {
        match self {
            IndexKey::Number(_) => {
                let f = self.as_f64().unwrap_or(0.0);
                if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                    Value::from(f as i64)
                } else {
                    serde_json::Number::from_f64(f)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
            }
            IndexKey::String(s) => Value::String(s.clone()),
            IndexKey::Array(items) => Value::Array(items.iter().map(IndexKey::to_value).collect()),
        }
    }
}
