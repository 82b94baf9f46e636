//! Record type declarations
//!
//! A record type maps application records onto one object store: a store
//! name, declared fields, a primary key, and zero or more indexes.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};

/// Declared field type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    /// Any JSON value
    #[default]
    Any,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }

    /// Returns true if `value` has this type
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::Any, _)
                | (FieldType::String, Value::String(_))
                | (FieldType::Number, Value::Number(_))
                | (FieldType::Boolean, Value::Bool(_))
                | (FieldType::Array, Value::Array(_))
                | (FieldType::Object, Value::Object(_))
        )
    }
}

/// Field metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldDef {
    /// Declared type tag
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Value written on insert when the field is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDef {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Primary key descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    /// Field holding the key
    pub field: String,
    /// Whether missing keys are generated on insert
    #[serde(default = "default_auto_increment")]
    pub auto_increment: bool,
}

fn default_auto_increment() -> bool {
    true
}

impl Default for PrimaryKey {
    fn default() -> Self {
        Self {
            field: "_id".to_string(),
            auto_increment: true,
        }
    }
}

/// Fields an index is keyed on.
///
/// Composite field order is fixed at declaration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPath {
    Single(String),
    Composite(Vec<String>),
}

impl KeyPath {
    /// Fields in declared order
    pub fn fields(&self) -> Vec<&str> {
        match self {
            KeyPath::Single(field) => vec![field.as_str()],
            KeyPath::Composite(fields) => fields.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, KeyPath::Composite(_))
    }
}

impl From<&str> for KeyPath {
    fn from(field: &str) -> Self {
        KeyPath::Single(field.to_string())
    }
}

impl From<String> for KeyPath {
    fn from(field: String) -> Self {
        KeyPath::Single(field)
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(fields: [&str; N]) -> Self {
        KeyPath::Composite(fields.iter().map(|f| f.to_string()).collect())
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(fields: Vec<String>) -> Self {
        KeyPath::Composite(fields)
    }
}

/// Declared index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Name, unique within the store
    pub name: String,
    /// Whether two records may share a key
    #[serde(default)]
    pub unique: bool,
    /// Key fields
    pub key_path: KeyPath,
}

impl IndexDescriptor {
    pub fn new(name: impl Into<String>, key_path: impl Into<KeyPath>, unique: bool) -> Self {
        Self {
            name: name.into(),
            unique,
            key_path: key_path.into(),
        }
    }

    /// Validates the declaration itself
    pub fn validate(&self, store: &str) -> SchemaResult<()> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::malformed_index(store, &self.name, "index name is empty"));
        }
        match &self.key_path {
            KeyPath::Single(field) if field.trim().is_empty() => Err(SchemaError::malformed_index(
                store,
                &self.name,
                "key path is empty",
            )),
            KeyPath::Composite(fields) if fields.is_empty() => Err(SchemaError::malformed_index(
                store,
                &self.name,
                "composite key path has no fields",
            )),
            KeyPath::Composite(fields) => {
                let mut seen = HashSet::new();
                for field in fields {
                    if field.trim().is_empty() {
                        return Err(SchemaError::malformed_index(
                            store,
                            &self.name,
                            "composite key path contains an empty field",
                        ));
                    }
                    if !seen.insert(field.as_str()) {
                        return Err(SchemaError::malformed_index(
                            store,
                            &self.name,
                            format!("field '{}' repeats in composite key path", field),
                        ));
                    }
                }
                Ok(())
            }
            KeyPath::Single(_) => Ok(()),
        }
    }
}

/// Complete record type descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTypeDescriptor {
    /// Object store name, unique per database
    pub store_name: String,
    /// Declared fields
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,
    /// Primary key
    #[serde(default)]
    pub primary_key: PrimaryKey,
    /// Declared indexes, in declaration order
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
}

impl RecordTypeDescriptor {
    /// Start declaring a record type
    pub fn builder(store_name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder::new(store_name)
    }

    /// Returns the primary key field name
    pub fn primary_field(&self) -> &str {
        &self.primary_key.field
    }

    /// Looks up a declared index by name
    pub fn index(&self, name: &str) -> Option<&IndexDescriptor> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Validates the descriptor structure
    pub fn validate(&self) -> SchemaResult<()> {
        if self.store_name.trim().is_empty() {
            return Err(SchemaError::invalid_store_name(&self.store_name));
        }
        if self.primary_key.field.trim().is_empty() {
            return Err(SchemaError::invalid_primary_key(&self.store_name));
        }

        for (name, field) in &self.fields {
            if let Some(default) = &field.default {
                if !field.field_type.accepts(default) {
                    return Err(SchemaError::malformed_config(
                        &self.store_name,
                        format!(
                            "default {} of field '{}' is not a {}",
                            default,
                            name,
                            field.field_type.type_name()
                        ),
                    ));
                }
            }
        }

        let mut names = HashSet::new();
        for index in &self.indexes {
            index.validate(&self.store_name)?;
            if !names.insert(index.name.as_str()) {
                return Err(SchemaError::duplicate_index(&self.store_name, &index.name));
            }
        }

        Ok(())
    }
}

/// Builder producing a validated `RecordTypeDescriptor`
#[derive(Debug, Clone)]
pub struct RecordTypeBuilder {
    descriptor: RecordTypeDescriptor,
}

impl RecordTypeBuilder {
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            descriptor: RecordTypeDescriptor {
                store_name: store_name.into(),
                fields: BTreeMap::new(),
                primary_key: PrimaryKey::default(),
                indexes: Vec::new(),
            },
        }
    }

    /// Sets the primary key field and whether it is generated
    pub fn primary_key(mut self, field: impl Into<String>, auto_increment: bool) -> Self {
        self.descriptor.primary_key = PrimaryKey {
            field: field.into(),
            auto_increment,
        };
        self
    }

    /// Declares a field
    pub fn column(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.descriptor
            .fields
            .insert(name.into(), FieldDef::new(field_type));
        self
    }

    /// Declares a field with an insert-time default
    pub fn column_with_default(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        default: impl Into<Value>,
    ) -> Self {
        self.descriptor
            .fields
            .insert(name.into(), FieldDef::new(field_type).with_default(default));
        self
    }

    /// Declares a non-unique index
    pub fn index(mut self, name: impl Into<String>, key_path: impl Into<KeyPath>) -> Self {
        self.descriptor
            .indexes
            .push(IndexDescriptor::new(name, key_path, false));
        self
    }

    /// Declares a unique index
    pub fn unique_index(mut self, name: impl Into<String>, key_path: impl Into<KeyPath>) -> Self {
        self.descriptor
            .indexes
            .push(IndexDescriptor::new(name, key_path, true));
        self
    }

    /// Validates and returns the descriptor
    pub fn build(self) -> SchemaResult<RecordTypeDescriptor> {
        self.descriptor.validate()?;
        Ok(self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaErrorCode;
    use serde_json::json;

    fn student() -> RecordTypeBuilder {
        RecordTypeDescriptor::builder("student")
            .primary_key("id", true)
            .column("name", FieldType::String)
            .column("age", FieldType::Number)
    }

    #[test]
    fn test_builder_valid() {
        let descriptor = student()
            .index("by_age", "age")
            .unique_index("uni_link", ["student_number", "hostel_number", "bed_number"])
            .build()
            .unwrap();

        assert_eq!(descriptor.primary_field(), "id");
        assert_eq!(descriptor.indexes.len(), 2);
        assert!(descriptor.index("uni_link").unwrap().unique);
        assert!(descriptor.index("uni_link").unwrap().key_path.is_composite());
        assert_eq!(
            descriptor.index("uni_link").unwrap().key_path.fields(),
            vec!["student_number", "hostel_number", "bed_number"]
        );
    }

    #[test]
    fn test_default_primary_key() {
        let descriptor = RecordTypeDescriptor::builder("account").build().unwrap();
        assert_eq!(descriptor.primary_field(), "_id");
        assert!(descriptor.primary_key.auto_increment);
    }

    #[test]
    fn test_empty_store_name_rejected() {
        let err = RecordTypeDescriptor::builder("  ").build().unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::InvalidStoreName);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let err = student()
            .index("by_age", "age")
            .index("by_age", "name")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::DuplicateIndex);
    }

    #[test]
    fn test_malformed_composite_rejected() {
        let err = student()
            .index("pair", KeyPath::Composite(vec![]))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::MalformedIndex);

        let err = student()
            .index("pair", ["age", "age"])
            .build()
            .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::MalformedIndex);
    }

    #[test]
    fn test_default_must_match_field_type() {
        let err = RecordTypeDescriptor::builder("student")
            .column_with_default("active", FieldType::Boolean, "yes")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::MalformedConfig);
        assert!(err.message().contains("is not a boolean"));

        assert!(RecordTypeDescriptor::builder("student")
            .column_with_default("tags", FieldType::Any, json!(["a"]))
            .build()
            .is_ok());
    }

    #[test]
    fn test_deserialize_descriptor() {
        let descriptor: RecordTypeDescriptor = serde_json::from_value(json!({
            "store_name": "account",
            "fields": {
                "name": {"type": "string"},
                "active": {"type": "boolean", "default": true}
            },
            "primary_key": {"field": "id"},
            "indexes": [
                {"name": "name", "key_path": "name"},
                {"name": "pair", "unique": true, "key_path": ["name", "active"]}
            ]
        }))
        .unwrap();

        assert!(descriptor.primary_key.auto_increment);
        assert_eq!(descriptor.fields["active"].default, Some(json!(true)));
        assert_eq!(descriptor.indexes[0].key_path, KeyPath::Single("name".into()));
        assert!(descriptor.indexes[1].unique);
        assert!(descriptor.validate().is_ok());
    }
}
