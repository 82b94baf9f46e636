//! Record type declarations for keyscan
//!
//! Record types are declared explicitly, either with `RecordTypeBuilder` or
//! deserialized from a configuration document, and validated before the
//! engine touches storage.
//!
//! # Invariants
//!
//! - Store names are non-empty and unique per database
//! - Index names are unique within a store
//! - Composite key paths are non-empty, ordered, and repeat no field
//! - Descriptors are immutable once registered

mod catalog;
mod errors;
mod types;

pub use catalog::Catalog;
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use types::{
    FieldDef, FieldType, IndexDescriptor, KeyPath, PrimaryKey, RecordTypeBuilder,
    RecordTypeDescriptor,
};
