//! Index selection
//!
//! Picks at most one source to narrow the initial scan. Precedence, first
//! usable match wins:
//!
//! 1. Primary key
//! 2. Unique indexes, in declaration order
//! 3. Non-unique indexes, in declaration order
//! 4. Full primary-order scan
//!
//! A source is usable only when the predicate on its field yields a valid
//! key bound. A composite index additionally needs an exact value for every
//! one of its fields. Skipping an unusable candidate never changes the
//! result, only the cost, since every candidate is re-checked afterwards.

use crate::schema::{IndexDescriptor, RecordTypeDescriptor};

use super::ast::WhereClause;
use super::range::{composite_key, key_range};

/// The scan source chosen for a request
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedSource {
    PrimaryKey { field: String },
    Index(IndexDescriptor),
    FullScan,
}

impl SelectedSource {
    pub fn describe(&self) -> String {
        match self {
            SelectedSource::PrimaryKey { field } => format!("primary key '{}'", field),
            SelectedSource::Index(index) => format!("index '{}'", index.name),
            SelectedSource::FullScan => "full scan".to_string(),
        }
    }
}

/// Chooses a scan source for one record type
pub struct IndexSelector<'a> {
    descriptor: &'a RecordTypeDescriptor,
}

impl<'a> IndexSelector<'a> {
    pub fn new(descriptor: &'a RecordTypeDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn select(&self, filter: &WhereClause) -> SelectedSource {
        if filter.is_empty() {
            return SelectedSource::FullScan;
        }

        let primary = self.descriptor.primary_field();
        if filter.get(primary).and_then(key_range).is_some() {
            return SelectedSource::PrimaryKey {
                field: primary.to_string(),
            };
        }

        let unique = self.descriptor.indexes.iter().filter(|i| i.unique);
        let non_unique = self.descriptor.indexes.iter().filter(|i| !i.unique);

        unique
            .chain(non_unique)
            .find(|index| Self::usable(index, filter))
            .map(|index| SelectedSource::Index(index.clone()))
            .unwrap_or(SelectedSource::FullScan)
    }

    fn usable(index: &IndexDescriptor, filter: &WhereClause) -> bool {
        let fields = index.key_path.fields();
        if index.key_path.is_composite() {
            return composite_key(&fields, filter).is_some();
        }
        fields
            .first()
            .and_then(|field| filter.get(*field))
            .and_then(key_range)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{gt, lte, QueryOptions};

    fn student() -> RecordTypeDescriptor {
        RecordTypeDescriptor::builder("student")
            .primary_key("id", true)
            .index("by_age", "age")
            .unique_index("by_email", "email")
            .unique_index("uni_link", ["student_number", "hostel_number", "bed_number"])
            .build()
            .unwrap()
    }

    fn select(options: QueryOptions) -> SelectedSource {
        IndexSelector::new(&student()).select(&options.filter)
    }

    fn index_name(source: SelectedSource) -> Option<String> {
        match source {
            SelectedSource::Index(index) => Some(index.name),
            _ => None,
        }
    }

    #[test]
    fn test_primary_key_first() {
        let source = select(
            QueryOptions::new()
                .filter("id", lte(100))
                .filter("email", "a@x.io"),
        );
        assert_eq!(source, SelectedSource::PrimaryKey { field: "id".into() });
    }

    #[test]
    fn test_unique_before_non_unique() {
        // by_age is declared first but is not unique
        let source = select(
            QueryOptions::new()
                .filter("age", 20)
                .filter("email", "a@x.io"),
        );
        assert_eq!(index_name(source), Some("by_email".into()));

        let source = select(QueryOptions::new().filter("age", gt(12)));
        assert_eq!(index_name(source), Some("by_age".into()));
    }

    #[test]
    fn test_composite_requires_all_exact_fields() {
        let partial = select(
            QueryOptions::new()
                .filter("student_number", 1)
                .filter("hostel_number", 2),
        );
        assert_eq!(partial, SelectedSource::FullScan);

        let ranged = select(
            QueryOptions::new()
                .filter("student_number", 1)
                .filter("hostel_number", 2)
                .filter("bed_number", gt(0)),
        );
        assert_eq!(ranged, SelectedSource::FullScan);

        let full = select(
            QueryOptions::new()
                .filter("bed_number", 3)
                .filter("student_number", 1)
                .filter("hostel_number", 2),
        );
        assert_eq!(index_name(full), Some("uni_link".into()));
    }

    #[test]
    fn test_unusable_composite_falls_through_to_next_index() {
        let source = select(
            QueryOptions::new()
                .filter("student_number", 1)
                .filter("hostel_number", 2)
                .filter("bed_number", gt(0))
                .filter("age", 9),
        );
        assert_eq!(index_name(source), Some("by_age".into()));
    }

    #[test]
    fn test_unkeyable_predicate_skips_index() {
        let source = select(QueryOptions::new().filter("age", true));
        assert_eq!(source, SelectedSource::FullScan);

        let source = select(
            QueryOptions::new()
                .filter("id", serde_json::Value::Null)
                .filter("age", 4),
        );
        assert_eq!(index_name(source), Some("by_age".into()));
    }

    #[test]
    fn test_no_filter_is_full_scan() {
        assert_eq!(select(QueryOptions::new()), SelectedSource::FullScan);
        assert_eq!(
            select(QueryOptions::new().filter("name", "Ada")),
            SelectedSource::FullScan
        );
    }
}
