//! Query option structures
//!
//! Defines the declarative request shape handed to the planner: a where
//! clause, ordering, skip, and limit.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::comparison::Comparison;

/// Right-hand side of one where-clause entry
#[derive(Debug, Clone, PartialEq)]
pub enum WhereValue {
    /// Strict equality against a literal
    Literal(Value),
    /// Comparison predicate
    Compare(Comparison),
}

impl WhereValue {
    /// Returns the value if this entry is an exact match
    pub fn as_exact(&self) -> Option<&Value> {
        match self {
            WhereValue::Literal(value) => Some(value),
            WhereValue::Compare(comparison) => comparison.as_exact(),
        }
    }

    pub fn is_exact(&self) -> bool {
        self.as_exact().is_some()
    }

    pub fn lower(&self) -> Option<(&Value, bool)> {
        match self {
            WhereValue::Literal(_) => None,
            WhereValue::Compare(comparison) => comparison.lower(),
        }
    }

    pub fn upper(&self) -> Option<(&Value, bool)> {
        match self {
            WhereValue::Literal(_) => None,
            WhereValue::Compare(comparison) => comparison.upper(),
        }
    }
}

impl fmt::Display for WhereValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhereValue::Literal(value) => write!(f, "= {}", value),
            WhereValue::Compare(comparison) => write!(f, "{}", comparison),
        }
    }
}

impl From<Comparison> for WhereValue {
    fn from(comparison: Comparison) -> Self {
        WhereValue::Compare(comparison)
    }
}

/// A lower and an upper comparison on the same field
impl From<(Comparison, Comparison)> for WhereValue {
    fn from((first, second): (Comparison, Comparison)) -> Self {
        WhereValue::Compare(first.and(&second))
    }
}

impl From<Value> for WhereValue {
    fn from(value: Value) -> Self {
        WhereValue::Literal(value)
    }
}

macro_rules! literal_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for WhereValue {
                fn from(value: $t) -> Self {
                    WhereValue::Literal(Value::from(value))
                }
            }
        )*
    };
}

literal_from!(&str, String, bool, i32, i64, u32, u64, f64);

/// Field name to predicate; every entry must hold
pub type WhereClause = BTreeMap<String, WhereValue>;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Options for a find, update, or delete request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Predicates, all combined with AND
    pub filter: WhereClause,
    /// Maximum number of results. `Some(0)` means no results.
    pub limit: Option<usize>,
    /// Number of leading matches to drop
    pub skip: Option<usize>,
    /// Sort keys, evaluated left to right as tie-breakers
    pub order: Vec<SortSpec>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate on `field`, replacing any previous one
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<WhereValue>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Appends a sort key
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order.push(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    /// Returns true if the request can never yield a result
    pub fn is_zero_limit(&self) -> bool {
        self.limit == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{gt, gte, lt};
    use serde_json::json;

    #[test]
    fn test_options_builder() {
        let options = QueryOptions::new()
            .filter("name", "Ada")
            .filter("age", gt(12))
            .order_by("age", SortDirection::Desc)
            .skip(2)
            .limit(5);

        assert_eq!(options.filter["name"], WhereValue::Literal(json!("Ada")));
        assert_eq!(options.filter["age"], WhereValue::Compare(gt(12)));
        assert_eq!(options.order, vec![SortSpec::desc("age")]);
        assert_eq!(options.skip, Some(2));
        assert_eq!(options.limit, Some(5));
        assert!(!options.is_zero_limit());
        assert!(QueryOptions::new().limit(0).is_zero_limit());
    }

    #[test]
    fn test_pair_becomes_between() {
        let value: WhereValue = (gte(1), lt(10)).into();
        assert_eq!(value.lower(), Some((&json!(1), true)));
        assert_eq!(value.upper(), Some((&json!(10), false)));
        assert!(!value.is_exact());
    }

    #[test]
    fn test_exact_values() {
        assert!(WhereValue::from(3).is_exact());
        assert!(WhereValue::from(crate::planner::eq("x")).is_exact());
        assert!(!WhereValue::from(gt(3)).is_exact());
    }
}
