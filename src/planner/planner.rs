//! Query planner
//!
//! Produces deterministic, immutable plans: the scan source and direction,
//! and whether skip/limit can be applied while streaming or only after a
//! full materialise-and-sort.

use std::fmt;

use tracing::debug;

use crate::index::{Direction, ScanSource};
use crate::schema::RecordTypeDescriptor;

use super::ast::{QueryOptions, SortDirection, SortSpec, WhereClause};
use super::range::RangeBuilder;
use super::selector::IndexSelector;

/// How results are finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Scan order already matches the requested order. Skip and limit are
    /// applied during traversal.
    Stream,
    /// Collect every match, sort, then slice
    Materialize,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Stream => "STREAM",
            Strategy::Materialize => "MATERIALIZE",
        }
    }
}

/// Immutable query plan (no runtime state)
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Target store
    pub store: String,
    /// Where the scan starts and what it covers
    pub source: ScanSource,
    /// Scan direction
    pub direction: Direction,
    pub strategy: Strategy,
    /// Predicates re-checked on every candidate
    pub filter: WhereClause,
    /// Sort keys, used only when materialising
    pub order: Vec<SortSpec>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl QueryPlan {
    /// Returns true if the plan can never yield a result
    pub fn is_zero_limit(&self) -> bool {
        self.limit == Some(0)
    }

    pub fn is_streaming(&self) -> bool {
        self.strategy == Strategy::Stream
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.store,
            self.source,
            self.direction.as_str(),
            self.strategy.as_str()
        )?;
        if self.skip > 0 {
            write!(f, " skip={}", self.skip)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit={}", limit)?;
        }
        Ok(())
    }
}

/// Query planner for one record type
pub struct QueryPlanner<'a> {
    descriptor: &'a RecordTypeDescriptor,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(descriptor: &'a RecordTypeDescriptor) -> Self {
        Self { descriptor }
    }

    /// Plans a request.
    ///
    /// Same descriptor and options always yield the same plan.
    pub fn plan(&self, options: &QueryOptions) -> QueryPlan {
        let selected = IndexSelector::new(self.descriptor).select(&options.filter);
        let source = RangeBuilder::build(&selected, &options.filter);
        let (strategy, direction) = self.strategy(&source, &options.order);

        let plan = QueryPlan {
            store: self.descriptor.store_name.clone(),
            source,
            direction,
            strategy,
            filter: options.filter.clone(),
            order: options.order.clone(),
            skip: options.skip.unwrap_or(0),
            limit: options.limit,
        };

        debug!(selected = %selected.describe(), plan = %plan, "planned query");
        plan
    }

    /// Streams when no order is requested, or when the only order is the
    /// primary key and the scan already walks primary-key order.
    fn strategy(&self, source: &ScanSource, order: &[SortSpec]) -> (Strategy, Direction) {
        match order {
            [] => (Strategy::Stream, Direction::Forward),
            [only]
                if only.field == self.descriptor.primary_field()
                    && source.is_primary_order() =>
            {
                let direction = match only.direction {
                    SortDirection::Asc => Direction::Forward,
                    SortDirection::Desc => Direction::Reverse,
                };
                (Strategy::Stream, direction)
            }
            _ => (Strategy::Materialize, Direction::Forward),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexKey, KeyRange};
    use crate::planner::{gt, lte};

    fn student() -> RecordTypeDescriptor {
        RecordTypeDescriptor::builder("student")
            .primary_key("id", true)
            .index("by_age", "age")
            .build()
            .unwrap()
    }

    #[test]
    fn test_plan_without_order_streams() {
        let descriptor = student();
        let plan = QueryPlanner::new(&descriptor)
            .plan(&QueryOptions::new().filter("age", gt(12)).limit(3));

        assert_eq!(plan.strategy, Strategy::Stream);
        assert_eq!(plan.direction, Direction::Forward);
        assert_eq!(
            plan.source,
            ScanSource::Index {
                name: "by_age".into(),
                range: KeyRange::lower_bound(IndexKey::from_i64(12), false),
            }
        );
        assert_eq!(plan.limit, Some(3));
    }

    #[test]
    fn test_descending_primary_key_reverses_scan() {
        let descriptor = student();
        let plan = QueryPlanner::new(&descriptor).plan(
            &QueryOptions::new()
                .filter("id", lte(100))
                .order_by("id", SortDirection::Desc),
        );

        assert_eq!(plan.strategy, Strategy::Stream);
        assert_eq!(plan.direction, Direction::Reverse);
        assert_eq!(plan.source.as_str(), "PK_RANGE");
    }

    #[test]
    fn test_primary_order_over_index_materializes() {
        let descriptor = student();
        let plan = QueryPlanner::new(&descriptor).plan(
            &QueryOptions::new()
                .filter("age", 4)
                .order_by("id", SortDirection::Desc),
        );
        assert_eq!(plan.strategy, Strategy::Materialize);
        assert_eq!(plan.direction, Direction::Forward);
    }

    #[test]
    fn test_field_order_materializes() {
        let descriptor = student();
        let plan = QueryPlanner::new(&descriptor).plan(
            &QueryOptions::new()
                .order_by("age", SortDirection::Asc)
                .skip(5),
        );
        assert_eq!(plan.strategy, Strategy::Materialize);
        assert_eq!(plan.source, ScanSource::FullScan);
        assert_eq!(plan.skip, 5);
        assert!(!plan.is_streaming());
    }

    #[test]
    fn test_plan_is_deterministic() {
        let descriptor = student();
        let options = QueryOptions::new().filter("age", gt(1)).filter("name", "x");
        let planner = QueryPlanner::new(&descriptor);
        assert_eq!(planner.plan(&options), planner.plan(&options));
    }

    #[test]
    fn test_plan_display() {
        let descriptor = student();
        let plan = QueryPlanner::new(&descriptor)
            .plan(&QueryOptions::new().filter("age", 3).skip(1).limit(2));
        let text = plan.to_string();
        assert!(text.starts_with("student INDEX_EQ(by_age)"));
        assert!(text.contains("STREAM"));
        assert!(text.ends_with("skip=1 limit=2"));
    }
}
