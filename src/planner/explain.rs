//! Explain output
//!
//! Deterministic, human-readable description of a query plan.

use std::fmt;

use super::planner::QueryPlan;

/// Explain plan output
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainPlan {
    pub store: String,
    /// Scan type, e.g. PK_LOOKUP or INDEX_RANGE
    pub scan_type: String,
    /// Index walked, if any
    pub index: Option<String>,
    pub direction: String,
    pub strategy: String,
    /// One line per predicate
    pub predicates: Vec<String>,
    pub order: Vec<String>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl ExplainPlan {
    pub fn from_plan(plan: &QueryPlan) -> Self {
        Self {
            store: plan.store.clone(),
            scan_type: plan.source.as_str().to_string(),
            index: plan.source.index_name().map(str::to_string),
            direction: plan.direction.as_str().to_string(),
            strategy: plan.strategy.as_str().to_string(),
            predicates: plan
                .filter
                .iter()
                .map(|(field, value)| format!("{} {}", field, value))
                .collect(),
            order: plan
                .order
                .iter()
                .map(|s| format!("{} {}", s.field, s.direction.as_str()))
                .collect(),
            skip: plan.skip,
            limit: plan.limit,
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        writeln!(f, "Store: {}", self.store)?;
        writeln!(f, "Scan Type: {}", self.scan_type)?;
        if let Some(index) = &self.index {
            writeln!(f, "Index: {}", index)?;
        }
        writeln!(f, "Direction: {}", self.direction)?;
        writeln!(f, "Strategy: {}", self.strategy)?;
        if !self.predicates.is_empty() {
            writeln!(f, "Predicates:")?;
            for pred in &self.predicates {
                writeln!(f, "  - {}", pred)?;
            }
        }
        if !self.order.is_empty() {
            writeln!(f, "Order: {}", self.order.join(", "))?;
        }
        if self.skip > 0 {
            writeln!(f, "Skip: {}", self.skip)?;
        }
        if let Some(limit) = self.limit {
            writeln!(f, "Limit: {}", limit)?;
        }
        Ok(())
    }
}
