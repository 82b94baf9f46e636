//! Query planner for keyscan
//!
//! Turns a declarative request into a deterministic scan plan.
//!
//! # Index Selection Priority (strict order)
//!
//! 1. Primary key
//! 2. Unique index, in declaration order
//! 3. Non-unique index, in declaration order
//! 4. Full scan
//!
//! An index only decides where a scan starts and what it covers. Every
//! candidate is still checked against the full where clause, so the chosen
//! source never changes which records qualify.

mod ast;
mod comparison;
mod explain;
mod planner;
mod range;
mod selector;

pub use ast::{QueryOptions, SortDirection, SortSpec, WhereClause, WhereValue};
pub use comparison::{between, eq, gt, gte, lt, lte, Comparison};
pub use explain::ExplainPlan;
pub use planner::{QueryPlan, QueryPlanner, Strategy};
pub use range::{composite_key, key_range, RangeBuilder};
pub use selector::{IndexSelector, SelectedSource};
