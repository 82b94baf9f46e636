//! Comparison predicates
//!
//! A comparison is an immutable value. Applying a bound on the opposite side
//! of a one-sided comparison yields a new two-sided `Between`; the original is
//! left untouched and can be reused.

use std::fmt;

use serde_json::Value;

/// A comparison against a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// field == value
    Equal(Value),
    /// field < value, or <= when inclusive
    LessThan { value: Value, inclusive: bool },
    /// field > value, or >= when inclusive
    GreaterThan { value: Value, inclusive: bool },
    /// Two-sided bound
    Between {
        lower: Value,
        upper: Value,
        lower_inclusive: bool,
        upper_inclusive: bool,
    },
}

/// field == value
pub fn eq(value: impl Into<Value>) -> Comparison {
    Comparison::Equal(value.into())
}

/// field > value
pub fn gt(value: impl Into<Value>) -> Comparison {
    Comparison::GreaterThan {
        value: value.into(),
        inclusive: false,
    }
}

/// field >= value
pub fn gte(value: impl Into<Value>) -> Comparison {
    Comparison::GreaterThan {
        value: value.into(),
        inclusive: true,
    }
}

/// field < value
pub fn lt(value: impl Into<Value>) -> Comparison {
    Comparison::LessThan {
        value: value.into(),
        inclusive: false,
    }
}

/// field <= value
pub fn lte(value: impl Into<Value>) -> Comparison {
    Comparison::LessThan {
        value: value.into(),
        inclusive: true,
    }
}

/// lower < field < upper, with per-side inclusivity
pub fn between(
    lower: impl Into<Value>,
    upper: impl Into<Value>,
    lower_inclusive: bool,
    upper_inclusive: bool,
) -> Comparison {
    Comparison::Between {
        lower: lower.into(),
        upper: upper.into(),
        lower_inclusive,
        upper_inclusive,
    }
}

impl Comparison {
    /// Adds or replaces the exclusive lower bound
    pub fn gt(&self, value: impl Into<Value>) -> Comparison {
        self.with_lower(value.into(), false)
    }

    /// Adds or replaces the inclusive lower bound
    pub fn gte(&self, value: impl Into<Value>) -> Comparison {
        self.with_lower(value.into(), true)
    }

    /// Adds or replaces the exclusive upper bound
    pub fn lt(&self, value: impl Into<Value>) -> Comparison {
        self.with_upper(value.into(), false)
    }

    /// Adds or replaces the inclusive upper bound
    pub fn lte(&self, value: impl Into<Value>) -> Comparison {
        self.with_upper(value.into(), true)
    }

    /// Combines two comparisons on the same field.
    ///
    /// The bounds of `other` are applied on top of `self`. An `Equal` on
    /// either side wins outright.
    pub fn and(&self, other: &Comparison) -> Comparison {
        match other {
            Comparison::Equal(_) => other.clone(),
            _ if matches!(self, Comparison::Equal(_)) => self.clone(),
            _ => {
                let mut combined = self.clone();
                if let Some((value, inclusive)) = other.lower() {
                    combined = combined.with_lower(value.clone(), inclusive);
                }
                if let Some((value, inclusive)) = other.upper() {
                    combined = combined.with_upper(value.clone(), inclusive);
                }
                combined
            }
        }
    }

    fn with_lower(&self, value: Value, inclusive: bool) -> Comparison {
        match self {
            Comparison::LessThan {
                value: upper,
                inclusive: upper_inclusive,
            }
            | Comparison::Between {
                upper,
                upper_inclusive,
                ..
            } => Comparison::Between {
                lower: value,
                upper: upper.clone(),
                lower_inclusive: inclusive,
                upper_inclusive: *upper_inclusive,
            },
            // An exact match has no open side
            Comparison::GreaterThan { .. } | Comparison::Equal(_) => {
                Comparison::GreaterThan { value, inclusive }
            }
        }
    }

    fn with_upper(&self, value: Value, inclusive: bool) -> Comparison {
        match self {
            Comparison::GreaterThan {
                value: lower,
                inclusive: lower_inclusive,
            }
            | Comparison::Between {
                lower,
                lower_inclusive,
                ..
            } => Comparison::Between {
                lower: lower.clone(),
                upper: value,
                lower_inclusive: *lower_inclusive,
                upper_inclusive: inclusive,
            },
            Comparison::LessThan { .. } | Comparison::Equal(_) => {
                Comparison::LessThan { value, inclusive }
            }
        }
    }

    /// Lower bound and its inclusivity, if any
    pub fn lower(&self) -> Option<(&Value, bool)> {
        match self {
            Comparison::GreaterThan { value, inclusive } => Some((value, *inclusive)),
            Comparison::Between {
                lower,
                lower_inclusive,
                ..
            } => Some((lower, *lower_inclusive)),
            _ => None,
        }
    }

    /// Upper bound and its inclusivity, if any
    pub fn upper(&self) -> Option<(&Value, bool)> {
        match self {
            Comparison::LessThan { value, inclusive } => Some((value, *inclusive)),
            Comparison::Between {
                upper,
                upper_inclusive,
                ..
            } => Some((upper, *upper_inclusive)),
            _ => None,
        }
    }

    /// Returns the value for an exact match
    pub fn as_exact(&self) -> Option<&Value> {
        match self {
            Comparison::Equal(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the operation name for explain output
    pub fn op_name(&self) -> &'static str {
        match self {
            Comparison::Equal(_) => "eq",
            Comparison::LessThan { inclusive: false, .. } => "lt",
            Comparison::LessThan { inclusive: true, .. } => "lte",
            Comparison::GreaterThan { inclusive: false, .. } => "gt",
            Comparison::GreaterThan { inclusive: true, .. } => "gte",
            Comparison::Between { .. } => "between",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Equal(v) => write!(f, "= {}", v),
            Comparison::LessThan { value, inclusive } => {
                write!(f, "{} {}", if *inclusive { "<=" } else { "<" }, value)
            }
            Comparison::GreaterThan { value, inclusive } => {
                write!(f, "{} {}", if *inclusive { ">=" } else { ">" }, value)
            }
            Comparison::Between {
                lower,
                upper,
                lower_inclusive,
                upper_inclusive,
            } => write!(
                f,
                "in {}{}, {}{}",
                if *lower_inclusive { "[" } else { "(" },
                lower,
                upper,
                if *upper_inclusive { "]" } else { ")" }
            ),
        }
    }
}
