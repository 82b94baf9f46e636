//! Key ranges and scan sources
//!
//! A `ScanSource` names what a cursor walks; a `KeyRange` bounds the walk.

use std::fmt;
use std::ops::Bound;

use super::key::IndexKey;

/// Cursor direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending key order
    #[default]
    Forward,
    /// Descending key order
    Reverse,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }
}

/// A bounded or unbounded interval of keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    lower: Bound<IndexKey>,
    upper: Bound<IndexKey>,
}

impl KeyRange {
    /// Every key
    pub fn unbounded() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// Exactly one key
    pub fn only(key: IndexKey) -> Self {
        Self {
            lower: Bound::Included(key.clone()),
            upper: Bound::Included(key),
        }
    }

    /// Keys above `key` (or at it when inclusive)
    pub fn lower_bound(key: IndexKey, inclusive: bool) -> Self {
        Self {
            lower: include_if(key, inclusive),
            upper: Bound::Unbounded,
        }
    }

    /// Keys below `key` (or at it when inclusive)
    pub fn upper_bound(key: IndexKey, inclusive: bool) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: include_if(key, inclusive),
        }
    }

    /// Keys between `lower` and `upper`
    pub fn bound(
        lower: IndexKey,
        upper: IndexKey,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> Self {
        Self {
            lower: include_if(lower, lower_inclusive),
            upper: include_if(upper, upper_inclusive),
        }
    }

    pub fn lower(&self) -> Bound<&IndexKey> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Bound<&IndexKey> {
        self.upper.as_ref()
    }

    /// Returns the bounds in the form `BTreeMap::range` accepts
    pub fn as_bounds(&self) -> (Bound<&IndexKey>, Bound<&IndexKey>) {
        (self.lower.as_ref(), self.upper.as_ref())
    }

    /// Returns the key if this range admits exactly one key
    pub fn as_point(&self) -> Option<&IndexKey> {
        match (&self.lower, &self.upper) {
            (Bound::Included(l), Bound::Included(u)) if l == u => Some(l),
            _ => None,
        }
    }

    /// Returns true if no key can fall inside the range
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(l), Bound::Included(u)) => l > u,
            (Bound::Included(l), Bound::Excluded(u))
            | (Bound::Excluded(l), Bound::Included(u))
            | (Bound::Excluded(l), Bound::Excluded(u)) => l >= u,
            _ => false,
        }
    }

    /// Returns true if `key` falls inside the range
    pub fn contains(&self, key: &IndexKey) -> bool {
        let above = match &self.lower {
            Bound::Included(l) => key >= l,
            Bound::Excluded(l) => key > l,
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(u) => key <= u,
            Bound::Excluded(u) => key < u,
            Bound::Unbounded => true,
        };
        above && below
    }

    /// The part of the range still ahead of a cursor positioned at `key`
    pub fn after(&self, key: &IndexKey, direction: Direction) -> KeyRange {
        match direction {
            Direction::Forward => KeyRange {
                lower: Bound::Excluded(key.clone()),
                upper: self.upper.clone(),
            },
            Direction::Reverse => KeyRange {
                lower: self.lower.clone(),
                upper: Bound::Excluded(key.clone()),
            },
        }
    }
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

fn include_if(key: IndexKey, inclusive: bool) -> Bound<IndexKey> {
    if inclusive {
        Bound::Included(key)
    } else {
        Bound::Excluded(key)
    }
}

/// What a cursor walks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanSource {
    /// The whole store in primary-key order
    FullScan,
    /// A primary-key range
    Primary(KeyRange),
    /// A range over a named secondary index
    Index { name: String, range: KeyRange },
}

impl ScanSource {
    /// Returns true if the scan yields records in primary-key order
    pub fn is_primary_order(&self) -> bool {
        matches!(self, ScanSource::FullScan | ScanSource::Primary(_))
    }

    /// Returns the index name for index scans
    pub fn index_name(&self) -> Option<&str> {
        match self {
            ScanSource::Index { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanSource::FullScan => "FULL_SCAN",
            ScanSource::Primary(range) if range.as_point().is_some() => "PK_LOOKUP",
            ScanSource::Primary(_) => "PK_RANGE",
            ScanSource::Index { range, .. } if range.as_point().is_some() => "INDEX_EQ",
            ScanSource::Index { .. } => "INDEX_RANGE",
        }
    }
}

impl fmt::Display for ScanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanSource::Index { name, .. } => write!(f, "{}({})", self.as_str(), name),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}
