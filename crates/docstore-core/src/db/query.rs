// Query value for multi-document reads: a filter plus sort, skip and limit.

use serde::{Deserialize, Serialize};

use crate::db::Record;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort specification (field + direction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Parameters for `Collection::find_all`.
///
/// Without sort keys, results come back in whatever order the store yields
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Record,
    pub sort: Vec<SortBy>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn new(filter: Record) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Replace the filter, keeping sort/skip/limit.
    pub fn with_filter(mut self, filter: Record) -> Self {
        self.filter = filter;
        self
    }

    /// Append a sort key. Earlier keys take precedence.
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }
}
