//! Search result model.

use keysweep_core::constants::REDACTED_PLACEHOLDER;
use serde::Serialize;
use std::fmt;

/// A result value. `Pending` is a sentinel patched in place once the
/// deferred secret job resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SearchValue {
    Resolved(String),
    Redacted,
    Pending,
}

impl fmt::Display for SearchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchValue::Resolved(value) => f.write_str(value),
            SearchValue::Redacted => f.write_str(REDACTED_PLACEHOLDER),
            SearchValue::Pending => Ok(()),
        }
    }
}

/// Diff coloring of a value against its counterpart scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueColor {
    /// Defined at this scope only.
    Own,
    /// Equal to the group's value.
    Inherited,
    /// Environment overrides the group's value.
    Overridden,
    /// Group value not overridden by the environment.
    FromGroup,
}

/// One matched key. Consumers correlate results by `path` + `key`, never by
/// position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub path: String,
    pub key: String,
    pub value: SearchValue,
    pub color: Option<ValueColor>,
}

impl SearchResult {
    pub fn new(
        path: impl Into<String>,
        key: impl Into<String>,
        value: SearchValue,
        color: Option<ValueColor>,
    ) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            value,
            color,
        }
    }
}
