//! Row keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier correlating a displayed row with its annotation history.
///
/// A natural key is the business identifier taken from the designated key
/// column (for example a customer name). When that column is empty the row
/// gets a synthetic key derived from its position. Synthetic keys are not
/// stable across pages or sorts, so they never take part in annotation
/// matching or saving.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowKey {
    /// Business identifier from the key column.
    Natural(String),
    /// Positional fallback, rendered as `row-{index}-page-{page}`.
    Synthetic {
        /// Row index within the page (0-based).
        index: usize,
        /// Page number (1-based).
        page: usize,
    },
}

impl RowKey {
    /// Build a key from a raw cell value, falling back to a synthetic key
    /// when the value is blank.
    pub fn from_cell(value: Option<&str>, index: usize, page: usize) -> Self {
        match value.map(str::trim) {
            Some(text) if !text.is_empty() => Self::Natural(text.to_string()),
            _ => Self::Synthetic { index, page },
        }
    }

    /// The natural key, if this is one.
    #[must_use]
    pub fn natural(&self) -> Option<&str> {
        match self {
            Self::Natural(key) => Some(key),
            Self::Synthetic { .. } => None,
        }
    }

    /// Whether this key is a positional fallback.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic { .. })
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Natural(key) => write!(f, "{key}"),
            Self::Synthetic { index, page } => write!(f, "row-{index}-page-{page}"),
        }
    }
}
