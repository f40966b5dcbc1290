//! Engine page matrices.

use serde::{Deserialize, Serialize};

/// A page request sent to the analytics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Index of the first row (0-based).
    pub offset: usize,
    /// Maximum number of rows.
    pub limit: usize,
}

impl PageRequest {
    /// Request for 1-based `page` with `page_size` rows per page.
    pub fn for_page(page: usize, page_size: usize) -> Self {
        Self {
            offset: page.saturating_sub(1) * page_size,
            limit: page_size,
        }
    }
}

/// One cell as supplied by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineCell {
    /// Display text.
    pub text: String,
    /// Numeric value, for measures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<f64>,
    /// Engine element id, for selectable dimension values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<i64>,
}

impl EngineCell {
    /// Text-only cell.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Measure cell with display text and numeric value.
    pub fn number(text: impl Into<String>, value: f64) -> Self {
        Self {
            text: text.into(),
            numeric: Some(value),
            element_id: None,
        }
    }
}

/// A rectangular block of cells for one page.
///
/// Each row holds the dimension cells followed by the measure cells, in the
/// layout's definition order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMatrix {
    /// Page number this matrix belongs to (1-based).
    pub page: usize,
    /// Cell rows.
    pub rows: Vec<Vec<EngineCell>>,
}

impl PageMatrix {
    /// Create a matrix for `page`.
    pub fn new(page: usize, rows: Vec<Vec<EngineCell>>) -> Self {
        Self { page, rows }
    }

    /// Number of rows in the page.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the page has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
