//! Projected grid rows.

use serde::{Deserialize, Serialize};

use crate::key::RowKey;
use crate::layout::ColumnKind;

/// Read-only value supplied by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadonlyCell {
    /// Display text.
    pub text: String,
    /// Numeric value (measures only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<f64>,
    /// Whether the value can be selected in the host engine.
    pub selectable: bool,
    /// Engine element id for selection forwarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<i64>,
}

/// Writable annotation value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayCell {
    /// Current text.
    pub text: String,
    /// Always true for overlay columns.
    pub editable: bool,
}

impl OverlayCell {
    /// An empty, editable overlay value.
    pub fn empty() -> Self {
        Self::with_text(String::new())
    }

    /// An editable overlay value holding `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            editable: true,
        }
    }
}

/// A read-only field of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadonlyField {
    /// Column id.
    pub column: String,
    /// Value.
    pub cell: ReadonlyCell,
}

/// An overlay field of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayField {
    /// Overlay id.
    pub overlay: String,
    /// Value.
    pub cell: OverlayCell,
}

/// One projected row.
///
/// Rows are rebuilt on every page load and merge; the natural key is the only
/// identity that survives between rebuilds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Natural or synthetic key.
    pub key: RowKey,
    /// Position within the page (0-based).
    pub index: usize,
    /// Engine fields in column order.
    pub readonly: Vec<ReadonlyField>,
    /// Overlay fields in overlay definition order.
    pub overlay: Vec<OverlayField>,
}

impl Row {
    /// Read-only value of `column`.
    pub fn readonly(&self, column: &str) -> Option<&ReadonlyCell> {
        self.readonly
            .iter()
            .find(|field| field.column == column)
            .map(|field| &field.cell)
    }

    /// Overlay value of `overlay`.
    pub fn overlay(&self, overlay: &str) -> Option<&OverlayCell> {
        self.overlay
            .iter()
            .find(|field| field.overlay == overlay)
            .map(|field| &field.cell)
    }

    /// Overlay text of `overlay`, empty when unset.
    pub fn overlay_text(&self, overlay: &str) -> &str {
        self.overlay(overlay)
            .map(|cell| cell.text.as_str())
            .unwrap_or_default()
    }

    /// Replace the text of an existing overlay field.
    ///
    /// Returns `false` when the row has no such overlay.
    pub fn set_overlay(&mut self, overlay: &str, text: impl Into<String>) -> bool {
        match self
            .overlay
            .iter_mut()
            .find(|field| field.overlay == overlay)
        {
            Some(field) => {
                field.cell.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Natural key, if the row has one.
    pub fn natural_key(&self) -> Option<&str> {
        self.key.natural()
    }
}

/// Header entry handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Column id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Column kind.
    pub kind: ColumnKind,
    /// Whether values can be selected in the engine.
    pub selectable: bool,
    /// Whether values can be edited.
    pub editable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        Row {
            key: RowKey::Natural("Acme".to_string()),
            index: 0,
            readonly: vec![ReadonlyField {
                column: "customer".to_string(),
                cell: ReadonlyCell {
                    text: "Acme".to_string(),
                    selectable: true,
                    ..Default::default()
                },
            }],
            overlay: vec![OverlayField {
                overlay: "status".to_string(),
                cell: OverlayCell::empty(),
            }],
        }
    }

    #[test]
    fn test_lookup_by_column() {
        let row = sample_row();
        assert_eq!(row.readonly("customer").unwrap().text, "Acme");
        assert!(row.readonly("missing").is_none());
        assert_eq!(row.overlay_text("status"), "");
    }

    #[test]
    fn test_set_overlay_only_touches_known_fields() {
        let mut row = sample_row();
        assert!(row.set_overlay("status", "Accurate"));
        assert!(!row.set_overlay("comments", "nope"));
        assert_eq!(row.overlay_text("status"), "Accurate");
        assert!(row.overlay("status").unwrap().editable);
    }
}
