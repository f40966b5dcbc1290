//! Column layout of the grid.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a [`GridLayout`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The designated key column is not a dimension or measure.
    #[error("key column '{0}' is not a dimension or measure of the dataset")]
    UnknownKeyColumn(String),

    /// Two columns share the same id.
    #[error("duplicate column id '{0}'")]
    DuplicateColumn(String),

    /// The layout has no engine columns at all.
    #[error("layout needs at least one dimension or measure")]
    NoEngineColumns,

    /// The id cannot be stored as an annotation column unchanged.
    #[error("column id '{0}' must be letters, digits and underscores, not starting with a digit")]
    InvalidColumnId(String),

    /// The id collides with a metadata column of the annotation log.
    #[error("column id '{0}' is reserved for annotation metadata")]
    ReservedColumnId(String),
}

/// Names the annotation log uses for its own columns, including the aliases
/// accepted when reading records back.
pub const RESERVED_COLUMN_IDS: &[&str] = &[
    "id",
    "_id",
    "dataset_id",
    "datasetId",
    "app_id",
    "appId",
    "row_key",
    "rowKey",
    "key",
    "version",
    "created_by",
    "createdBy",
    "created_at",
    "createdAt",
    "modified_by",
    "modifiedBy",
    "modified_at",
    "modifiedAt",
    "session_id",
    "sessionId",
];

/// Whether `id` is already a valid store column name: ASCII letters, digits
/// and `_`, not starting with a digit.
pub fn is_safe_identifier(id: &str) -> bool {
    !id.is_empty()
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !id.starts_with(|c: char| c.is_ascii_digit())
}

/// Kind of a grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Engine dimension (selectable in the host engine).
    Dimension,
    /// Engine measure (numeric, never selectable).
    Measure,
    /// Writable annotation column that does not exist in the source dataset.
    Overlay,
}

/// One column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Stable column id (also the annotation field name for overlays).
    pub id: String,
    /// Display label.
    pub label: String,
}

impl ColumnDef {
    /// Create a column whose label equals its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
        }
    }

    /// Create a column with a distinct display label.
    pub fn labelled(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Validated column layout.
///
/// Engine matrices carry dimension cells first and measure cells second, in
/// definition order. Overlays are appended after both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    dimensions: Vec<ColumnDef>,
    measures: Vec<ColumnDef>,
    overlays: Vec<ColumnDef>,
    key_column: String,
}

impl GridLayout {
    /// Build a layout, checking the key column and every column id.
    ///
    /// Ids are written to the annotation log as column names, so each must
    /// be a safe identifier and must not shadow a metadata column.
    pub fn new(
        dimensions: Vec<ColumnDef>,
        measures: Vec<ColumnDef>,
        overlays: Vec<ColumnDef>,
        key_column: impl Into<String>,
    ) -> Result<Self, LayoutError> {
        let key_column = key_column.into();

        if dimensions.is_empty() && measures.is_empty() {
            return Err(LayoutError::NoEngineColumns);
        }

        let mut seen = HashSet::new();
        for column in dimensions.iter().chain(&measures).chain(&overlays) {
            if !is_safe_identifier(&column.id) {
                return Err(LayoutError::InvalidColumnId(column.id.clone()));
            }
            if RESERVED_COLUMN_IDS.contains(&column.id.as_str()) {
                return Err(LayoutError::ReservedColumnId(column.id.clone()));
            }
            if !seen.insert(column.id.as_str()) {
                return Err(LayoutError::DuplicateColumn(column.id.clone()));
            }
        }

        let key_known = dimensions
            .iter()
            .chain(&measures)
            .any(|column| column.id == key_column);
        if !key_known {
            return Err(LayoutError::UnknownKeyColumn(key_column));
        }

        Ok(Self {
            dimensions,
            measures,
            overlays,
            key_column,
        })
    }

    /// Dimension columns in definition order.
    pub fn dimensions(&self) -> &[ColumnDef] {
        &self.dimensions
    }

    /// Measure columns in definition order.
    pub fn measures(&self) -> &[ColumnDef] {
        &self.measures
    }

    /// Overlay columns in definition order.
    pub fn overlays(&self) -> &[ColumnDef] {
        &self.overlays
    }

    /// Id of the designated key column.
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Position of the key column within an engine matrix row.
    pub fn key_position(&self) -> usize {
        self.engine_columns()
            .position(|(column, _)| column.id == self.key_column)
            .unwrap_or_default()
    }

    /// Engine columns (dimensions, then measures) with their kind.
    pub fn engine_columns(&self) -> impl Iterator<Item = (&ColumnDef, ColumnKind)> {
        self.dimensions
            .iter()
            .map(|column| (column, ColumnKind::Dimension))
            .chain(
                self.measures
                    .iter()
                    .map(|column| (column, ColumnKind::Measure)),
            )
    }

    /// Whether `id` names an overlay column.
    pub fn is_overlay(&self, id: &str) -> bool {
        self.overlays.iter().any(|column| column.id == id)
    }

    /// Number of engine columns per matrix row.
    pub fn engine_width(&self) -> usize {
        self.dimensions.len() + self.measures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(ids: &[&str]) -> Vec<ColumnDef> {
        ids.iter().copied().map(ColumnDef::new).collect()
    }

    #[test]
    fn test_key_column_must_exist() {
        let result = GridLayout::new(cols(&["customer"]), vec![], cols(&["status"]), "status");
        assert_eq!(
            result,
            Err(LayoutError::UnknownKeyColumn("status".to_string()))
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = GridLayout::new(
            cols(&["customer"]),
            cols(&["customer"]),
            vec![],
            "customer",
        );
        assert_eq!(
            result,
            Err(LayoutError::DuplicateColumn("customer".to_string()))
        );
    }

    #[test]
    fn test_column_ids_must_be_safe_identifiers() {
        for id in ["Status Note", "status-note", "2nd_status", ""] {
            let result = GridLayout::new(cols(&["customer"]), vec![], cols(&[id]), "customer");
            assert_eq!(result, Err(LayoutError::InvalidColumnId(id.to_string())));
        }
        assert!(
            GridLayout::new(cols(&["customer"]), vec![], cols(&["status_note"]), "customer")
                .is_ok()
        );
    }

    #[test]
    fn test_metadata_column_ids_rejected() {
        let result = GridLayout::new(
            cols(&["customer"]),
            cols(&["version"]),
            cols(&["status"]),
            "customer",
        );
        assert_eq!(
            result,
            Err(LayoutError::ReservedColumnId("version".to_string()))
        );

        let result = GridLayout::new(cols(&["row_key"]), vec![], vec![], "row_key");
        assert_eq!(
            result,
            Err(LayoutError::ReservedColumnId("row_key".to_string()))
        );

        let result = GridLayout::new(cols(&["customer"]), vec![], cols(&["createdBy"]), "customer");
        assert_eq!(
            result,
            Err(LayoutError::ReservedColumnId("createdBy".to_string()))
        );
    }

    #[test]
    fn test_key_position_counts_dimensions_first() {
        let layout = GridLayout::new(
            cols(&["region", "customer"]),
            cols(&["revenue"]),
            cols(&["status"]),
            "revenue",
        )
        .unwrap();
        assert_eq!(layout.key_position(), 2);
        assert_eq!(layout.engine_width(), 3);
        assert!(layout.is_overlay("status"));
        assert!(!layout.is_overlay("region"));
    }
}
