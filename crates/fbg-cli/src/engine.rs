//! CSV file as a [`DataEngine`].
//!
//! The whole file is read once; pages are slices of it. Dimension cells get
//! their row number as element id so a host can forward selections.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::ReaderBuilder;
use fbg_model::{EngineCell, GridLayout, PageMatrix, PageRequest};
use fbg_paging::{DataEngine, EngineError};
use thiserror::Error;

/// Errors loading a CSV dataset.
#[derive(Debug, Error)]
pub enum CsvEngineError {
    /// The file could not be read or parsed.
    #[error("Failed to read CSV {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A layout column is not a CSV header.
    #[error("Column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },
}

/// In-memory CSV dataset.
#[derive(Debug, Clone)]
pub struct CsvEngine {
    dataset_id: String,
    rows: Vec<Vec<EngineCell>>,
    positions: HashMap<String, usize>,
}

impl CsvEngine {
    /// Read `path`, keeping the layout's dimension and measure columns.
    pub fn load(
        path: &Path,
        layout: &GridLayout,
        dataset_id: impl Into<String>,
    ) -> Result<Self, CsvEngineError> {
        let read_error = |source| CsvEngineError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(read_error)?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(read_error)?
            .iter()
            .map(|header| header.trim_matches('\u{feff}').to_string())
            .collect();

        let index_of = |column: &str| {
            headers
                .iter()
                .position(|header| header == column)
                .ok_or_else(|| CsvEngineError::MissingColumn {
                    column: column.to_string(),
                    path: path.to_path_buf(),
                })
        };
        let dimensions = layout
            .dimensions()
            .iter()
            .map(|column| index_of(&column.id))
            .collect::<Result<Vec<_>, _>>()?;
        let measures = layout
            .measures()
            .iter()
            .map(|column| index_of(&column.id))
            .collect::<Result<Vec<_>, _>>()?;
        let key_index = index_of(layout.key_column())?;

        let mut rows = Vec::new();
        let mut positions = HashMap::new();
        for (row_number, record) in reader.records().enumerate() {
            let record = record.map_err(read_error)?;
            let field = |idx: usize| record.get(idx).unwrap_or_default();

            let mut cells = Vec::with_capacity(dimensions.len() + measures.len());
            for &idx in &dimensions {
                let mut cell = EngineCell::text(field(idx));
                cell.element_id = i64::try_from(row_number).ok();
                cells.push(cell);
            }
            for &idx in &measures {
                let text = field(idx);
                cells.push(match text.parse::<f64>() {
                    Ok(value) => EngineCell::number(text, value),
                    Err(_) => EngineCell::text(text),
                });
            }

            let key = field(key_index);
            if !key.is_empty() {
                positions.entry(key.to_string()).or_insert(row_number);
            }
            rows.push(cells);
        }

        let dataset_id = dataset_id.into();
        tracing::info!(
            "Loaded {} rows of {} from {}",
            rows.len(),
            dataset_id,
            path.display()
        );
        Ok(Self {
            dataset_id,
            rows,
            positions,
        })
    }

    /// 0-based row position of the first row with natural key `key`.
    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Page (1-based) holding `key` at `page_size` rows per page.
    pub fn page_of(&self, key: &str, page_size: usize) -> Option<usize> {
        self.position_of(key)
            .map(|position| position / page_size.max(1) + 1)
    }
}

#[async_trait]
impl DataEngine for CsvEngine {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageMatrix, EngineError> {
        let start = request.offset.min(self.rows.len());
        let end = request.offset.saturating_add(request.limit).min(self.rows.len());
        Ok(PageMatrix::new(0, self.rows[start..end].to_vec()))
    }

    fn total_rows(&self) -> usize {
        self.rows.len()
    }

    fn dataset_id(&self) -> String {
        self.dataset_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbg_model::ColumnDef;
    use tempfile::tempdir;

    fn layout() -> GridLayout {
        GridLayout::new(
            vec![ColumnDef::new("customer")],
            vec![ColumnDef::new("revenue")],
            vec![ColumnDef::new("status")],
            "customer",
        )
        .unwrap()
    }

    fn write_csv(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("sales.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_pages_are_slices_in_layout_order() {
        let dir = tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "\u{feff}region,revenue,customer\nnorth,10,Acme\nsouth,n/a,Beta\neast,30,Cora\n",
        );
        let engine = CsvEngine::load(&path, &layout(), "sales").unwrap();
        assert_eq!(engine.total_rows(), 3);

        let page = engine
            .fetch_page(PageRequest::for_page(2, 2))
            .await
            .unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0][0].text, "Cora");
        assert_eq!(page.rows[0][0].element_id, Some(2));
        assert_eq!(page.rows[0][1].numeric, Some(30.0));

        let first = engine
            .fetch_page(PageRequest::for_page(1, 2))
            .await
            .unwrap();
        assert_eq!(first.rows[1][1].numeric, None);
        assert_eq!(first.rows[1][1].text, "n/a");
    }

    #[tokio::test]
    async fn test_window_past_end_is_empty() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "customer,revenue\nAcme,1\n");
        let engine = CsvEngine::load(&path, &layout(), "sales").unwrap();
        let page = engine
            .fetch_page(PageRequest { offset: 10, limit: 5 })
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_page_of_key() {
        let dir = tempdir().unwrap();
        let rows: String = (0..25).map(|i| format!("c{i},{i}\n")).collect();
        let path = write_csv(dir.path(), &format!("customer,revenue\n{rows}"));
        let engine = CsvEngine::load(&path, &layout(), "sales").unwrap();
        assert_eq!(engine.page_of("c0", 10), Some(1));
        assert_eq!(engine.page_of("c10", 10), Some(2));
        assert_eq!(engine.page_of("c24", 10), Some(3));
        assert_eq!(engine.page_of("missing", 10), None);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "customer,amount\nAcme,1\n");
        let err = CsvEngine::load(&path, &layout(), "sales").unwrap_err();
        assert!(matches!(
            err,
            CsvEngineError::MissingColumn { ref column, .. } if column == "revenue"
        ));
    }
}
