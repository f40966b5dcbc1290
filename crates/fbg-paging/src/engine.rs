//! The analytics engine seam.

use async_trait::async_trait;
use fbg_model::{PageMatrix, PageRequest};

use crate::error::EngineError;
use crate::state::PageTicket;

/// Identity of the dataset currently shown.
///
/// A change of either part means the user is looking at different data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetFingerprint {
    /// Dataset (application/session) id.
    pub dataset_id: String,
    /// Total rows of the current query result.
    pub total_rows: usize,
}

impl DatasetFingerprint {
    /// Create a fingerprint.
    pub fn new(dataset_id: impl Into<String>, total_rows: usize) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            total_rows,
        }
    }
}

/// Source of paginated, read-only rows.
///
/// Implementations return the dimension cells followed by the measure cells
/// for every row of the requested window. The page number in the returned
/// matrix is overwritten by the caller.
#[async_trait]
pub trait DataEngine: Send + Sync {
    /// Fetch rows `offset..offset + limit`.
    async fn fetch_page(&self, request: PageRequest) -> Result<PageMatrix, EngineError>;

    /// Total rows of the current result set.
    fn total_rows(&self) -> usize;

    /// Dataset id of the current result set.
    fn dataset_id(&self) -> String;

    /// Whether the user is in the middle of an interactive selection.
    fn selection_in_progress(&self) -> bool {
        false
    }

    /// Current fingerprint.
    fn fingerprint(&self) -> DatasetFingerprint {
        DatasetFingerprint::new(self.dataset_id(), self.total_rows())
    }
}

/// Run the fetch described by `ticket`.
pub async fn fetch_ticket(
    engine: &dyn DataEngine,
    ticket: &PageTicket,
) -> Result<PageMatrix, EngineError> {
    tracing::debug!(
        "Fetching page {} (offset {}, limit {}, seq {})",
        ticket.page,
        ticket.request.offset,
        ticket.request.limit,
        ticket.seq
    );
    let mut matrix = engine.fetch_page(ticket.request).await?;
    matrix.page = ticket.page;
    Ok(matrix)
}
