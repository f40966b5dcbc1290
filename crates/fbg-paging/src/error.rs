//! Paging error types.

use thiserror::Error;

/// Errors from page navigation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PageError {
    /// Requested page is outside `1..=total_pages`.
    #[error("page {requested} is out of range (1-{total_pages})")]
    InvalidPage {
        /// Requested page.
        requested: usize,
        /// Pages available.
        total_pages: usize,
    },
}

/// Errors raised by a [`crate::DataEngine`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    /// Transport failure reaching the engine.
    #[error("engine unreachable: {0}")]
    Unavailable(String),

    /// The engine rejected the request.
    #[error("engine rejected request: {0}")]
    Rejected(String),

    /// The engine returned data that could not be read.
    #[error("engine returned unreadable data: {0}")]
    InvalidData(String),
}

impl EngineError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_page_message() {
        let err = PageError::InvalidPage {
            requested: 4,
            total_pages: 3,
        };
        assert_eq!(err.to_string(), "page 4 is out of range (1-3)");
    }

    #[test]
    fn test_retryable() {
        assert!(EngineError::Unavailable("timeout".to_string()).is_retryable());
        assert!(!EngineError::Rejected("bad offset".to_string()).is_retryable());
    }
}
