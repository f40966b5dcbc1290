//! Error types for the annotation store.

use thiserror::Error;

/// Errors that can occur talking to the annotation store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// Network request failed.
    #[error("network error: {0}")]
    Network(String),

    /// The store answered with a non-success status.
    #[error("annotation store returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The response could not be decoded into annotation records.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// `(dataset, key, version)` already exists in the log.
    #[error("version {version} of '{key}' already exists")]
    VersionConflict {
        /// Natural key.
        key: String,
        /// Version that was taken.
        version: u32,
    },

    /// A write instruction could not be built.
    #[error("invalid write instruction: {0}")]
    InvalidInstruction(String),

    /// Store client misconfiguration.
    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns a user-friendly error message suitable for display.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network(_) => {
                "Could not reach the annotation store. Please check your connection."
            }
            Self::Status { .. } => "The annotation store rejected the request.",
            Self::MalformedResponse(_) => "The annotation store sent an unexpected response.",
            Self::VersionConflict { .. } => {
                "Someone else saved this row at the same time. Please review and save again."
            }
            Self::InvalidInstruction(_) | Self::Config(_) => "An unexpected error occurred.",
        }
    }

    /// Returns whether this error is potentially recoverable with a retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::VersionConflict { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
