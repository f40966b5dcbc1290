//! Non-fatal message channel.
//!
//! Transient failures never abort the grid pipeline. They degrade to "show
//! what we have" and are reported here so the host can surface a warning.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Category of a reported problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Network or HTTP failure reaching the engine or the store.
    FetchFailure,
    /// Response with an unexpected shape, treated as empty.
    MalformedResponse,
    /// Some writes of a save failed.
    PartialBatchFailure,
    /// A computed version was already taken by another writer.
    VersionConflict,
    /// Out-of-range page request.
    InvalidPageRequest,
}

impl NoticeKind {
    /// Short label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FetchFailure => "fetch failure",
            Self::MalformedResponse => "malformed response",
            Self::PartialBatchFailure => "partial batch failure",
            Self::VersionConflict => "version conflict",
            Self::InvalidPageRequest => "invalid page request",
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Category.
    pub kind: NoticeKind,
    /// Detail.
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Receiving half of the notice channel.
pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

/// Sending half of the notice channel.
///
/// Cloning is cheap. Every notice is also logged at `warn` level, so a host
/// that never drains the receiver still gets the message in its logs.
#[derive(Debug, Clone)]
pub struct Notices {
    sender: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notices {
    /// Create a connected sender/receiver pair.
    pub fn channel() -> (Self, NoticeReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// A sender that only logs.
    pub fn log_only() -> Self {
        Self { sender: None }
    }

    /// Report a problem.
    pub fn report(&self, kind: NoticeKind, message: impl Into<String>) {
        let notice = Notice {
            kind,
            message: message.into(),
        };
        tracing::warn!("{}", notice);
        if let Some(sender) = &self.sender {
            // A closed receiver means the host stopped listening; the log line stays.
            let _ = sender.send(notice);
        }
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::log_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_reaches_receiver() {
        let (notices, mut receiver) = Notices::channel();
        notices.report(NoticeKind::FetchFailure, "connection refused");

        let notice = receiver.try_recv().unwrap();
        assert_eq!(notice.kind, NoticeKind::FetchFailure);
        assert_eq!(notice.to_string(), "fetch failure: connection refused");
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (notices, receiver) = Notices::channel();
        drop(receiver);
        notices.report(NoticeKind::MalformedResponse, "ignored");
        Notices::log_only().report(NoticeKind::MalformedResponse, "logged");
    }
}
