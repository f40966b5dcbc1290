//! Editing identity.

use serde::{Deserialize, Serialize};

/// Who is editing, as supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// User name.
    pub user: String,
    /// Session id of this client.
    pub session_id: String,
}

impl Identity {
    /// Create an identity.
    pub fn new(user: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            session_id: session_id.into(),
        }
    }
}
