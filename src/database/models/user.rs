//! Chat participant as seen by the engine.

use serde::{Deserialize, Serialize};

use super::common::UserId;

/// A chat participant: identity plus what templates need to address them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: UserId,
    /// Display name (first name on Telegram).
    pub first_name: String,
    /// Handle without the leading @.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl ChatUser {
    pub fn new(id: u64, first_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            first_name: first_name.into(),
            username: None,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        let username = username.trim_start_matches('@');
        self.username = (!username.is_empty()).then(|| username.to_string());
        self
    }

    /// `@handle` when the user has one, otherwise the display name.
    pub fn handle(&self) -> String {
        self.username
            .as_ref()
            .map(|u| format!("@{}", u))
            .unwrap_or_else(|| self.first_name.clone())
    }
}
