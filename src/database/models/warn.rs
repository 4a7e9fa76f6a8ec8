//! Warning counter model.

use serde::{Deserialize, Serialize};

/// Warning counter of one user in one chat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarnRecord {
    /// Active warnings. Zero after an escalation or an explicit clear.
    pub count: u32,
    /// Unix timestamp of the last change.
    #[serde(default)]
    pub updated_at: i64,
}

/// Result of a single warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarnOutcome {
    /// Count after this warning, before any reset.
    pub count: u32,
    /// The limit was reached and the counter was reset to zero.
    pub escalated: bool,
}

impl WarnRecord {
    /// A zero counter stamped now.
    pub fn cleared() -> Self {
        Self {
            count: 0,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Compute the next record for a new warning against `limit`.
    ///
    /// A limit of zero or below escalates on the first warning.
    pub fn next(&self, limit: i64) -> (Self, WarnOutcome) {
        let count = self.count.saturating_add(1);
        let escalated = limit <= 0 || i64::from(count) >= limit;
        let record = Self {
            count: if escalated { 0 } else { count },
            updated_at: chrono::Utc::now().timestamp(),
        };
        (record, WarnOutcome { count, escalated })
    }
}
