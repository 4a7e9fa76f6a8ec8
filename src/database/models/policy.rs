//! Per-chat moderation policy.
//!
//! One record per chat, created lazily with the defaults below the first
//! time the chat is referenced.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A trigger substring and the reply it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoResponse {
    /// Lowercase trigger, matched as a substring.
    pub trigger: String,
    pub response: String,
}

/// Moderation policy of a single chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default = "default_true")]
    pub welcome_enabled: bool,

    /// Supports `{name}` and `{username}`.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    #[serde(default = "default_true")]
    pub goodbye_enabled: bool,

    #[serde(default = "default_goodbye_message")]
    pub goodbye_message: String,

    #[serde(default = "default_true")]
    pub antispam_enabled: bool,

    #[serde(default = "default_max_messages")]
    pub max_messages_per_minute: u32,

    #[serde(default)]
    pub delete_links: bool,

    #[serde(default)]
    pub delete_forwards: bool,

    /// Warnings before a ban.
    #[serde(default = "default_warn_limit")]
    pub warn_limit: u32,

    /// Lowercase substrings, kept in insertion order.
    #[serde(default = "default_banned_terms")]
    pub banned_terms: Vec<String>,

    /// Ordered: the earliest matching trigger wins.
    #[serde(default)]
    pub auto_responses: Vec<AutoResponse>,
}

fn default_true() -> bool {
    true
}

fn default_welcome_message() -> String {
    "Добро пожаловать в чат, {name}! 👋".to_string()
}

fn default_goodbye_message() -> String {
    "Пока, {name}! 👋".to_string()
}

fn default_max_messages() -> u32 {
    5
}

fn default_warn_limit() -> u32 {
    3
}

fn default_banned_terms() -> Vec<String> {
    vec!["спам".to_string(), "реклама".to_string()]
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            welcome_enabled: true,
            welcome_message: default_welcome_message(),
            goodbye_enabled: true,
            goodbye_message: default_goodbye_message(),
            antispam_enabled: true,
            max_messages_per_minute: default_max_messages(),
            delete_links: false,
            delete_forwards: false,
            warn_limit: default_warn_limit(),
            banned_terms: default_banned_terms(),
            auto_responses: Vec::new(),
        }
    }
}

/// A single operator edit to a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyChange {
    SetWelcomeEnabled(bool),
    SetGoodbyeEnabled(bool),
    SetAntispamEnabled(bool),
    SetDeleteLinks(bool),
    SetDeleteForwards(bool),
    SetWelcomeMessage(String),
    SetGoodbyeMessage(String),
    SetMaxMessagesPerMinute(i64),
    SetWarnLimit(i64),
    AddBannedTerm(String),
    RemoveBannedTerm(String),
    AddAutoResponse { trigger: String, response: String },
    RemoveAutoResponse(String),
}

impl Policy {
    /// Apply an operator edit. On error the policy is left untouched.
    pub fn apply(&mut self, change: &PolicyChange) -> Result<(), ConfigError> {
        match change {
            PolicyChange::SetWelcomeEnabled(on) => self.welcome_enabled = *on,
            PolicyChange::SetGoodbyeEnabled(on) => self.goodbye_enabled = *on,
            PolicyChange::SetAntispamEnabled(on) => self.antispam_enabled = *on,
            PolicyChange::SetDeleteLinks(on) => self.delete_links = *on,
            PolicyChange::SetDeleteForwards(on) => self.delete_forwards = *on,
            PolicyChange::SetWelcomeMessage(text) => {
                self.welcome_message = non_empty("welcome_message", text)?;
            }
            PolicyChange::SetGoodbyeMessage(text) => {
                self.goodbye_message = non_empty("goodbye_message", text)?;
            }
            PolicyChange::SetMaxMessagesPerMinute(n) => {
                self.max_messages_per_minute = positive("max_messages_per_minute", *n)?;
            }
            PolicyChange::SetWarnLimit(n) => {
                self.warn_limit = positive("warn_limit", *n)?;
            }
            PolicyChange::AddBannedTerm(term) => {
                let term = non_empty("banned_term", term)?.to_lowercase();
                if !self.banned_terms.contains(&term) {
                    self.banned_terms.push(term);
                }
            }
            PolicyChange::RemoveBannedTerm(term) => {
                let term = term.trim().to_lowercase();
                let before = self.banned_terms.len();
                self.banned_terms.retain(|t| *t != term);
                if self.banned_terms.len() == before {
                    return Err(ConfigError::invalid("banned_term", format!("'{}' is not banned", term)));
                }
            }
            PolicyChange::AddAutoResponse { trigger, response } => {
                let trigger = non_empty("trigger", trigger)?.to_lowercase();
                let response = non_empty("response", response)?;
                // Re-adding a trigger keeps its original position.
                match self.auto_responses.iter_mut().find(|r| r.trigger == trigger) {
                    Some(existing) => existing.response = response,
                    None => self.auto_responses.push(AutoResponse { trigger, response }),
                }
            }
            PolicyChange::RemoveAutoResponse(trigger) => {
                let trigger = trigger.trim().to_lowercase();
                let before = self.auto_responses.len();
                self.auto_responses.retain(|r| r.trigger != trigger);
                if self.auto_responses.len() == before {
                    return Err(ConfigError::invalid("trigger", format!("no response for '{}'", trigger)));
                }
            }
        }
        Ok(())
    }

    /// Check the record invariants. Used on every write.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_messages_per_minute == 0 {
            return Err(ConfigError::invalid("max_messages_per_minute", "must be greater than zero"));
        }
        if self.warn_limit == 0 {
            return Err(ConfigError::invalid("warn_limit", "must be greater than zero"));
        }
        if self.banned_terms.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::invalid("banned_term", "must not be empty"));
        }
        if self.auto_responses.iter().any(|r| r.trigger.trim().is_empty()) {
            return Err(ConfigError::invalid("trigger", "must not be empty"));
        }
        Ok(())
    }
}

fn non_empty(key: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::invalid(key, "must not be empty"));
    }
    Ok(value.to_string())
}

fn positive(key: &str, value: i64) -> Result<u32, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::invalid(key, "must be greater than zero"));
    }
    u32::try_from(value).map_err(|_| ConfigError::invalid(key, "value is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = Policy::default();
        assert!(policy.welcome_enabled);
        assert!(policy.goodbye_enabled);
        assert!(policy.antispam_enabled);
        assert!(!policy.delete_links);
        assert!(!policy.delete_forwards);
        assert_eq!(policy.max_messages_per_minute, 5);
        assert_eq!(policy.warn_limit, 3);
        assert_eq!(policy.banned_terms, vec!["спам", "реклама"]);
        assert!(policy.auto_responses.is_empty());
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let policy: Policy = serde_json::from_str(r#"{"warn_limit": 7}"#).unwrap();
        assert_eq!(policy.warn_limit, 7);
        assert_eq!(policy.max_messages_per_minute, 5);
        assert_eq!(policy.welcome_message, default_welcome_message());
    }

    #[test]
    fn test_rejects_non_positive_limits() {
        let mut policy = Policy::default();
        assert!(policy.apply(&PolicyChange::SetWarnLimit(0)).is_err());
        assert!(policy.apply(&PolicyChange::SetMaxMessagesPerMinute(-3)).is_err());
        assert_eq!(policy, Policy::default());

        policy.apply(&PolicyChange::SetWarnLimit(10)).unwrap();
        assert_eq!(policy.warn_limit, 10);
    }

    #[test]
    fn test_banned_terms_are_normalized() {
        let mut policy = Policy::default();
        policy.apply(&PolicyChange::AddBannedTerm("  Casino ".to_string())).unwrap();
        policy.apply(&PolicyChange::AddBannedTerm("casino".to_string())).unwrap();
        assert_eq!(policy.banned_terms, vec!["спам", "реклама", "casino"]);

        policy.apply(&PolicyChange::RemoveBannedTerm("CASINO".to_string())).unwrap();
        assert!(!policy.banned_terms.contains(&"casino".to_string()));
        assert!(policy.apply(&PolicyChange::RemoveBannedTerm("casino".to_string())).is_err());
        assert!(policy.apply(&PolicyChange::AddBannedTerm("   ".to_string())).is_err());
    }

    #[test]
    fn test_readding_trigger_keeps_position() {
        let mut policy = Policy::default();
        for (trigger, response) in [("hello", "hi"), ("rules", "see pinned")] {
            policy
                .apply(&PolicyChange::AddAutoResponse {
                    trigger: trigger.to_string(),
                    response: response.to_string(),
                })
                .unwrap();
        }
        policy
            .apply(&PolicyChange::AddAutoResponse {
                trigger: "HELLO".to_string(),
                response: "hey there".to_string(),
            })
            .unwrap();

        assert_eq!(policy.auto_responses.len(), 2);
        assert_eq!(policy.auto_responses[0].trigger, "hello");
        assert_eq!(policy.auto_responses[0].response, "hey there");

        policy.apply(&PolicyChange::RemoveAutoResponse("hello".to_string())).unwrap();
        assert_eq!(policy.auto_responses[0].trigger, "rules");
    }
}
