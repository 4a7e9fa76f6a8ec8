//! Error types for the moderation engine.

/// Top-level engine error.
///
/// None of these are fatal to the process; a failure for one chat or user
/// is reported and the next event is processed normally.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A non-admin attempted an administrative action.
    #[error("Requester is not allowed to perform this action")]
    Unauthorized,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Failure reported by the chat transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The bot lacks the rights for the call (e.g. not an admin).
    #[error("Missing permission: {0}")]
    Forbidden(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Transport request failed: {0}")]
    Other(String),
}

/// Rejected configuration value. The prior policy is retained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Key-value backend failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Failed to encode or decode record {key}: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A compare-and-swap loop kept losing races.
    #[error("Too much contention on key {0}")]
    Contention(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
