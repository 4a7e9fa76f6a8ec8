//! Key-value store abstraction.
//!
//! Every piece of persisted engine state is one JSON record under an
//! opaque string key. Writers that need atomic read-modify-write use
//! `compare_and_swap` against the record version.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::models::{ChatId, UserId};
use crate::error::StoreError;

/// A stored record and its version.
///
/// Versions start at 1 and grow by one on every write.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub version: u64,
    pub value: Value,
}

/// Swappable persistence backend.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError>;

    /// Unconditional write.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Write `value` only if the stored version equals `expected`
    /// (`None` = the key must not exist). Returns whether the write happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<u64>,
        value: Value,
    ) -> Result<bool, StoreError>;
}

/// Upper bound on compare-and-swap retries before giving up.
pub const MAX_CAS_ATTEMPTS: usize = 64;

pub fn policy_key(chat: ChatId) -> String {
    format!("policy:{}", chat)
}

pub fn warn_key(chat: ChatId, user: UserId) -> String {
    format!("warn:{}:{}", chat, user)
}

pub fn encode<T: Serialize>(key: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Codec {
        key: key.to_string(),
        source,
    })
}

pub fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|source| StoreError::Codec {
        key: key.to_string(),
        source,
    })
}
