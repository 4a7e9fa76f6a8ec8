//! Policy repository (config store) with hot caching.
//!
//! Policies are read on every message, so reads are served from a
//! version-tagged cache. Writes go through compare-and-swap on the
//! backing store: edits to one chat are serialized, edits to different
//! chats never wait on each other.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};
use crate::database::models::{ChatId, Policy};
use crate::database::store::{KvStore, MAX_CAS_ATTEMPTS, decode, encode, policy_key};
use crate::error::{ConfigError, EngineError, StoreError};

#[derive(Debug, Clone)]
struct CachedPolicy {
    version: u64,
    policy: Arc<Policy>,
}

/// Per-chat policy storage.
pub struct ConfigStore {
    store: Arc<dyn KvStore>,
    cache: TypedCache<ChatId, CachedPolicy>,
}

impl ConfigStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            cache: TypedCache::new("policies", CacheConfig::policy()),
        }
    }

    /// Get the chat policy, creating and storing the defaults on first use.
    pub async fn get(&self, chat: ChatId) -> Result<Arc<Policy>, StoreError> {
        if let Some(cached) = self.cache.get(&chat) {
            return Ok(cached.policy);
        }

        let (version, policy) = self.load_or_create(chat).await?;
        let policy = Arc::new(policy);
        self.remember(chat, version, policy.clone());
        Ok(policy)
    }

    /// Apply `mutator` to the chat policy and persist the result atomically.
    ///
    /// The mutator may run more than once if another writer of the same chat
    /// wins the race. If it (or validation) fails, nothing is written and
    /// the previous policy stays in effect.
    pub async fn update<F>(&self, chat: ChatId, mut mutator: F) -> Result<Arc<Policy>, EngineError>
    where
        F: FnMut(&mut Policy) -> Result<(), ConfigError>,
    {
        let key = policy_key(chat);

        for _ in 0..MAX_CAS_ATTEMPTS {
            let (expected, mut policy) = match self.store.get(&key).await? {
                Some(record) => (Some(record.version), decode::<Policy>(&key, record.value)?),
                None => (None, Policy::default()),
            };

            mutator(&mut policy)?;
            policy.validate()?;

            if self
                .store
                .compare_and_swap(&key, expected, encode(&key, &policy)?)
                .await?
            {
                let version = expected.map_or(1, |v| v + 1);
                let policy = Arc::new(policy);
                self.remember(chat, version, policy.clone());
                debug!("Updated policy for chat {} (version {})", chat, version);
                return Ok(policy);
            }

            debug!("Policy update for chat {} lost a race, retrying", chat);
        }

        Err(StoreError::Contention(key).into())
    }

    async fn load_or_create(&self, chat: ChatId) -> Result<(u64, Policy), StoreError> {
        let key = policy_key(chat);

        for _ in 0..MAX_CAS_ATTEMPTS {
            if let Some(record) = self.store.get(&key).await? {
                return Ok((record.version, decode(&key, record.value)?));
            }

            let policy = Policy::default();
            if self
                .store
                .compare_and_swap(&key, None, encode(&key, &policy)?)
                .await?
            {
                debug!("Created default policy for chat {}", chat);
                return Ok((1, policy));
            }
        }

        Err(StoreError::Contention(key))
    }

    fn remember(&self, chat: ChatId, version: u64, policy: Arc<Policy>) {
        self.cache
            .insert_if(chat, CachedPolicy { version, policy }, |current| current.version < version);
    }
}
