//! In-memory key-value store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;

use super::store::{KvStore, Versioned};
use crate::error::StoreError;

/// Process-local store backed by a sharded map.
///
/// Each key is guarded by its shard lock, so compare-and-swap on one key
/// never blocks writers of unrelated keys in other shards.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Versioned>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut e) => {
                let version = e.get().version + 1;
                e.insert(Versioned { version, value });
            }
            Entry::Vacant(e) => {
                e.insert(Versioned { version: 1, value });
            }
        }
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<u64>,
        value: Value,
    ) -> Result<bool, StoreError> {
        let swapped = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut e) => {
                let current = e.get().version;
                if expected == Some(current) {
                    e.insert(Versioned {
                        version: current + 1,
                        value,
                    });
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(e) => {
                if expected.is_none() {
                    e.insert(Versioned { version: 1, value });
                    true
                } else {
                    false
                }
            }
        };
        Ok(swapped)
    }
}
