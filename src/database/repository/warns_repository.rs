//! Warns repository (warning tracker).
//!
//! One counter record per (chat, user). Increment, escalation check and
//! reset happen in a single compare-and-swap, so two concurrent warnings
//! can never both observe the escalating count.

use std::sync::Arc;

use tracing::debug;

use crate::database::models::{ChatId, UserId, WarnOutcome, WarnRecord};
use crate::database::store::{KvStore, MAX_CAS_ATTEMPTS, decode, encode, warn_key};
use crate::error::StoreError;

/// Per-chat per-user warning counters.
pub struct WarningTracker {
    store: Arc<dyn KvStore>,
}

impl WarningTracker {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Add one warning. Reaching `limit` escalates and resets the counter.
    pub async fn warn(&self, chat: ChatId, user: UserId, limit: i64) -> Result<WarnOutcome, StoreError> {
        let key = warn_key(chat, user);

        for _ in 0..MAX_CAS_ATTEMPTS {
            let (expected, record) = match self.store.get(&key).await? {
                Some(current) => (Some(current.version), decode::<WarnRecord>(&key, current.value)?),
                None => (None, WarnRecord::default()),
            };

            let (next, outcome) = record.next(limit);
            if self
                .store
                .compare_and_swap(&key, expected, encode(&key, &next)?)
                .await?
            {
                debug!(
                    "Warned user {} in chat {} ({}/{}, escalated: {})",
                    user, chat, outcome.count, limit, outcome.escalated
                );
                return Ok(outcome);
            }
        }

        Err(StoreError::Contention(key))
    }

    /// Reset the counter to zero.
    ///
    /// The record is overwritten rather than removed so its version keeps
    /// growing and a writer holding a pre-clear version cannot swap in.
    pub async fn clear(&self, chat: ChatId, user: UserId) -> Result<(), StoreError> {
        let key = warn_key(chat, user);
        self.store.set(&key, encode(&key, &WarnRecord::cleared())?).await?;
        debug!("Cleared warnings of user {} in chat {}", user, chat);
        Ok(())
    }

    /// Current counter value.
    pub async fn count(&self, chat: ChatId, user: UserId) -> Result<u32, StoreError> {
        let key = warn_key(chat, user);
        match self.store.get(&key).await? {
            Some(record) => Ok(decode::<WarnRecord>(&key, record.value)?.count),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn tracker() -> WarningTracker {
        WarningTracker::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_counts_up_then_escalates_once() {
        let tracker = tracker();
        let (chat, user) = (ChatId(1), UserId(10));

        let first = tracker.warn(chat, user, 3).await.unwrap();
        assert_eq!(first, WarnOutcome { count: 1, escalated: false });
        let second = tracker.warn(chat, user, 3).await.unwrap();
        assert_eq!(second, WarnOutcome { count: 2, escalated: false });
        assert_eq!(tracker.count(chat, user).await.unwrap(), 2);

        let third = tracker.warn(chat, user, 3).await.unwrap();
        assert_eq!(third, WarnOutcome { count: 3, escalated: true });
        assert_eq!(tracker.count(chat, user).await.unwrap(), 0);

        // Counting starts over after the reset.
        let fourth = tracker.warn(chat, user, 3).await.unwrap();
        assert_eq!(fourth, WarnOutcome { count: 1, escalated: false });
    }

    #[tokio::test]
    async fn test_zero_limit_escalates_immediately() {
        let tracker = tracker();
        let outcome = tracker.warn(ChatId(1), UserId(1), 0).await.unwrap();
        assert_eq!(outcome, WarnOutcome { count: 1, escalated: true });
        assert_eq!(tracker.count(ChatId(1), UserId(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_and_key_isolation() {
        let tracker = tracker();
        tracker.warn(ChatId(1), UserId(1), 5).await.unwrap();
        tracker.warn(ChatId(1), UserId(2), 5).await.unwrap();
        tracker.warn(ChatId(2), UserId(1), 5).await.unwrap();

        tracker.clear(ChatId(1), UserId(1)).await.unwrap();

        assert_eq!(tracker.count(ChatId(1), UserId(1)).await.unwrap(), 0);
        assert_eq!(tracker.count(ChatId(1), UserId(2)).await.unwrap(), 1);
        assert_eq!(tracker.count(ChatId(2), UserId(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_version_cannot_undo_clear() {
        let backend = Arc::new(MemoryStore::new());
        let tracker = WarningTracker::new(backend.clone());
        let (chat, user) = (ChatId(3), UserId(30));
        let key = warn_key(chat, user);

        tracker.warn(chat, user, 5).await.unwrap();
        let stale = backend.get(&key).await.unwrap().unwrap().version;

        tracker.clear(chat, user).await.unwrap();
        tracker.warn(chat, user, 5).await.unwrap();

        let late_write = encode(&key, &WarnRecord { count: 4, updated_at: 0 }).unwrap();
        assert!(!backend.compare_and_swap(&key, Some(stale), late_write).await.unwrap());
        assert_eq!(tracker.count(chat, user).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_warns_escalate_exactly_once_per_limit() {
        let tracker = Arc::new(tracker());
        let (chat, user) = (ChatId(7), UserId(70));

        let tasks: Vec<_> = (0..30)
            .map(|_| {
                let tracker = tracker.clone();
                tokio::spawn(async move { tracker.warn(chat, user, 3).await.unwrap() })
            })
            .collect();

        let outcomes: Vec<WarnOutcome> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(outcomes.iter().filter(|o| o.escalated).count(), 10);
        assert!(outcomes.iter().filter(|o| o.escalated).all(|o| o.count == 3));
        assert_eq!(tracker.count(chat, user).await.unwrap(), 0);
    }
}
