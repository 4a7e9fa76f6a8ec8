//! Antiflood (spam limiter).
//!
//! Sliding-window message counters per (chat, user), plus the background
//! sweeper that drops windows of users who went quiet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::database::models::{ChatId, UserId};

/// Length of the spam window.
pub const SPAM_WINDOW: Duration = Duration::from_secs(60);

type WindowKey = (ChatId, UserId);

/// Per-user message timestamps (in-memory).
///
/// Each key is locked through its map shard while it is updated, so calls
/// for one user are applied one at a time while unrelated users proceed in
/// parallel.
#[derive(Clone, Default)]
pub struct SpamLimiter {
    windows: Arc<DashMap<WindowKey, Vec<Instant>>>,
}

impl SpamLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message at `now` and check the window.
    ///
    /// Entries aged `window` or more are evicted (the window is
    /// `(now - window, now]`). Returns true when more than `max_per_window`
    /// messages remain.
    pub fn record_and_check(
        &self,
        chat: ChatId,
        user: UserId,
        now: Instant,
        window: Duration,
        max_per_window: u32,
    ) -> bool {
        let mut times = self.windows.entry((chat, user)).or_default();

        times.push(now);
        evict(&mut times, now, window);

        let exceeded = times.len() > max_per_window as usize;
        if exceeded {
            debug!(
                "User {} exceeded {} messages per {:?} in chat {} ({} in window)",
                user,
                max_per_window,
                window,
                chat,
                times.len()
            );
        }
        exceeded
    }

    /// Drop every key whose window is empty after eviction.
    ///
    /// Returns the number of keys removed.
    pub fn sweep(&self, now: Instant, window: Duration) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, times| {
            evict(times, now, window);
            !times.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    /// Forget a user's window.
    pub fn reset(&self, chat: ChatId, user: UserId) {
        self.windows.remove(&(chat, user));
    }

    /// Number of tracked (chat, user) keys.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn window_len(&self, chat: ChatId, user: UserId) -> usize {
        self.windows.get(&(chat, user)).map_or(0, |times| times.len())
    }
}

fn evict(times: &mut Vec<Instant>, now: Instant, window: Duration) {
    times.retain(|&t| now.saturating_duration_since(t) < window);
}

/// Periodically sweep idle windows until `shutdown` flips to true.
pub fn spawn_sweeper(
    limiter: SpamLimiter,
    every: Duration,
    window: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep(Instant::now(), window);
                    if removed > 0 {
                        debug!("Swept {} idle spam windows ({} left)", removed, limiter.len());
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Spam window sweeper stopped");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ChatId = ChatId(-100);
    const USER: UserId = UserId(42);

    #[test]
    fn test_exceeds_only_after_max_plus_one() {
        let limiter = SpamLimiter::new();
        let base = Instant::now();

        for i in 0..5 {
            let now = base + Duration::from_secs(i);
            assert!(!limiter.record_and_check(CHAT, USER, now, SPAM_WINDOW, 5));
        }
        assert!(limiter.record_and_check(CHAT, USER, base + Duration::from_secs(5), SPAM_WINDOW, 5));
    }

    #[test]
    fn test_entry_exactly_window_old_is_evicted() {
        let limiter = SpamLimiter::new();
        let base = Instant::now();

        assert!(!limiter.record_and_check(CHAT, USER, base, SPAM_WINDOW, 1));
        // At t=60 the t=0 entry is out, so only one message is counted.
        assert!(!limiter.record_and_check(CHAT, USER, base + SPAM_WINDOW, SPAM_WINDOW, 1));
        // Just inside the window both count.
        assert!(limiter.record_and_check(CHAT, USER, base + Duration::from_secs(61), SPAM_WINDOW, 1));
    }

    #[test]
    fn test_slow_sender_never_trips() {
        let limiter = SpamLimiter::new();
        let base = Instant::now();

        for i in 0..20 {
            let now = base + Duration::from_secs(i * 15);
            assert!(!limiter.record_and_check(CHAT, USER, now, SPAM_WINDOW, 5));
        }
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = SpamLimiter::new();
        let now = Instant::now();

        assert!(!limiter.record_and_check(CHAT, USER, now, SPAM_WINDOW, 1));
        assert!(!limiter.record_and_check(CHAT, UserId(7), now, SPAM_WINDOW, 1));
        assert!(!limiter.record_and_check(ChatId(1), USER, now, SPAM_WINDOW, 1));
        assert!(limiter.record_and_check(CHAT, USER, now, SPAM_WINDOW, 1));
        assert_eq!(limiter.len(), 3);
    }

    #[test]
    fn test_sweep_removes_idle_windows_only() {
        let limiter = SpamLimiter::new();
        let base = Instant::now();

        limiter.record_and_check(CHAT, USER, base, SPAM_WINDOW, 5);
        limiter.record_and_check(CHAT, UserId(7), base + Duration::from_secs(30), SPAM_WINDOW, 5);

        let removed = limiter.sweep(base + Duration::from_secs(60), SPAM_WINDOW);
        assert_eq!(removed, 1);
        assert_eq!(limiter.len(), 1);

        limiter.reset(CHAT, UserId(7));
        assert!(limiter.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_on_one_key_are_serialized() {
        const TASKS: usize = 32;
        const MAX: u32 = 5;

        let limiter = SpamLimiter::new();
        let now = Instant::now();

        let tasks: Vec<_> = (0..TASKS)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.record_and_check(CHAT, USER, now, SPAM_WINDOW, MAX) })
            })
            .collect();

        let mut allowed = 0;
        for task in tasks {
            if !task.await.unwrap() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, MAX as usize);
        assert_eq!(limiter.window_len(CHAT, USER), TASKS);
    }

    #[tokio::test]
    async fn test_sweeper_runs_and_stops() {
        let limiter = SpamLimiter::new();
        let (tx, rx) = watch::channel(false);
        let window = Duration::from_millis(10);

        limiter.record_and_check(CHAT, USER, Instant::now(), window, 5);
        let handle = spawn_sweeper(limiter.clone(), Duration::from_millis(20), window, rx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(limiter.is_empty());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
