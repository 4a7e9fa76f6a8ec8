//! Named moka cache with a compare-before-write helper.

use std::hash::Hash;
use std::sync::Arc;

use moka::ops::compute::Op;
use moka::sync::Cache;
use tracing::trace;

use super::CacheConfig;

/// A named, typed cache. Clones share the same storage.
#[derive(Clone)]
pub struct TypedCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<K, V>,
    name: Arc<str>,
}

impl<K, V> TypedCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<Arc<str>>, config: CacheConfig) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl);
        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        Self {
            inner: builder.build(),
            name: name.into(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let hit = self.inner.get(key);
        trace!("cache {}: {}", self.name, if hit.is_some() { "hit" } else { "miss" });
        hit
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    pub fn invalidate(&self, key: &K) {
        self.inner.invalidate(key);
    }

    /// Write `value` unless the current entry should be kept.
    ///
    /// `should_replace` sees the current value under the entry lock, so
    /// concurrent writers of one key cannot interleave check and write.
    pub fn insert_if<F>(&self, key: K, value: V, should_replace: F)
    where
        F: FnOnce(&V) -> bool,
    {
        self.inner.entry(key).and_compute_with(|current| {
            let replace = current.map_or(true, |entry| should_replace(entry.value()));
            if replace { Op::Put(value) } else { Op::Nop }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config() -> CacheConfig {
        CacheConfig::new(100, Duration::from_secs(60))
    }

    #[test]
    fn test_insert_if_keeps_newer_entry() {
        let cache: TypedCache<i64, u64> = TypedCache::new("versions", config());

        cache.insert_if(1, 5, |current| *current < 5);
        assert_eq!(cache.get(&1), Some(5));

        // An older value must not replace a newer one.
        cache.insert_if(1, 3, |current| *current < 3);
        assert_eq!(cache.get(&1), Some(5));

        cache.insert_if(1, 7, |current| *current < 7);
        assert_eq!(cache.get(&1), Some(7));
    }

    #[test]
    fn test_invalidate() {
        let cache: TypedCache<i64, String> = TypedCache::new("names", config());
        cache.insert(1, "a".to_string());
        cache.invalidate(&1);
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn test_presets() {
        assert_eq!(CacheConfig::roles().tti, Some(Duration::from_secs(120)));
        assert_eq!(CacheConfig::policy().tti, None);
    }
}
