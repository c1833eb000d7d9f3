//! The cache structure: TTL-gated entries behind an `RwLock`, with per-key
//! async guards coalescing concurrent resolver runs.
//!
//! The entry map lock is never held across an `.await`; resolver execution
//! happens outside it, serialized per key by a separate guard map.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CacheError, CacheResult};

/// TTL and capacity settings.
#[derive(Clone, Copy, Debug)]
pub struct CacheConfig {
    /// Time a value stays fresh, measured from last write.
    pub ttl: Duration,
    /// Optional entry bound; exceeding it evicts least-recently-used entries.
    pub capacity: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            capacity: None,
        }
    }
}

/// Observability counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

struct Entry<T> {
    value: T,
    written_at: Instant,
    last_used: u64,
}

struct CacheState<T> {
    entries: HashMap<String, Entry<T>>,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl<T> Default for CacheState<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            tick: 0,
            hits: 0,
            misses: 0,
        }
    }
}

/// A bounded, TTL-based cache with lookup-on-miss.
pub struct EntityCache<T> {
    config: CacheConfig,
    state: RwLock<CacheState<T>>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<T: Clone> EntityCache<T> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CacheState::default()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Cached value if present and unexpired; otherwise run `resolver`,
    /// store its result, and return it. Resolver failure surfaces as
    /// [`CacheError::NotFound`] carrying the key and cause.
    ///
    /// Concurrent callers missing on the same key serialize on a per-key
    /// guard and re-check the cache before fetching, so at most one
    /// upstream fetch is in flight per key.
    pub async fn get_or_resolve<F, Fut, E>(&self, key: &str, resolver: F) -> CacheResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if let Some(value) = self.lookup(key, true)? {
            return Ok(value);
        }

        let guard = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _held = guard.lock().await;

        // A coalesced peer may have resolved while we waited on the guard.
        if let Some(value) = self.lookup(key, false)? {
            return Ok(value);
        }

        // The in-flight entry outlives the insert: a caller arriving after
        // the entry is gone must find the value already cached.
        let result = match resolver().await {
            Ok(value) => {
                self.insert(key, value.clone())?;
                Ok(value)
            }
            Err(source) => {
                debug!(key, "cache resolver failed");
                Err(CacheError::NotFound {
                    key: key.to_string(),
                    source: Box::new(source),
                })
            }
        };
        {
            let mut inflight = self.inflight.lock().await;
            inflight.remove(key);
        }
        result
    }

    /// Unconditional upsert; resets the TTL clock for `key`.
    pub fn insert(&self, key: &str, value: T) -> CacheResult<()> {
        let mut state = self.state.write().map_err(|_| CacheError::Poisoned)?;
        state.tick += 1;
        let tick = state.tick;
        state.entries.insert(
            key.to_string(),
            Entry {
                value,
                written_at: Instant::now(),
                last_used: tick,
            },
        );
        if let Some(capacity) = self.config.capacity {
            while state.entries.len() > capacity {
                let coldest = state
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(k, _)| k.clone());
                match coldest {
                    Some(k) => {
                        state.entries.remove(&k);
                        debug!(key = %k, "evicted least-recently-used entry");
                    }
                    None => break,
                }
            }
        }
        Ok(())
    }

    /// Returns `true` if `key` is cached and unexpired.
    pub fn contains(&self, key: &str) -> bool {
        let state = match self.state.read() {
            Ok(state) => state,
            Err(_) => return false,
        };
        state
            .entries
            .get(key)
            .map(|entry| entry.written_at.elapsed() < self.config.ttl)
            .unwrap_or(false)
    }

    /// Remove `key`; returns `true` if it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.state
            .write()
            .map(|mut state| state.entries.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.write() {
            state.entries.clear();
        }
    }

    /// Current size and hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        self.state
            .read()
            .map(|state| CacheStats {
                size: state.entries.len(),
                hits: state.hits,
                misses: state.misses,
            })
            .unwrap_or_default()
    }

    /// TTL-aware lookup. Expired entries are dropped on access. When
    /// `count` is set the access is recorded in the hit/miss counters.
    fn lookup(&self, key: &str, count: bool) -> CacheResult<Option<T>> {
        let mut state = self.state.write().map_err(|_| CacheError::Poisoned)?;
        state.tick += 1;
        let tick = state.tick;
        let fresh = match state.entries.get_mut(key) {
            Some(entry) if entry.written_at.elapsed() < self.config.ttl => {
                entry.last_used = tick;
                Some(entry.value.clone())
            }
            Some(_) => {
                state.entries.remove(key);
                None
            }
            None => None,
        };
        if count {
            match fresh {
                Some(_) => state.hits += 1,
                None => state.misses += 1,
            }
        }
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache(ttl_ms: u64, capacity: Option<usize>) -> EntityCache<String> {
        EntityCache::new(CacheConfig {
            ttl: Duration::from_millis(ttl_ms),
            capacity,
        })
    }

    #[tokio::test]
    async fn miss_resolves_then_hits() {
        let cache = cache(10_000, None);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_resolve("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>("v".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "v");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test]
    async fn expired_value_triggers_resolver_again() {
        let cache = cache(20, None);
        let calls = AtomicUsize::new(0);
        let resolve = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>("v".to_string())
        };

        cache.get_or_resolve("k", resolve).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.get_or_resolve("k", resolve).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn resolver_failure_reports_not_found_with_key() {
        let cache: EntityCache<String> = cache(10_000, None);
        let err = cache
            .get_or_resolve("missing", || async {
                Err::<String, _>(std::io::Error::new(std::io::ErrorKind::Other, "gone"))
            })
            .await
            .unwrap_err();
        match err {
            CacheError::NotFound { key, .. } => assert_eq!(key, "missing"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!cache.contains("missing"));
    }

    #[tokio::test]
    async fn concurrent_misses_fetch_once() {
        let cache = Arc::new(cache(10_000, None));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_resolve("k", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok::<_, Infallible>("v".to_string())
                    })
                    .await
                    .unwrap()
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), "v");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn caller_arriving_at_resolution_time_still_coalesces() {
        let cache = Arc::new(cache(10_000, None));
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(tokio::sync::Notify::new());

        let leader = {
            let cache = cache.clone();
            let calls = calls.clone();
            let started = started.clone();
            tokio::spawn(async move {
                cache
                    .get_or_resolve("k", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        started.notify_one();
                        tokio::task::yield_now().await;
                        Ok::<_, Infallible>("v".to_string())
                    })
                    .await
                    .unwrap()
            })
        };

        // Race the tail end of the leader's fetch: the follower must either
        // wait on the in-flight guard or see the stored value, never fetch.
        started.notified().await;
        let value = cache
            .get_or_resolve("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>("follower".to_string())
            })
            .await
            .unwrap();

        assert_eq!(value, "v");
        assert_eq!(leader.await.unwrap(), "v");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let cache = cache(10_000, Some(2));
        cache.insert("a", "1".into()).unwrap();
        cache.insert("b", "2".into()).unwrap();

        // Touch `a` so `b` becomes the coldest entry.
        cache
            .get_or_resolve("a", || async { Ok::<_, Infallible>(String::new()) })
            .await
            .unwrap();
        cache.insert("c", "3".into()).unwrap();

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().size, 2);
    }

    #[tokio::test]
    async fn insert_resets_ttl() {
        let cache = cache(30, None);
        cache.insert("k", "v1".into()).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.insert("k", "v2".into()).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        // 40ms after first write but only 20ms after the refresh.
        assert!(cache.contains("k"));
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let cache = cache(10_000, None);
        cache.insert("k", "v".into()).unwrap();
        assert!(cache.remove("k"));
        assert!(!cache.remove("k"));

        cache.insert("x", "1".into()).unwrap();
        cache.insert("y", "2".into()).unwrap();
        cache.clear();
        assert_eq!(cache.stats().size, 0);
    }
}
