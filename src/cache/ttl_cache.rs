//! The TTL Cache (`spec.md` §4.1) and, folded into it, the Single-Flight
//! Coordinator (`spec.md` §4.2).
//!
//! Built on `moka::future::Cache`, mirroring `crates/credential`'s
//! `manager::cache::CacheLayer`. Two refinements over that teacher code
//! make this generic enough for both the client cache and the credential
//! cache the spec calls for:
//!
//! - single-flight coalescing comes from `moka`'s own `try_get_with`,
//!   which already guarantees one in-flight initializer per key and lets
//!   every concurrent caller observe its result — this *is* the spec's
//!   Single-Flight Coordinator, not a layer bolted on top of it;
//! - per-entry sliding + absolute TTL is implemented via `moka::Expiry`,
//!   reading an optional absolute deadline stamped onto the stored value
//!   at construction time.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::Expiry;
use tracing::{debug, trace, warn};

use crate::disposable::Dispose;
use crate::error::PoolError;

/// Snapshot of a [`TtlCache`]'s current state (`spec.md` §4.1 `stats()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of cached entries.
    pub size: u64,
    /// Configured capacity bound.
    pub max_size: u64,
    /// Number of factory invocations currently in flight.
    pub pending_count: usize,
}

struct Entry<T> {
    value: Arc<T>,
    absolute_deadline: Option<Instant>,
}

// Manual impl: `moka::future::Cache<K, V>` requires `V: Clone` for `build`,
// `try_get_with`, `invalidate`, `contains_key`, and `entry_count`. A derived
// `Clone` would wrongly add a `T: Clone` bound; only the `Arc` and the
// deadline need cloning.
impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            absolute_deadline: self.absolute_deadline,
        }
    }
}

struct TtlExpiry {
    default_sliding_ttl: Duration,
}

impl<T: Send + Sync + 'static> Expiry<String, Entry<T>> for TtlExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry<T>,
        created_at: Instant,
    ) -> Option<Duration> {
        Some(effective_duration(
            self.default_sliding_ttl,
            value.absolute_deadline,
            created_at,
        ))
    }

    fn expire_after_read(
        &self,
        _key: &String,
        value: &Entry<T>,
        current_time: Instant,
        _current_duration: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        Some(effective_duration(
            self.default_sliding_ttl,
            value.absolute_deadline,
            current_time,
        ))
    }
}

/// Sliding TTL, shortened if it would cross an absolute deadline.
///
/// This is the min-of-both rule in `spec.md` §4.1: every access resets the
/// sliding component, but never past a fixed absolute deadline recorded at
/// construction — which is how `crate::pool::ClientPool` ties a cached
/// client's lifetime to its assertion's remaining validity without the
/// client living longer with every additional read.
fn effective_duration(
    sliding: Duration,
    absolute_deadline: Option<Instant>,
    now: Instant,
) -> Duration {
    match absolute_deadline {
        Some(deadline) => sliding.min(deadline.saturating_duration_since(now)),
        None => sliding,
    }
}

/// A bounded, disposal-aware TTL cache with built-in single-flight
/// coalescing (`spec.md` §4.1, §4.2).
pub struct TtlCache<T: Send + Sync + 'static> {
    cache: Cache<String, Entry<T>>,
    default_sliding_ttl: Duration,
    max_size: u64,
    pending: Arc<AtomicUsize>,
}

impl<T: Dispose + Send + Sync + 'static> TtlCache<T> {
    /// Create a cache with the given default sliding TTL and size bound.
    #[must_use]
    pub fn new(default_sliding_ttl: Duration, max_size: u64) -> Self {
        let pending = Arc::new(AtomicUsize::new(0));
        let cache = Cache::builder()
            .max_capacity(max_size)
            .expire_after(TtlExpiry {
                default_sliding_ttl,
            })
            .eviction_listener(|key: Arc<String>, entry: Entry<T>, cause| {
                let value = entry.value;
                tokio::spawn(async move {
                    trace!(key = %key, cause = ?cause, "evicting cache entry, running disposal");
                    if let Err(err) = value.dispose().await {
                        // Disposal errors are logged and swallowed (`spec.md` §4.1,
                        // §7): they must never propagate to a caller or block a
                        // subsequent operation on this key.
                        warn!(key = %key, cause = ?cause, error = %err, "disposal failed");
                    }
                });
            })
            .build();

        Self {
            cache,
            default_sliding_ttl,
            max_size,
            pending,
        }
    }

    /// Return the cached value for `key`, or construct it via `factory`.
    ///
    /// `custom_ttl_ms`, when `Some`, overrides this entry's absolute
    /// deadline (`created_at + custom_ttl_ms`), combined with the cache's
    /// default sliding TTL via `min`. A non-positive value makes the
    /// construction **uncacheable**: the factory still runs and its
    /// result is still returned, but nothing is stored — `spec.md` §4.1's
    /// "uncacheable shortcut".
    ///
    /// Concurrent calls for the same `key` coalesce onto a single factory
    /// invocation (`spec.md` §4.2): only one of them runs `factory`, and
    /// every other caller observes its outcome, success or failure alike.
    pub async fn get_or_create<F, Fut>(
        &self,
        key: &str,
        factory: F,
        custom_ttl_ms: Option<i64>,
    ) -> Result<Arc<T>, PoolError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, PoolError>>,
    {
        if let Some(ms) = custom_ttl_ms {
            if ms <= 0 {
                debug!(key = %key, "uncacheable custom ttl, invoking factory directly");
                let pending = self.pending.clone();
                pending.fetch_add(1, Ordering::SeqCst);
                trace!(key = %key, "pending count incremented (uncacheable path)");
                let _guard = scopeguard::guard(pending, |p| {
                    p.fetch_sub(1, Ordering::SeqCst);
                });
                let value = factory().await?;
                return Ok(Arc::new(value));
            }
        }

        let absolute_deadline =
            custom_ttl_ms.map(|ms| Instant::now() + Duration::from_millis(ms as u64));

        let was_present = self.cache.contains_key(key);
        if was_present {
            debug!(key = %key, "cache hit");
        } else {
            debug!(key = %key, "cache miss, invoking factory");
        }

        let pending = self.pending.clone();
        let log_key = key.to_string();
        let result = self
            .cache
            .try_get_with(key.to_string(), async move {
                pending.fetch_add(1, Ordering::SeqCst);
                trace!(key = %log_key, "pending count incremented");
                let _guard = scopeguard::guard(pending.clone(), |p| {
                    p.fetch_sub(1, Ordering::SeqCst);
                });
                let value = factory().await?;
                Ok::<_, PoolError>(Entry {
                    value: Arc::new(value),
                    absolute_deadline,
                })
            })
            .await;

        match result {
            Ok(entry) => Ok(entry.value),
            Err(shared_err) => match Arc::try_unwrap(shared_err) {
                Ok(err) => Err(err),
                Err(shared_err) => Err(PoolError::Internal {
                    message: format!("coalesced factory failure: {shared_err}"),
                }),
            },
        }
    }

    /// Remove and dispose the entry for `key`. Returns whether one existed.
    pub async fn delete(&self, key: &str) -> bool {
        let existed = self.cache.contains_key(key);
        self.cache.invalidate(key).await;
        existed
    }

    /// Remove and dispose every entry.
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    /// Snapshot of current size, capacity, and in-flight constructions.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.cache.entry_count(),
            max_size: self.max_size,
            pending_count: self.pending.load(Ordering::SeqCst),
        }
    }

    /// The default sliding TTL this cache was constructed with.
    #[must_use]
    pub fn default_sliding_ttl(&self) -> Duration {
        self.default_sliding_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;
    use tokio::sync::Barrier;

    #[derive(Debug, PartialEq, Eq)]
    struct Widget(u32);

    #[async_trait]
    impl Dispose for Widget {}

    #[tokio::test]
    async fn miss_then_hit_invokes_factory_once() {
        let cache: TtlCache<Widget> = TtlCache::new(Duration::from_secs(60), 100);
        let calls = Arc::new(AtomicU32::new(0));

        let make = |calls: Arc<AtomicU32>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, PoolError>(Widget(1))
        };

        let c1 = cache
            .get_or_create("k", || make(calls.clone()), None)
            .await
            .unwrap();
        let c2 = cache
            .get_or_create("k", || make(calls.clone()), None)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&c1, &c2));
    }

    #[tokio::test]
    async fn distinct_keys_are_isolated() {
        let cache: TtlCache<Widget> = TtlCache::new(Duration::from_secs(60), 100);
        let a = cache
            .get_or_create("a", || async { Ok(Widget(1)) }, None)
            .await
            .unwrap();
        let b = cache
            .get_or_create("b", || async { Ok(Widget(2)) }, None)
            .await
            .unwrap();
        assert_ne!(a.0, b.0);
    }

    #[tokio::test]
    async fn concurrent_callers_single_flight() {
        let cache: Arc<TtlCache<Widget>> = Arc::new(TtlCache::new(Duration::from_secs(60), 100));
        let calls = Arc::new(AtomicU32::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                cache
                    .get_or_create(
                        "shared",
                        || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok::<_, PoolError>(Widget(42))
                        },
                        None,
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for r in &results {
            assert!(Arc::ptr_eq(r, &results[0]));
        }
    }

    #[tokio::test]
    async fn factory_error_propagates_and_is_not_cached() {
        let cache: TtlCache<Widget> = TtlCache::new(Duration::from_secs(60), 100);

        let err = cache
            .get_or_create(
                "k",
                || async { Err::<Widget, _>(PoolError::Internal { message: "boom".into() }) },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PoolError::Internal { .. }));

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.pending_count, 0);
    }

    #[tokio::test]
    async fn non_positive_custom_ttl_is_uncacheable() {
        let cache: TtlCache<Widget> = TtlCache::new(Duration::from_secs(60), 100);
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            cache
                .get_or_create(
                    "k",
                    || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, PoolError>(Widget(1))
                    },
                    Some(0),
                )
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let cache: TtlCache<Widget> = TtlCache::new(Duration::from_secs(60), 100);
        cache
            .get_or_create("k", || async { Ok(Widget(1)) }, None)
            .await
            .unwrap();

        assert!(cache.delete("k").await);
        assert!(!cache.delete("k").await);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let cache: TtlCache<Widget> = TtlCache::new(Duration::from_secs(60), 100);
        cache
            .get_or_create("a", || async { Ok(Widget(1)) }, None)
            .await
            .unwrap();
        cache
            .get_or_create("b", || async { Ok(Widget(2)) }, None)
            .await
            .unwrap();

        cache.clear().await;
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn disposal_runs_on_explicit_delete() {
        struct Counting(Arc<AtomicU32>);

        #[async_trait]
        impl Dispose for Counting {
            async fn dispose(&self) -> Result<(), PoolError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let cache: TtlCache<Counting> = TtlCache::new(Duration::from_secs(60), 100);
        let disposed = Arc::new(AtomicU32::new(0));
        cache
            .get_or_create(
                "k",
                {
                    let disposed = disposed.clone();
                    || async move { Ok(Counting(disposed)) }
                },
                None,
            )
            .await
            .unwrap();

        cache.delete("k").await;
        cache.cache.run_pending_tasks().await;
        // Eviction listener spawns the dispose call; give it a tick to run.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn token_bound_ttl_is_not_extended_by_repeated_reads() {
        let cache: TtlCache<Widget> = TtlCache::new(Duration::from_secs(3600), 100);
        cache
            .get_or_create("k", || async { Ok(Widget(1)) }, Some(50))
            .await
            .unwrap();

        // Repeated reads within the absolute window should keep hitting.
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let hit = cache.get_or_create("k", || async { Ok(Widget(99)) }, None).await.unwrap();
            assert_eq!(hit.0, 1, "expected cached value, not a fresh construction");
        }

        // But the entry must not survive past its absolute deadline no
        // matter how often it was read in between.
        tokio::time::sleep(Duration::from_millis(80)).await;
        let calls = Arc::new(AtomicU32::new(0));
        let after = cache
            .get_or_create(
                "k",
                {
                    let calls = calls.clone();
                    || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, PoolError>(Widget(2))
                    }
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(after.0, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
