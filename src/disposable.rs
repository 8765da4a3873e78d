//! The disposal capability cached values may expose.
//!
//! Mirrors `crates/resource`'s `Resource::cleanup` hook: a value stored in
//! a [`crate::cache::TtlCache`] may need to release a connection, cancel a
//! background task, or otherwise tear itself down when evicted. Types that
//! don't need this just accept the default no-op body.

use async_trait::async_trait;

use crate::error::PoolError;

/// Disposal capability for cached values.
///
/// Implemented on the client/credential types a caller stores in the pool.
/// The cache invokes `dispose` after removal — TTL expiry, LRU eviction,
/// explicit `delete`, or `clear` — never before. Disposal runs outside any
/// cache-internal lock; see `crate::cache::ttl_cache` for the eviction path.
///
/// A disposal failure is logged at warn level and swallowed by the cache
/// (`spec.md` §4.1, §7): it never propagates to a caller and never blocks
/// a subsequent operation on the same key.
#[async_trait]
pub trait Dispose: Send + Sync {
    /// Release any resources held by this value.
    ///
    /// The default implementation does nothing, for values with no
    /// disposable state (e.g. plain data credentials).
    async fn dispose(&self) -> Result<(), PoolError> {
        Ok(())
    }
}
