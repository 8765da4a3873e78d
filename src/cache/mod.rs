//! The cache layer: Key Builder (`spec.md` §4.3) plus the generic TTL
//! Cache / Single-Flight Coordinator (`spec.md` §4.1, §4.2) it keys into.
//! `crate::credential::manager` and `crate::pool` each instantiate a
//! [`TtlCache`] of their own.

mod key;
mod ttl_cache;

pub use key::{canonical_hash, KeyBuilder};
pub use ttl_cache::{CacheStats, TtlCache};
