//! client-pool - authenticated-credential-aware client pooling
//!
//! A client pool for services that make many short-lived calls against an
//! identity-provider-backed API. Given an auth request (application,
//! delegated, or composite identity) and a set of factory options, it
//! returns a ready-to-use client, reusing previously constructed instances
//! whenever safe, and guarantees that neither duplicate client
//! construction nor duplicate credential acquisition happens under
//! concurrent load.
//!
//! # What this crate owns
//!
//! - the two-level cache (clients, application credentials);
//! - token-aware TTL derivation, so a cached client never outlives the
//!   user assertion that authorized it;
//! - single-flight request coalescing, via [`cache::TtlCache`];
//! - deterministic cache-key construction from heterogeneous inputs.
//!
//! # What it does not own
//!
//! How credentials actually obtain tokens from an identity provider, JWKS
//! fetch and signature verification, and the concrete client a caller
//! wants are all external collaborators — see [`credential::ApplicationStrategy`],
//! [`credential::DelegatedStrategy`], and [`factory::ClientFactory`].
#![deny(unsafe_code)]
#![forbid(unsafe_code)]

/// Auth-request normalization — the Auth-Request Adapter.
pub mod auth;
/// The TTL cache / single-flight coordinator and the cache-key builder.
pub mod cache;
/// Pool configuration types.
pub mod config;
/// The Credential Manager and its external strategy contracts.
pub mod credential;
/// Disposal capability for cached values.
pub mod disposable;
/// Structured error taxonomy.
pub mod error;
/// Optional convenience wrapper composing extraction + resolution + pool.
pub mod facade;
/// User-supplied client factory contract and the credential-provider view.
pub mod factory;
/// The Client Pool: the crate's main entry point.
pub mod pool;
/// Millisecond-precision wall-clock time.
pub mod time;

pub use crate::error::{PoolError, Result};

/// Commonly-used types, re-exported for `use client_pool::prelude::*;`.
pub mod prelude {
    pub use crate::auth::{AssertionToken, AuthRequest, UserAssertion};
    pub use crate::config::{AuthSection, CacheSection, PoolConfig};
    pub use crate::credential::{ApplicationStrategy, CredentialKind, CredentialManager, DelegatedStrategy};
    pub use crate::disposable::Dispose;
    pub use crate::error::{PoolError, Result};
    pub use crate::factory::{ClientFactory, CredentialProvider};
    pub use crate::pool::ClientPool;
}
