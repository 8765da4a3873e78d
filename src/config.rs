//! Configuration types consumed by the pool (`spec.md` §6).
//!
//! Loading these from environment variables or a centralized config store
//! is an external collaborator's job; this module only defines the typed
//! shape the core consumes and validates it once, at pool construction.
//! Configuration is resolved once and the pool never observes later
//! changes — mirrors `crates/resource/src/pool.rs`'s `PoolConfig::validate`.

use std::time::Duration;

use crate::error::PoolError;

/// `cache.*` configuration (`spec.md` §6 table).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheSection {
    /// Prefix for raw keys. Default `"client"`.
    pub key_prefix: String,
    /// Default client sliding TTL.
    #[serde(with = "humantime_serde")]
    pub client_cache_sliding_ttl: Duration,
    /// Bound on concurrent cached clients.
    pub client_cache_max_size: u64,
    /// Safety buffer subtracted from token lifetime.
    #[serde(with = "humantime_serde")]
    pub client_cache_buffer: Duration,
    /// Application credential sliding TTL.
    #[serde(with = "humantime_serde")]
    pub credential_cache_sliding_ttl: Duration,
    /// Bound on cached application credentials.
    pub credential_cache_max_size: u64,
    /// Hard expiry for application credentials.
    #[serde(with = "humantime_serde")]
    pub credential_cache_absolute_ttl: Duration,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            key_prefix: "client".to_string(),
            client_cache_sliding_ttl: Duration::from_secs(60),
            client_cache_max_size: 10_000,
            client_cache_buffer: Duration::from_secs(5),
            credential_cache_sliding_ttl: Duration::from_secs(300),
            credential_cache_max_size: 1_000,
            credential_cache_absolute_ttl: Duration::from_secs(3_600),
        }
    }
}

/// `auth.*` configuration (`spec.md` §6 table). Only the fields the core
/// itself passes through to the external credential strategies it is
/// handed; the strategies themselves are not part of this crate.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AuthSection {
    /// Selects the external application-credential strategy. Opaque to
    /// the core; forwarded to whichever `ApplicationStrategy` the caller
    /// constructs the pool with.
    pub application_strategy: Option<String>,
    /// Tenant id used by external credential strategies.
    pub tenant_id: Option<String>,
    /// Client id used by external credential strategies.
    pub client_id: Option<String>,
}

/// Top-level configuration for a [`crate::pool::ClientPool`].
#[derive(Debug, Clone, Default)]
pub struct PoolConfig {
    /// Cache-related settings.
    pub cache: CacheSection,
    /// Auth-related settings, opaque to the core beyond pass-through.
    pub auth: AuthSection,
}

impl PoolConfig {
    /// Validate configuration, returning [`PoolError::ConfigurationInvalid`]
    /// for contradictory or structurally invalid settings.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.cache.key_prefix.is_empty() {
            return Err(PoolError::configuration_invalid(
                "cache.keyPrefix must not be empty",
            ));
        }
        if self.cache.client_cache_max_size == 0 {
            return Err(PoolError::configuration_invalid(
                "cache.clientCacheMaxSize must be greater than 0",
            ));
        }
        if self.cache.credential_cache_max_size == 0 {
            return Err(PoolError::configuration_invalid(
                "cache.credentialCacheMaxSize must be greater than 0",
            ));
        }
        if self.cache.credential_cache_absolute_ttl.is_zero() {
            return Err(PoolError::configuration_invalid(
                "cache.credentialCacheAbsoluteTtl must be greater than 0",
            ));
        }
        Ok(())
    }
}
