//! Error taxonomy for the client pool.
//!
//! One variant per failure kind named by the pool's contract: validation
//! failures on the incoming auth request, credential-acquisition failures,
//! and the caller's own client-factory failures. Disposal errors never
//! reach this type — they are logged and swallowed at the cache layer.

use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Structured error surfaced by the pool, credential manager, and adapter.
#[derive(Error, Debug)]
pub enum PoolError {
    /// A delegated/composite auth request carried an empty `tenantId`.
    #[error("auth request is missing a tenant id")]
    MissingTenant,

    /// A delegated/composite auth request carried an empty `userObjectId`.
    #[error("auth request is missing a user object id")]
    MissingUser,

    /// The user assertion's `expiresAt` is at or before the current time.
    #[error("user assertion expired at {expires_at_ms}ms (now is {now_ms}ms)")]
    TokenExpired {
        /// The assertion's absolute expiry, epoch milliseconds.
        expires_at_ms: i64,
        /// The time the check was performed, epoch milliseconds.
        now_ms: i64,
    },

    /// A delegated credential was requested from an `Application` auth request.
    #[error("delegated credential requested from an application-only auth request")]
    AuthModeMismatch,

    /// Configuration was structurally invalid or internally contradictory.
    #[error("invalid configuration: {reason}")]
    ConfigurationInvalid {
        /// Human-readable description of the contradiction.
        reason: String,
    },

    /// The caller-supplied client factory failed.
    #[error("client factory failed: {message}")]
    FactoryFailure {
        /// Description of the failure.
        message: String,
        /// The inner cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An external credential strategy failed.
    #[error("credential acquisition failed: {message}")]
    CredentialFailure {
        /// Description of the failure.
        message: String,
        /// The inner cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An invariant the pool relies on was violated. Should not occur.
    #[error("internal invariant violated: {message}")]
    Internal {
        /// Description of the violated invariant.
        message: String,
    },
}

impl PoolError {
    /// Stable machine-readable code, independent of the `Display` message.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingTenant => "missing_tenant",
            Self::MissingUser => "missing_user",
            Self::TokenExpired { .. } => "token_expired",
            Self::AuthModeMismatch => "auth_mode_mismatch",
            Self::ConfigurationInvalid { .. } => "configuration_invalid",
            Self::FactoryFailure { .. } => "factory_failure",
            Self::CredentialFailure { .. } => "credential_failure",
            Self::Internal { .. } => "internal",
        }
    }

    /// Whether a caller can reasonably retry the same call unchanged.
    ///
    /// Validation failures and configuration errors are not retryable —
    /// the request itself must change. Factory/credential failures may be
    /// transient and are left to the caller's own retry policy.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FactoryFailure { .. } | Self::CredentialFailure { .. })
    }

    pub(crate) fn factory_failure<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::FactoryFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn credential_failure<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::CredentialFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn configuration_invalid(reason: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(PoolError::MissingTenant.code(), "missing_tenant");
        assert_eq!(PoolError::AuthModeMismatch.code(), "auth_mode_mismatch");
    }

    #[test]
    fn validation_errors_are_not_retryable() {
        assert!(!PoolError::MissingTenant.is_retryable());
        assert!(!PoolError::MissingUser.is_retryable());
        assert!(
            !PoolError::TokenExpired {
                expires_at_ms: 0,
                now_ms: 1,
            }
            .is_retryable()
        );
        assert!(!PoolError::AuthModeMismatch.is_retryable());
        assert!(!PoolError::configuration_invalid("bad").is_retryable());
    }

    #[test]
    fn factory_and_credential_failures_are_retryable() {
        let inner = std::io::Error::other("boom");
        assert!(PoolError::factory_failure("ctor failed", inner).is_retryable());
        let inner = std::io::Error::other("boom");
        assert!(PoolError::credential_failure("token exchange failed", inner).is_retryable());
    }

    #[test]
    fn display_includes_reason() {
        let err = PoolError::configuration_invalid("client_cache_max_size must be > 0");
        assert!(err.to_string().contains("client_cache_max_size"));
    }
}
