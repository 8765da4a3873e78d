//! The Auth-Request Adapter (`spec.md` §4.6).
//!
//! The only place a [`UserAssertion`] is accepted into the system.
//! Downstream components (`crate::cache::key`, `crate::credential`,
//! `crate::pool`) receive only the validated [`AuthContext`] this module
//! produces.

use crate::auth::request::{AssertionToken, AuthRequest, UserAssertion};
use crate::error::PoolError;
use crate::time::now_ms;

/// The validated, normalized internal form of an [`AuthRequest`].
///
/// Invariants (enforced by [`adapt`], never by callers directly): for
/// non-application modes, `tenant_id` and `user_object_id` are non-empty,
/// and `expires_at_ms` was strictly in the future at the moment of
/// validation.
#[derive(Debug, Clone)]
pub struct AuthContext {
    mode: &'static str,
    tenant_id: Option<String>,
    user_object_id: Option<String>,
    expires_at_ms: Option<i64>,
    token: Option<AssertionToken>,
}

impl AuthContext {
    /// The auth mode literal (`"application"` / `"delegated"` / `"composite"`).
    #[must_use]
    pub fn mode(&self) -> &'static str {
        self.mode
    }

    /// The validated tenant id, absent for `Application`.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// The validated user object id, absent for `Application`.
    #[must_use]
    pub fn user_object_id(&self) -> Option<&str> {
        self.user_object_id.as_deref()
    }

    /// The assertion's absolute expiry, epoch milliseconds.
    #[must_use]
    pub fn expires_at_ms(&self) -> Option<i64> {
        self.expires_at_ms
    }

    /// The bearer token, for constructing a delegated credential.
    #[must_use]
    pub fn token(&self) -> Option<&AssertionToken> {
        self.token.as_ref()
    }

    /// Whether this context carries a user assertion (`Delegated`/`Composite`).
    #[must_use]
    pub fn is_token_bound(&self) -> bool {
        self.expires_at_ms.is_some()
    }
}

/// Validate a raw [`AuthRequest`] into an [`AuthContext`].
///
/// # Errors
///
/// - [`PoolError::MissingTenant`] / [`PoolError::MissingUser`] if a
///   delegated/composite request carries an empty identifier.
/// - [`PoolError::TokenExpired`] if the assertion's `expires_at_ms` is at
///   or before the current time.
pub fn adapt(request: &AuthRequest) -> Result<AuthContext, PoolError> {
    match request {
        AuthRequest::Application => Ok(AuthContext {
            mode: "application",
            tenant_id: None,
            user_object_id: None,
            expires_at_ms: None,
            token: None,
        }),
        AuthRequest::Delegated(assertion) => adapt_token_bound("delegated", assertion),
        AuthRequest::Composite(assertion) => adapt_token_bound("composite", assertion),
    }
}

fn adapt_token_bound(
    mode: &'static str,
    assertion: &UserAssertion,
) -> Result<AuthContext, PoolError> {
    if assertion.tenant_id.is_empty() {
        return Err(PoolError::MissingTenant);
    }
    if assertion.user_object_id.is_empty() {
        return Err(PoolError::MissingUser);
    }

    let now = now_ms();
    if assertion.expires_at_ms <= now {
        return Err(PoolError::TokenExpired {
            expires_at_ms: assertion.expires_at_ms,
            now_ms: now,
        });
    }

    Ok(AuthContext {
        mode,
        tenant_id: Some(assertion.tenant_id.clone()),
        user_object_id: Some(assertion.user_object_id.clone()),
        expires_at_ms: Some(assertion.expires_at_ms),
        token: Some(assertion.token.clone()),
    })
}
