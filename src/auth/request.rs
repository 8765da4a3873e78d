//! The raw, caller-supplied auth request and its user-assertion payload.

use std::fmt;
use zeroize::Zeroize;

/// An opaque bearer token delegating a user's identity to this service.
///
/// Zeroized on drop so the raw bearer string never lingers in memory past
/// the call that needed it — the token-acquisition pipeline itself (JWKS
/// fetch, signature verification) is an external collaborator; this crate
/// only carries the already-verified result.
#[derive(Clone)]
pub struct AssertionToken(String);

impl AssertionToken {
    /// Wrap a raw bearer string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw bearer string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Drop for AssertionToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for AssertionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AssertionToken(<redacted>)")
    }
}

/// A verified user assertion: bearer token plus its verified claims.
///
/// Produced by a `TokenValidator` (external collaborator, see `spec.md`
/// §6) and handed to this crate already parsed — the adapter in
/// `crate::auth::context` is the only place that accepts one.
#[derive(Debug, Clone)]
pub struct UserAssertion {
    /// The opaque bearer token.
    pub token: AssertionToken,
    /// Verified subject / user id.
    pub user_object_id: String,
    /// Verified tenant id.
    pub tenant_id: String,
    /// Absolute expiry, epoch milliseconds.
    pub expires_at_ms: i64,
}

/// A raw, caller-supplied auth request — the tagged variant from `spec.md` §3.
#[derive(Debug, Clone)]
pub enum AuthRequest {
    /// No payload; represents the process's own identity.
    Application,
    /// Carries a user assertion; only a delegated credential may be derived.
    Delegated(UserAssertion),
    /// Carries a user assertion; the downstream factory may ask for either
    /// an application or a delegated credential. Keys identically to
    /// `Delegated` (see `spec.md` §9 design notes).
    Composite(UserAssertion),
}

impl AuthRequest {
    /// The auth mode literal used in cache-key construction.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Delegated(_) => "delegated",
            Self::Composite(_) => "composite",
        }
    }

    /// Borrow the user assertion, if this request carries one.
    #[must_use]
    pub fn assertion(&self) -> Option<&UserAssertion> {
        match self {
            Self::Application => None,
            Self::Delegated(a) | Self::Composite(a) => Some(a),
        }
    }
}
