//! External collaborator contracts consumed by [`super::manager::CredentialManager`]
//! (`spec.md` §6 "Credential strategy interface").
//!
//! These traits are the seam between this crate's caching/coalescing core
//! and whatever actually talks to an identity provider — concretely out of
//! scope here, same as `crates/resource`'s `Resource` trait leaves "how a
//! connection is opened" to its caller.

use async_trait::async_trait;

use crate::auth::UserAssertion;
use crate::error::PoolError;

/// Constructs the process's own, reusable identity. Cached by
/// [`super::manager::CredentialManager`].
#[async_trait]
pub trait ApplicationStrategy: Send + Sync {
    /// The credential type this strategy produces.
    type Credential: Send + Sync + 'static;

    /// Acquire a fresh application credential.
    async fn create(&self) -> Result<Self::Credential, PoolError>;
}

/// Constructs a credential bound to a single user assertion. Never cached —
/// delegated credentials must not outlive the assertion they came from.
#[async_trait]
pub trait DelegatedStrategy: Send + Sync {
    /// The credential type this strategy produces.
    type Credential: Send + Sync + 'static;

    /// Acquire a credential delegated from `assertion`.
    ///
    /// Implementers should perform the belt-and-braces expiry check
    /// `spec.md` §6 describes and return [`PoolError::TokenExpired`] if the
    /// assertion has since expired, even though callers in this crate
    /// already filter expired assertions before reaching a strategy.
    async fn create(&self, assertion: &UserAssertion) -> Result<Self::Credential, PoolError>;
}

/// In-memory stub strategies for this crate's own tests (`spec.md` §6
/// external collaborators, stood in for the way `crates/credential`'s
/// `test-util` feature ships a `StaticKeyProvider`).
#[cfg(any(test, feature = "test-util"))]
pub mod test_util {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::{ApplicationStrategy, DelegatedStrategy};
    use crate::auth::UserAssertion;
    use crate::disposable::Dispose;
    use crate::error::PoolError;
    use async_trait::async_trait;

    /// A stub credential carrying a label and a construction counter's
    /// value at the moment it was built, useful for asserting "constructed
    /// exactly once" in tests.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StaticCredential {
        pub label: String,
        pub sequence: u32,
    }

    #[async_trait]
    impl Dispose for StaticCredential {}

    /// Always succeeds, counting how many times it was invoked.
    pub struct CountingApplicationStrategy {
        calls: Arc<AtomicU32>,
    }

    impl CountingApplicationStrategy {
        #[must_use]
        pub fn new() -> Self {
            Self {
                calls: Arc::new(AtomicU32::new(0)),
            }
        }

        #[must_use]
        pub fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Default for CountingApplicationStrategy {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ApplicationStrategy for CountingApplicationStrategy {
        type Credential = StaticCredential;

        async fn create(&self) -> Result<Self::Credential, PoolError> {
            let sequence = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(StaticCredential {
                label: "application".to_string(),
                sequence,
            })
        }
    }

    /// Always succeeds, counting how many times it was invoked.
    pub struct CountingDelegatedStrategy {
        calls: Arc<AtomicU32>,
    }

    impl CountingDelegatedStrategy {
        #[must_use]
        pub fn new() -> Self {
            Self {
                calls: Arc::new(AtomicU32::new(0)),
            }
        }

        #[must_use]
        pub fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Default for CountingDelegatedStrategy {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl DelegatedStrategy for CountingDelegatedStrategy {
        type Credential = StaticCredential;

        async fn create(&self, assertion: &UserAssertion) -> Result<Self::Credential, PoolError> {
            let sequence = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(StaticCredential {
                label: format!("delegated:{}", assertion.user_object_id),
                sequence,
            })
        }
    }
}
