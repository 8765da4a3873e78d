//! The Request-Aware Facade (`spec.md` §4.7) — an optional convenience
//! wrapper composing extraction, auth-request resolution, and the pool.

use std::sync::Arc;

use serde_json::Value;

use crate::auth::{AuthRequest, UserAssertion};
use crate::credential::{ApplicationStrategy, CredentialManager, DelegatedStrategy};
use crate::disposable::Dispose;
use crate::error::PoolError;
use crate::factory::ClientFactory;
use crate::pool::{BoundCredentialProvider, ClientPool};

/// Pulls an optional user assertion and optional factory options out of an
/// arbitrary, transport-specific request type `R`.
///
/// **Contract.** Must be pure with respect to `R` — no I/O, no hidden
/// state. If `R` carries something assertion-shaped but malformed, return
/// `None` for the assertion rather than a partially-populated one; this
/// crate's [`crate::auth::adapt`] is the only place partial assertions are
/// allowed to surface as structured errors instead of silent fallback.
pub trait Extractor<R>: Send + Sync {
    /// Pull `(assertion, options)` out of `request`.
    fn extract(&self, request: &R) -> (Option<UserAssertion>, Option<Value>);
}

/// Maps an optional extracted assertion to the [`AuthRequest`] variant the
/// pool should see. Deciding between `Delegated` and `Composite` for a
/// present assertion is a caller policy choice this crate does not make.
pub trait Resolver: Send + Sync {
    /// Resolve `assertion` into the auth request the pool will validate.
    fn resolve(&self, assertion: Option<UserAssertion>) -> AuthRequest;
}

/// Composes `extract -> resolve -> pool` for a caller request type `R`
/// (`spec.md` §4.7).
pub struct RequestAwareFacade<C, AS, DS, F, E, Rs>
where
    C: Dispose + Send + Sync + 'static,
    AS: ApplicationStrategy<Credential = C>,
    DS: DelegatedStrategy<Credential = C>,
    F: ClientFactory<Credentials = BoundCredentialProvider<C, AS, DS>>,
    F::Client: Dispose + Send + Sync + 'static,
{
    pool: ClientPool<C, AS, DS, F>,
    extractor: E,
    resolver: Rs,
}

impl<C, AS, DS, F, E, Rs> RequestAwareFacade<C, AS, DS, F, E, Rs>
where
    C: Dispose + Send + Sync + 'static,
    AS: ApplicationStrategy<Credential = C>,
    DS: DelegatedStrategy<Credential = C>,
    F: ClientFactory<Credentials = BoundCredentialProvider<C, AS, DS>>,
    F::Client: Dispose + Send + Sync + 'static,
{
    /// Wrap an already-constructed pool with an extractor and a resolver.
    #[must_use]
    pub fn new(pool: ClientPool<C, AS, DS, F>, extractor: E, resolver: Rs) -> Self {
        Self {
            pool,
            extractor,
            resolver,
        }
    }

    /// Extract, resolve, and delegate to [`ClientPool::get_client`].
    pub async fn get_client<R>(&self, request: &R) -> Result<Arc<F::Client>, PoolError>
    where
        E: Extractor<R>,
    {
        let (assertion, options) = self.extractor.extract(request);
        let auth_request = self.resolver.resolve(assertion);
        self.pool.get_client(&auth_request, options.as_ref()).await
    }

    /// Extract, resolve, and delegate to [`ClientPool::invalidate_client_cache`].
    pub async fn invalidate_client_cache<R>(&self, request: &R) -> Result<bool, PoolError>
    where
        E: Extractor<R>,
    {
        let (assertion, options) = self.extractor.extract(request);
        let auth_request = self.resolver.resolve(assertion);
        self.pool
            .invalidate_client_cache(&auth_request, options.as_ref())
            .await
    }

    /// The credential manager the wrapped pool was built with, for callers
    /// that need direct credential access outside the client path.
    #[must_use]
    pub fn credential_manager(&self) -> &Arc<CredentialManager<C, AS, DS>> {
        self.pool.credential_manager()
    }
}
