//! The Credential Manager (`spec.md` §4.4).

use std::sync::Arc;

use crate::auth::{AuthContext, AuthRequest};
use crate::cache::TtlCache;
use crate::config::CacheSection;
use crate::credential::strategy::{ApplicationStrategy, DelegatedStrategy};
use crate::disposable::Dispose;
use crate::error::PoolError;
use crate::time::now_ms;

/// Which kind of credential a caller is asking for (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// The process's own, reusable identity.
    Application,
    /// A credential bound to one user assertion.
    Delegated,
}

/// Caches application credentials; constructs delegated credentials fresh
/// on every call (`spec.md` §4.4).
///
/// Both strategies produce the same credential type `C`, so a caller can
/// treat the result uniformly regardless of which path served it.
pub struct CredentialManager<C, AS, DS>
where
    C: Dispose + Send + Sync + 'static,
    AS: ApplicationStrategy<Credential = C>,
    DS: DelegatedStrategy<Credential = C>,
{
    application_cache: TtlCache<C>,
    application_strategy: AS,
    delegated_strategy: DS,
    application_absolute_ttl_ms: i64,
}

impl<C, AS, DS> CredentialManager<C, AS, DS>
where
    C: Dispose + Send + Sync + 'static,
    AS: ApplicationStrategy<Credential = C>,
    DS: DelegatedStrategy<Credential = C>,
{
    /// Construct a manager from the resolved cache configuration and the
    /// two external strategies.
    #[must_use]
    pub fn new(cache_config: &CacheSection, application_strategy: AS, delegated_strategy: DS) -> Self {
        Self {
            application_cache: TtlCache::new(
                cache_config.credential_cache_sliding_ttl,
                cache_config.credential_cache_max_size,
            ),
            application_strategy,
            delegated_strategy,
            application_absolute_ttl_ms: cache_config.credential_cache_absolute_ttl.as_millis() as i64,
        }
    }

    /// Fetch (or construct) the credential `kind` asks for, given the
    /// already-validated auth context behind `request`.
    ///
    /// # Errors
    ///
    /// - [`PoolError::AuthModeMismatch`] if `kind` is [`CredentialKind::Delegated`]
    ///   but `request` carries no user assertion.
    /// - [`PoolError::TokenExpired`] if the assertion has expired since
    ///   [`crate::auth::adapt`] validated it (a defensive re-check).
    /// - [`PoolError::CredentialFailure`] wrapping whatever the strategy raised.
    pub async fn get_credential(
        &self,
        request: &AuthRequest,
        ctx: &AuthContext,
        kind: CredentialKind,
    ) -> Result<Arc<C>, PoolError> {
        match kind {
            CredentialKind::Application => self.get_application_credential().await,
            CredentialKind::Delegated => self.get_delegated_credential(request, ctx).await,
        }
    }

    async fn get_application_credential(&self) -> Result<Arc<C>, PoolError> {
        let strategy = &self.application_strategy;
        // `spec.md` §4.4: the default sliding TTL applies, but the entry must
        // also never outlive `cache.credentialCacheAbsoluteTtl` — so every
        // entry carries a hard deadline, not just a sliding one.
        self.application_cache
            .get_or_create(
                "application",
                || strategy.create(),
                Some(self.application_absolute_ttl_ms),
            )
            .await
    }

    async fn get_delegated_credential(
        &self,
        request: &AuthRequest,
        ctx: &AuthContext,
    ) -> Result<Arc<C>, PoolError> {
        let assertion = request.assertion().ok_or(PoolError::AuthModeMismatch)?;

        if ctx.expires_at_ms().map(|e| e <= now_ms()).unwrap_or(true) {
            return Err(PoolError::TokenExpired {
                expires_at_ms: assertion.expires_at_ms,
                now_ms: now_ms(),
            });
        }

        let credential = self.delegated_strategy.create(assertion).await?;
        Ok(Arc::new(credential))
    }

    /// Current size/capacity/pending-count of the application-credential cache.
    #[must_use]
    pub fn application_cache_stats(&self) -> crate::cache::CacheStats {
        self.application_cache.stats()
    }
}
