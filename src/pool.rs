//! The Client Pool (`spec.md` §4.5) — the crate's main entry point.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::{adapt, AuthContext, AuthRequest};
use crate::cache::{CacheStats, KeyBuilder, TtlCache};
use crate::config::PoolConfig;
use crate::credential::{ApplicationStrategy, CredentialKind, CredentialManager, DelegatedStrategy};
use crate::disposable::Dispose;
use crate::error::PoolError;
use crate::factory::{ClientFactory, CredentialProvider};
use crate::time::now_ms;

/// The credential-provider view handed to a [`ClientFactory`]
/// (`spec.md` §4.5 step 5): defers to the [`CredentialManager`] with the
/// auth request that triggered this factory invocation already bound in.
pub struct BoundCredentialProvider<C, AS, DS>
where
    C: Dispose + Send + Sync + 'static,
    AS: ApplicationStrategy<Credential = C>,
    DS: DelegatedStrategy<Credential = C>,
{
    manager: Arc<CredentialManager<C, AS, DS>>,
    request: AuthRequest,
    ctx: AuthContext,
}

#[async_trait]
impl<C, AS, DS> CredentialProvider for BoundCredentialProvider<C, AS, DS>
where
    C: Dispose + Send + Sync + 'static,
    AS: ApplicationStrategy<Credential = C>,
    DS: DelegatedStrategy<Credential = C>,
{
    type Credential = C;

    async fn get_credential(&self, kind: CredentialKind) -> Result<Arc<C>, PoolError> {
        self.manager
            .get_credential(&self.request, &self.ctx, kind)
            .await
    }
}

/// Ties client lifetime to credential validity and deduplicates concurrent
/// construction of the same (auth context, options) pair (`spec.md` §4.5).
pub struct ClientPool<C, AS, DS, F>
where
    C: Dispose + Send + Sync + 'static,
    AS: ApplicationStrategy<Credential = C>,
    DS: DelegatedStrategy<Credential = C>,
    F: ClientFactory<Credentials = BoundCredentialProvider<C, AS, DS>>,
    F::Client: Dispose + Send + Sync + 'static,
{
    client_cache: TtlCache<F::Client>,
    credential_manager: Arc<CredentialManager<C, AS, DS>>,
    key_builder: KeyBuilder,
    buffer_ms: i64,
    factory: F,
}

impl<C, AS, DS, F> ClientPool<C, AS, DS, F>
where
    C: Dispose + Send + Sync + 'static,
    AS: ApplicationStrategy<Credential = C>,
    DS: DelegatedStrategy<Credential = C>,
    F: ClientFactory<Credentials = BoundCredentialProvider<C, AS, DS>>,
    F::Client: Dispose + Send + Sync + 'static,
{
    /// Construct a pool. Validates `config` (`spec.md` §6: "Configuration
    /// is resolved once during pool construction").
    ///
    /// # Errors
    ///
    /// [`PoolError::ConfigurationInvalid`] if `config` is structurally
    /// invalid — see [`PoolConfig::validate`].
    pub fn new(
        config: &PoolConfig,
        credential_manager: Arc<CredentialManager<C, AS, DS>>,
        factory: F,
    ) -> Result<Self, PoolError> {
        config.validate()?;
        Ok(Self {
            client_cache: TtlCache::new(
                config.cache.client_cache_sliding_ttl,
                config.cache.client_cache_max_size,
            ),
            credential_manager,
            key_builder: KeyBuilder::new(config.cache.key_prefix.clone()),
            buffer_ms: config.cache.client_cache_buffer.as_millis() as i64,
            factory,
        })
    }

    /// Return a ready-to-use client for `request`, constructing and
    /// caching one if none exists yet (`spec.md` §4.5 algorithm).
    pub async fn get_client(
        &self,
        request: &AuthRequest,
        options: Option<&Value>,
    ) -> Result<Arc<F::Client>, PoolError> {
        let ctx = adapt(request)?;
        let fingerprint = self.factory.fingerprint(options);
        let (_, stable_key) = self.key_builder.build(&ctx, fingerprint.as_deref(), options);

        let custom_ttl_ms = ctx
            .expires_at_ms()
            .map(|expires_at| expires_at - now_ms() - self.buffer_ms);

        let provider = BoundCredentialProvider {
            manager: self.credential_manager.clone(),
            request: request.clone(),
            ctx,
        };
        let factory = &self.factory;
        let options = options.cloned();

        self.client_cache
            .get_or_create(
                &stable_key,
                move || async move { factory.create_client(&provider, options.as_ref()).await },
                custom_ttl_ms,
            )
            .await
    }

    /// Remove any cached client for `request`/`options`. Returns whether a
    /// matching entry was present (`spec.md` §4.5).
    pub async fn invalidate_client_cache(
        &self,
        request: &AuthRequest,
        options: Option<&Value>,
    ) -> Result<bool, PoolError> {
        let ctx = adapt(request)?;
        let fingerprint = self.factory.fingerprint(options);
        let (_, stable_key) = self.key_builder.build(&ctx, fingerprint.as_deref(), options);
        Ok(self.client_cache.delete(&stable_key).await)
    }

    /// Current size/capacity/pending-count of the client cache.
    #[must_use]
    pub fn client_cache_stats(&self) -> CacheStats {
        self.client_cache.stats()
    }

    /// The credential manager backing this pool's factory invocations.
    #[must_use]
    pub fn credential_manager(&self) -> &Arc<CredentialManager<C, AS, DS>> {
        &self.credential_manager
    }
}
