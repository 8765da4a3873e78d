//! The user-supplied client factory contract (`spec.md` §6 "Client factory
//! interface") and the credential-provider view handed to it.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::credential::CredentialKind;
use crate::error::PoolError;

/// A lazily-materializing view over credentials, bound to the auth request
/// that produced it (`spec.md` §4.5 step 5).
///
/// A [`crate::pool::ClientPool`] constructs one of these per factory
/// invocation and passes it to [`ClientFactory::create_client`]; the
/// factory never sees the raw [`crate::auth::AuthRequest`] or
/// [`crate::credential::CredentialManager`] directly.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// The credential type this provider yields.
    type Credential: Send + Sync + 'static;

    /// Materialize the credential `kind` asks for.
    async fn get_credential(&self, kind: CredentialKind) -> Result<Arc<Self::Credential>, PoolError>;
}

/// Constructs client instances the pool caches (`spec.md` §3 "Client
/// Factory"). A pure constructor: the pool, not the factory, owns lifetime
/// and disposal of whatever it returns.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// The client type this factory produces; owned and disposed by the pool.
    type Client: Send + Sync + 'static;
    /// The concrete credential-provider view this factory expects.
    type Credentials: CredentialProvider;

    /// Build a client, given a credential-provider view and the caller's
    /// options.
    async fn create_client(
        &self,
        credentials: &Self::Credentials,
        options: Option<&Value>,
    ) -> Result<Self::Client, PoolError>;

    /// Return a stable fingerprint for `options`, if this factory can
    /// compute one more cheaply or more precisely than a generic
    /// canonicalized hash. `None` (the default) falls back to
    /// `crate::cache::canonical_hash`.
    fn fingerprint(&self, _options: Option<&Value>) -> Option<String> {
        None
    }
}
