//! End-to-end scenarios from the client pool's concrete test matrix.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use client_pool::auth::AuthRequest;
use client_pool::config::{CacheSection, PoolConfig};
use client_pool::credential::test_util::{CountingApplicationStrategy, CountingDelegatedStrategy};
use client_pool::credential::CredentialManager;
use client_pool::disposable::Dispose;
use client_pool::error::PoolError;
use client_pool::factory::{ClientFactory, CredentialProvider};
use client_pool::pool::{BoundCredentialProvider, ClientPool};
use serde_json::{json, Value};
use tokio::sync::Barrier;

#[derive(Debug)]
struct EchoClient {
    region: Option<String>,
}

#[async_trait]
impl Dispose for EchoClient {}

type Provider = BoundCredentialProvider<
    client_pool::credential::test_util::StaticCredential,
    CountingApplicationStrategy,
    CountingDelegatedStrategy,
>;

/// Extracts an `endpoint` option and fingerprints it to a short region
/// code, exactly as the spec's options-fingerprinting scenario describes.
struct RegionAwareFactory {
    calls: Arc<AtomicU32>,
    block_for: Option<Duration>,
}

#[async_trait]
impl ClientFactory for RegionAwareFactory {
    type Client = EchoClient;
    type Credentials = Provider;

    async fn create_client(
        &self,
        _credentials: &Provider,
        options: Option<&Value>,
    ) -> Result<EchoClient, PoolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.block_for {
            tokio::time::sleep(delay).await;
        }
        let region = options
            .and_then(|v| v.get("endpoint"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(EchoClient { region })
    }

    fn fingerprint(&self, options: Option<&Value>) -> Option<String> {
        match options.and_then(|v| v.get("endpoint")).and_then(Value::as_str) {
            Some("eastus") => Some("east".to_string()),
            Some("westus") => Some("west".to_string()),
            _ => None,
        }
    }
}

fn build_pool(
    cache: CacheSection,
    block_for: Option<Duration>,
) -> (
    ClientPool<
        client_pool::credential::test_util::StaticCredential,
        CountingApplicationStrategy,
        CountingDelegatedStrategy,
        RegionAwareFactory,
    >,
    Arc<AtomicU32>,
) {
    let config = PoolConfig {
        cache,
        auth: Default::default(),
    };
    let manager = Arc::new(CredentialManager::new(
        &config.cache,
        CountingApplicationStrategy::new(),
        CountingDelegatedStrategy::new(),
    ));
    let calls = Arc::new(AtomicU32::new(0));
    let factory = RegionAwareFactory {
        calls: calls.clone(),
        block_for,
    };
    (ClientPool::new(&config, manager, factory).unwrap(), calls)
}

#[tokio::test]
async fn options_fingerprinting_distinguishes_regions_and_reuses_matches() {
    let (pool, calls) = build_pool(CacheSection::default(), None);

    let east = json!({"endpoint": "eastus"});
    let west = json!({"endpoint": "westus"});

    let c_east = pool.get_client(&AuthRequest::Application, Some(&east)).await.unwrap();
    let c_west = pool.get_client(&AuthRequest::Application, Some(&west)).await.unwrap();
    assert_ne!(c_east.region, c_west.region);

    let c_east_again = pool.get_client(&AuthRequest::Application, Some(&east)).await.unwrap();
    assert!(Arc::ptr_eq(&c_east, &c_east_again));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn thundering_herd_single_flights_to_one_factory_call() {
    let (pool, calls) = build_pool(CacheSection::default(), Some(Duration::from_millis(100)));
    let pool = Arc::new(pool);
    let barrier = Arc::new(Barrier::new(50));

    let mut handles = Vec::with_capacity(50);
    for _ in 0..50 {
        let pool = pool.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            pool.get_client(&AuthRequest::Application, None).await.unwrap()
        }));
    }

    let mut clients = Vec::with_capacity(50);
    for h in handles {
        clients.push(h.await.unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for c in &clients {
        assert!(Arc::ptr_eq(c, &clients[0]));
    }
}
