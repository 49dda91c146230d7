//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shopify_graphql::config::ClientOptionsBuilder;
use shopify_graphql::limits::{Deferrer, SleepFuture};
use shopify_graphql::{ClientOptions, GraphqlClient, Session, ShopDomain};

/// A deterministic clock for driving the retry, throttle, and polling paths
/// without real waiting. Sleeping advances the clock by the slept duration
/// and records it.
#[derive(Debug, Default)]
pub struct FakeDeferrer {
    now_ms: AtomicU64,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeDeferrer {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    /// Moves the clock forward without sleeping.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Deferrer for FakeDeferrer {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        self.sleeps.lock().unwrap().push(duration);
        self.now_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        Box::pin(std::future::ready(()))
    }
}

pub fn test_session() -> Session {
    Session::public(ShopDomain::new("test-shop").unwrap(), "shpat_test_token")
}

/// Builder pre-wired to route requests at a wiremock server and use the
/// given fake clock.
pub fn mock_options(server_uri: &str, deferrer: Arc<FakeDeferrer>) -> ClientOptionsBuilder {
    ClientOptions::builder()
        .endpoint(format!("{server_uri}/graphql.json"))
        .deferrer(deferrer)
}

/// A client against a wiremock server with default options and a fake clock.
pub fn mock_client(server_uri: &str, deferrer: Arc<FakeDeferrer>) -> GraphqlClient {
    GraphqlClient::with_options(test_session(), mock_options(server_uri, deferrer).build())
}
