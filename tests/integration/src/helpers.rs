//! Test helpers for integration tests
//!
//! Provides connection setup against the Redis instance named by `REDIS_URL`
//! and polling helpers for the asynchronous subscription flow.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use relay_core::ResourcePool;
use relay_redis::{
    Publisher, RedisPool, RedisPoolConfig, ReceiverManagerBuilder, RedisReceiverManager,
    RedisRegistry,
};

/// How long to wait for asynchronous effects before failing a test
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis URL for tests
pub fn redis_url() -> String {
    let _ = dotenvy::dotenv();
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

/// Check if the test environment is properly configured
pub async fn check_test_env() -> bool {
    let _ = dotenvy::dotenv();

    if std::env::var("REDIS_URL").is_err() {
        eprintln!("Skipping test: REDIS_URL not set");
        return false;
    }

    match test_pool() {
        Ok(pool) if pool.health_check().await.is_ok() => true,
        _ => {
            eprintln!("Skipping test: Redis at REDIS_URL is not reachable");
            false
        }
    }
}

/// Pool against the test Redis instance
pub fn test_pool() -> Result<RedisPool> {
    Ok(RedisPool::new(RedisPoolConfig {
        url: redis_url(),
        max_connections: 4,
        ..RedisPoolConfig::default()
    })?)
}

/// Receiver manager, publisher and pool wired to the test Redis instance
pub struct TestRelay {
    pub manager: RedisReceiverManager,
    pub publisher: Publisher,
    pub pool: RedisPool,
}

impl TestRelay {
    /// Start against a fresh registry
    pub async fn start() -> Result<Self> {
        Self::start_with_registry(Arc::new(RedisRegistry::default())).await
    }

    /// Start over an existing registry
    pub async fn start_with_registry(registry: Arc<RedisRegistry>) -> Result<Self> {
        let pool = test_pool()?;
        pool.start().await?;

        let manager = ReceiverManagerBuilder::new()
            .redis_url(redis_url())
            .reconnect_delay_ms(100)
            .registry(registry)
            .build()?;

        Ok(Self {
            manager,
            publisher: Publisher::new(pool.clone()),
            pool,
        })
    }

    /// Number of Redis subscribers on a channel
    pub async fn subscriber_count(&self, channel: &str) -> Result<u32> {
        let mut conn = self.pool.acquire().await?;
        let (_, count): (String, u32) = redis::cmd("PUBSUB")
            .arg("NUMSUB")
            .arg(channel)
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }

    /// Wait until the channel has exactly `expected` Redis subscribers
    pub async fn wait_for_subscribers(&self, channel: &str, expected: u32) -> Result<()> {
        let reached = wait_until(|| async move {
            matches!(self.subscriber_count(channel).await, Ok(n) if n == expected)
        })
        .await;
        anyhow::ensure!(reached, "{channel} never reached {expected} subscriber(s)");
        Ok(())
    }

    pub async fn shutdown(self) -> Result<()> {
        self.manager.shutdown().await?;
        self.pool.stop();
        Ok(())
    }
}

/// Poll `condition` until it holds or [`WAIT_TIMEOUT`] passes
pub async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Poll a synchronous `condition` until it holds or [`WAIT_TIMEOUT`] passes
pub async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    wait_until(|| std::future::ready(condition())).await
}
