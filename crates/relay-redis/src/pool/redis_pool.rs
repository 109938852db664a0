//! Redis connection pool using deadpool-redis.
//!
//! The pool is the backing resource of the transport: `start` verifies the
//! connection, `stop` closes the pool and connections are handed back on drop.

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::IntoConnectionInfo;
use relay_core::ResourcePool;
use std::time::Duration;

/// Redis pool configuration
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    /// Redis connection URL (e.g., `redis://localhost:6379/0`)
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: usize,
    /// Timeout for creating a connection and for waiting on a free one
    pub timeout: Duration,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 16,
            timeout: Duration::from_millis(2000),
        }
    }
}

impl From<&relay_common::RedisConfig> for RedisPoolConfig {
    fn from(config: &relay_common::RedisConfig) -> Self {
        Self {
            url: config.url(),
            max_connections: config.max_connections as usize,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// Error type for Redis pool operations
#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("Failed to create Redis pool: {0}")]
    CreatePool(String),

    #[error("Failed to get connection from pool: {0}")]
    GetConnection(#[from] deadpool_redis::PoolError),

    #[error("Redis command error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection pool is closed")]
    Closed,
}

/// Result type for Redis pool operations
pub type RedisResult<T> = Result<T, RedisPoolError>;

/// Managed Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
    database: i64,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("database", &self.database)
            .field("status", &self.pool.status())
            .finish()
    }
}

impl RedisPool {
    /// Create a new Redis pool with the given configuration
    ///
    /// No connection is opened until [`start`](Self::start) or the first
    /// [`get`](Self::get).
    pub fn new(config: RedisPoolConfig) -> RedisResult<Self> {
        let database = config
            .url
            .as_str()
            .into_connection_info()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?
            .redis
            .db;

        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .create_timeout(Some(config.timeout))
            .wait_timeout(Some(config.timeout))
            .build()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?;

        // Redact credentials from URL for logging
        let safe_url = config.url.split('@').next_back().unwrap_or(&config.url);
        tracing::info!(
            url = %safe_url,
            max_connections = config.max_connections,
            "Redis pool created"
        );

        Ok(Self { pool, database })
    }

    /// Create a new Redis pool from relay-common config
    pub fn from_config(config: &relay_common::RedisConfig) -> RedisResult<Self> {
        Self::new(RedisPoolConfig::from(config))
    }

    /// Verify the connection and report which database is in use
    ///
    /// Failures are logged before being returned.
    pub async fn start(&self) -> RedisResult<i64> {
        match self.health_check().await {
            Ok(()) => {
                tracing::info!(
                    database = self.database,
                    "Connection set with Redis, on database {}",
                    self.database
                );
                Ok(self.database)
            }
            Err(e) => {
                tracing::error!(error = %e, "An error occurred while connecting to Redis");
                Err(e)
            }
        }
    }

    /// Close the pool; outstanding connections are dropped when returned
    pub fn stop(&self) {
        tracing::info!("Stopping Redis connection...");
        self.pool.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Database index selected by the connection URL
    #[must_use]
    pub fn database(&self) -> i64 {
        self.database
    }

    /// Get a connection from the pool
    pub async fn get(&self) -> RedisResult<deadpool_redis::Connection> {
        if self.pool.is_closed() {
            return Err(RedisPoolError::Closed);
        }
        self.pool.get().await.map_err(RedisPoolError::GetConnection)
    }

    /// Get the current pool status
    #[must_use]
    pub fn status(&self) -> deadpool_redis::Status {
        self.pool.status()
    }
}

#[async_trait]
impl ResourcePool for RedisPool {
    type Resource = deadpool_redis::Connection;
    type Error = RedisPoolError;

    async fn acquire(&self) -> RedisResult<deadpool_redis::Connection> {
        self.get().await
    }

    /// Ping Redis over a pooled connection
    async fn health_check(&self) -> RedisResult<()> {
        let mut conn = self.get().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}
