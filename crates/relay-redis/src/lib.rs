//! # relay-redis
//!
//! Redis transport for the keyed receiver registry.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Receiver Manager**: Pub/Sub listener that fires registry events per channel
//! - **Publisher**: Raw and JSON publishing to channels
//!
//! ## Example
//!
//! ```ignore
//! use relay_core::FnReceiver;
//! use relay_redis::{Publisher, RedisPool, RedisReceiverManager, ReceiverManagerConfig};
//! use std::sync::Arc;
//!
//! let manager = RedisReceiverManager::start(ReceiverManagerConfig::default())?;
//! manager.register_receiver("chat", Arc::new(FnReceiver::new(|channel: &String, data: &String| {
//!     println!("{channel}: {data}");
//!     Ok(())
//! })));
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! pool.start().await?;
//! Publisher::new(pool).publish_raw("chat", "hello").await?;
//! ```

pub mod pool;
pub mod pubsub;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export pubsub types
pub use pubsub::{
    Publisher, ReceiverManagerBuilder, ReceiverManagerConfig, RedisReceiverManager, RedisRegistry,
    TransportError, TransportResult,
};
