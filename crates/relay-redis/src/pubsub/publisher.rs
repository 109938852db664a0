//! Redis Pub/Sub publisher.
//!
//! Publishes payloads to channels; every receiver registered on the channel
//! by a [`RedisReceiverManager`](super::RedisReceiverManager) gets them.

use crate::pool::{RedisPool, RedisResult};
use redis::AsyncCommands;
use relay_core::ResourcePool;
use serde::Serialize;

/// Redis Pub/Sub publisher
#[derive(Debug, Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish a value serialized as JSON
    ///
    /// Returns the number of Redis subscribers that received the message.
    pub async fn publish_json<T: Serialize + ?Sized>(
        &self,
        channel: &str,
        value: &T,
    ) -> RedisResult<u32> {
        let payload = serde_json::to_string(value)?;
        let mut conn = self.pool.acquire().await?;

        let receivers: u32 = conn.publish(channel, &payload).await?;

        tracing::debug!(channel = %channel, receivers = receivers, "Published event");

        Ok(receivers)
    }

    /// Publish a raw message to a channel
    pub async fn publish_raw(&self, channel: &str, message: &str) -> RedisResult<u32> {
        let mut conn = self.pool.acquire().await?;

        let receivers: u32 = conn.publish(channel, message).await?;

        tracing::debug!(
            channel = %channel,
            receivers = receivers,
            "Published raw message"
        );

        Ok(receivers)
    }

    /// Publish the same raw message to several channels
    pub async fn publish_many(&self, channels: &[&str], message: &str) -> RedisResult<u32> {
        if channels.is_empty() {
            return Ok(0);
        }

        let mut total_receivers = 0;
        let mut conn = self.pool.acquire().await?;

        for channel in channels {
            let receivers: u32 = conn.publish(*channel, message).await?;
            total_receivers += receivers;
        }

        tracing::debug!(
            channels = channels.len(),
            total_receivers = total_receivers,
            "Published message to multiple channels"
        );

        Ok(total_receivers)
    }
}
