//! Monitor lifecycle: connect, subscribe, wait for shutdown, tear down.

use crate::logger::ChannelLogger;
use relay_common::AppConfig;
use relay_redis::{
    RedisPool, RedisPoolError, ReceiverManagerConfig, RedisReceiverManager, TransportError,
};
use std::future::Future;
use std::sync::Arc;

/// Errors that stop the monitor
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Redis pool error: {0}")]
    Pool(#[from] RedisPoolError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Log every message on the configured channels until `shutdown` resolves
pub async fn run<S>(config: AppConfig, shutdown: S) -> Result<(), MonitorError>
where
    S: Future<Output = ()>,
{
    let pool = RedisPool::from_config(&config.redis)?;
    pool.start().await?;

    let manager = RedisReceiverManager::start(ReceiverManagerConfig::from_settings(
        &config.redis,
        &config.relay,
    ))?;

    let logger = Arc::new(ChannelLogger::default());
    for channel in &config.relay.channels {
        manager.register_receiver(channel.clone(), logger.clone());
    }

    if config.relay.channels.is_empty() {
        tracing::warn!("No channels configured; set RELAY_CHANNELS to watch traffic");
    } else {
        tracing::info!(channels = ?manager.channels(), "Relay monitor listening");
    }

    shutdown.await;

    manager.unregister_all();
    manager.shutdown().await?;
    pool.stop();

    tracing::info!(received = logger.received(), "Relay monitor stopped");
    Ok(())
}
