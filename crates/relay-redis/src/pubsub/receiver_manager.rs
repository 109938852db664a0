//! Redis Pub/Sub receiver manager.
//!
//! Channels are the registry keys. A background listener keeps the Redis
//! subscription set in line with the registry and fires every incoming
//! message at the receivers registered on its channel.

use futures_util::StreamExt;
use parking_lot::Mutex;
use redis::Client;
use relay_core::{KeyedReceiver, ReceiverRegistry, RegistryConfig};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Registry type used by the Redis transport: channel name to raw payload
pub type RedisRegistry = ReceiverRegistry<String, String>;

type DynReceiver = dyn KeyedReceiver<String, String>;
type SharedReceiver = Arc<DynReceiver>;

/// Error type for transport operations
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Pub/Sub stream ended")]
    StreamEnded,

    #[error("Listener task failed: {0}")]
    Listener(#[from] tokio::task::JoinError),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Receiver manager configuration
#[derive(Debug, Clone)]
pub struct ReceiverManagerConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,
    /// Registry behavior (debug records)
    pub registry: RegistryConfig,
}

impl Default for ReceiverManagerConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            reconnect_delay_ms: 1000,
            registry: RegistryConfig::default(),
        }
    }
}

impl ReceiverManagerConfig {
    /// Build from the application's Redis and relay settings
    #[must_use]
    pub fn from_settings(
        redis: &relay_common::RedisConfig,
        relay: &relay_common::RelaySettings,
    ) -> Self {
        Self {
            redis_url: redis.url(),
            reconnect_delay_ms: relay.reconnect_delay_ms,
            registry: RegistryConfig::default().with_debug(relay.debug),
        }
    }
}

/// Commands for subscription management
#[derive(Debug)]
enum ManagerCommand {
    Subscribe(Vec<String>),
    Unsubscribe(Vec<String>),
    Shutdown,
}

/// Keyed receiver registry fed by Redis Pub/Sub
///
/// Registration is synchronous; subscription changes are queued to the
/// listener, which applies them against the registry's state at the time
/// it processes them. Every successful registration queues a subscribe, so
/// a registration racing the removal of a channel's last receiver still
/// ends up subscribed.
pub struct RedisReceiverManager {
    registry: Arc<RedisRegistry>,
    control_tx: mpsc::UnboundedSender<ManagerCommand>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl RedisReceiverManager {
    /// Create a manager with a fresh registry and start the background listener
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: ReceiverManagerConfig) -> TransportResult<Self> {
        let registry = Arc::new(RedisRegistry::new(config.registry));
        Self::with_registry(&config, registry)
    }

    /// Start the background listener over an existing registry
    ///
    /// Keys already present in the registry are subscribed on connect.
    pub fn with_registry(
        config: &ReceiverManagerConfig,
        registry: Arc<RedisRegistry>,
    ) -> TransportResult<Self> {
        let client = Client::open(config.redis_url.as_str())?;
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let listener = tokio::spawn(Self::listener_loop(
            client,
            Arc::clone(&registry),
            Duration::from_millis(config.reconnect_delay_ms),
            control_rx,
        ));

        Ok(Self {
            registry,
            control_tx,
            listener: Mutex::new(Some(listener)),
        })
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register a receiver on a channel, subscribing if not subscribed yet
    pub fn register_receiver(&self, channel: impl Into<String>, receiver: SharedReceiver) -> bool {
        let channel = channel.into();
        let added = self.registry.register_receiver(channel.clone(), receiver);

        if added {
            self.send(ManagerCommand::Subscribe(vec![channel]));
        }
        added
    }

    /// Register several receivers on a channel
    pub fn register_receivers<I>(&self, channel: impl Into<String>, receivers: I) -> usize
    where
        I: IntoIterator<Item = SharedReceiver>,
    {
        let channel = channel.into();
        let added = self.registry.register_receivers(channel.clone(), receivers);

        if added > 0 {
            self.send(ManagerCommand::Subscribe(vec![channel]));
        }
        added
    }

    /// Unregister a receiver, unsubscribing once the channel has none left
    pub fn unregister_receiver(&self, channel: &str, receiver: &DynReceiver) -> bool {
        let removed = self.registry.unregister_receiver(channel, receiver);
        if removed {
            self.unsubscribe_if_empty(channel);
        }
        removed
    }

    /// Unregister several receivers from a channel
    pub fn unregister_receivers<'a, I>(&self, channel: &str, receivers: I) -> usize
    where
        I: IntoIterator<Item = &'a DynReceiver>,
    {
        let removed = self.registry.unregister_receivers(channel, receivers);
        if removed > 0 {
            self.unsubscribe_if_empty(channel);
        }
        removed
    }

    /// Drop every receiver of a channel and unsubscribe from it
    pub fn unregister_channel(&self, channel: &str) -> usize {
        let removed = self.registry.unregister_key(channel);
        if removed > 0 {
            self.send(ManagerCommand::Unsubscribe(vec![channel.to_string()]));
        }
        removed
    }

    /// Drop the given channels
    pub fn unregister_channels<I, S>(&self, channels: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        channels
            .into_iter()
            .map(|channel| self.unregister_channel(channel.as_ref()))
            .sum()
    }

    /// Drop every channel and unsubscribe from all of them
    pub fn unregister_all(&self) {
        let channels = self.registry.keys();
        self.registry.unregister_all();

        if !channels.is_empty() {
            self.send(ManagerCommand::Unsubscribe(channels));
        }
    }

    #[must_use]
    pub fn receiver_count(&self, channel: &str) -> usize {
        self.registry.receiver_count(channel)
    }

    /// Channels that currently have receivers
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        self.registry.keys()
    }

    /// Stop the listener and wait for it to finish
    pub async fn shutdown(&self) -> TransportResult<()> {
        let listener = self.listener.lock().take();
        let Some(listener) = listener else {
            return Ok(());
        };

        self.control_tx
            .send(ManagerCommand::Shutdown)
            .map_err(|_| TransportError::ChannelClosed)?;
        listener.await?;
        Ok(())
    }

    fn unsubscribe_if_empty(&self, channel: &str) {
        if !self.registry.contains_key(channel) {
            self.send(ManagerCommand::Unsubscribe(vec![channel.to_string()]));
        }
    }

    fn send(&self, command: ManagerCommand) {
        if self.control_tx.send(command).is_err() {
            tracing::warn!("Receiver manager listener is not running; subscription change dropped");
        }
    }

    // ------------------------------------------------------------------------
    // Listener
    // ------------------------------------------------------------------------

    /// Background listener loop
    async fn listener_loop(
        client: Client,
        registry: Arc<RedisRegistry>,
        reconnect_delay: Duration,
        mut control_rx: mpsc::UnboundedReceiver<ManagerCommand>,
    ) {
        loop {
            match Self::run_listener(&client, &registry, &mut control_rx).await {
                Ok(()) => {
                    tracing::info!("Receiver manager shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Pub/Sub listener error, reconnecting...");
                    if Self::wait_for_reconnect(reconnect_delay, &mut control_rx).await {
                        tracing::info!("Receiver manager shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Sleep before reconnecting; returns `true` if shutdown was requested
    ///
    /// Subscription changes arriving meanwhile are discarded, the reconnect
    /// subscribes to whatever the registry holds at that point.
    async fn wait_for_reconnect(
        delay: Duration,
        control_rx: &mut mpsc::UnboundedReceiver<ManagerCommand>,
    ) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return false,
                cmd = control_rx.recv() => match cmd {
                    Some(ManagerCommand::Shutdown) | None => return true,
                    Some(_) => {}
                },
            }
        }
    }

    /// Run the listener until error or shutdown
    async fn run_listener(
        client: &Client,
        registry: &RedisRegistry,
        control_rx: &mut mpsc::UnboundedReceiver<ManagerCommand>,
    ) -> TransportResult<()> {
        let mut pubsub = client.get_async_pubsub().await?;

        let channels = registry.keys();
        if !channels.is_empty() {
            pubsub.subscribe(&channels).await?;
        }

        tracing::info!(channels = channels.len(), "Receiver manager connected to Redis");
        let mut subscriptions = Subscriptions::connected(channels);

        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                msg = stream.next() => {
                    match msg {
                        Some(msg) => {
                            let channel = msg.get_channel_name().to_string();
                            match msg.get_payload::<String>() {
                                Ok(payload) => dispatch(registry, &channel, &payload),
                                Err(e) => tracing::warn!(
                                    channel = %channel,
                                    error = %e,
                                    "Dropping message with non UTF-8 payload"
                                ),
                            }
                        }
                        None => {
                            tracing::warn!("Pub/Sub stream ended");
                            return Err(TransportError::StreamEnded);
                        }
                    }
                }

                cmd = control_rx.recv() => {
                    match cmd {
                        Some(ManagerCommand::Subscribe(channels)) => {
                            let channels = subscriptions.subscribe(registry, channels);
                            if !channels.is_empty() {
                                // Need to drop stream to access pubsub
                                drop(stream);
                                pubsub.subscribe(&channels).await?;
                                tracing::debug!(channels = ?channels, "Subscribed to channels");
                                stream = pubsub.on_message();
                            }
                        }
                        Some(ManagerCommand::Unsubscribe(channels)) => {
                            let channels = subscriptions.unsubscribe(registry, channels);
                            if !channels.is_empty() {
                                drop(stream);
                                pubsub.unsubscribe(&channels).await?;
                                tracing::debug!(channels = ?channels, "Unsubscribed from channels");
                                stream = pubsub.on_message();
                            }
                        }
                        Some(ManagerCommand::Shutdown) => {
                            return Ok(());
                        }
                        None => {
                            tracing::warn!("Control channel closed");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for RedisReceiverManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisReceiverManager")
            .field("registry", &self.registry)
            .field("running", &self.listener.lock().is_some())
            .finish()
    }
}

impl Drop for RedisReceiverManager {
    fn drop(&mut self) {
        if self.listener.get_mut().is_some() {
            let _ = self.control_tx.send(ManagerCommand::Shutdown);
        }
    }
}

/// Channels the listener has subscribed on its current connection
///
/// Commands are checked against the registry when they are processed, not
/// when they were queued: a subscribe for a channel that lost its receivers
/// meanwhile is skipped, as is an unsubscribe for one that gained a receiver
/// again.
#[derive(Debug, Default)]
struct Subscriptions {
    active: HashSet<String>,
}

impl Subscriptions {
    fn connected(channels: Vec<String>) -> Self {
        Self {
            active: channels.into_iter().collect(),
        }
    }

    /// Channels to SUBSCRIBE; marked active
    fn subscribe(&mut self, registry: &RedisRegistry, channels: Vec<String>) -> Vec<String> {
        channels
            .into_iter()
            .filter(|channel| registry.contains_key(channel) && self.active.insert(channel.clone()))
            .collect()
    }

    /// Channels to UNSUBSCRIBE; marked inactive
    fn unsubscribe(&mut self, registry: &RedisRegistry, channels: Vec<String>) -> Vec<String> {
        channels
            .into_iter()
            .filter(|channel| !registry.contains_key(channel) && self.active.remove(channel))
            .collect()
    }

    #[cfg(test)]
    fn is_subscribed(&self, channel: &str) -> bool {
        self.active.contains(channel)
    }
}

/// Fire one Pub/Sub message at the channel's receivers
#[allow(clippy::ptr_arg)]
fn dispatch(registry: &RedisRegistry, channel: &String, payload: &String) {
    let report = registry.fire_event(channel, payload);

    if !report.is_success() {
        tracing::warn!(
            channel = %channel,
            notified = report.notified(),
            failed = report.failures().len(),
            "Receivers failed to handle Pub/Sub message"
        );
    }
}

/// Builder for the receiver manager
pub struct ReceiverManagerBuilder {
    config: ReceiverManagerConfig,
    registry: Option<Arc<RedisRegistry>>,
}

impl ReceiverManagerBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ReceiverManagerConfig::default(),
            registry: None,
        }
    }

    /// Set Redis URL
    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = url.into();
        self
    }

    /// Set reconnection delay
    #[must_use]
    pub fn reconnect_delay_ms(mut self, delay: u64) -> Self {
        self.config.reconnect_delay_ms = delay;
        self
    }

    /// Emit a debug record for every received message
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.registry = self.config.registry.with_debug(debug);
        self
    }

    /// Use an existing registry, e.g. one built with a custom diagnostic sink
    #[must_use]
    pub fn registry(mut self, registry: Arc<RedisRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build and start the manager
    pub fn build(self) -> TransportResult<RedisReceiverManager> {
        match self.registry {
            Some(registry) => RedisReceiverManager::with_registry(&self.config, registry),
            None => RedisReceiverManager::start(self.config),
        }
    }
}

impl Default for ReceiverManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
