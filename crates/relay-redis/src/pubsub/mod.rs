//! Redis Pub/Sub module.
//!
//! Channels are registry keys: receivers registered on a channel get every
//! message published to it.

mod publisher;
mod receiver_manager;

pub use publisher::Publisher;
pub use receiver_manager::{
    ReceiverManagerBuilder, ReceiverManagerConfig, RedisReceiverManager, RedisRegistry,
    TransportError, TransportResult,
};
