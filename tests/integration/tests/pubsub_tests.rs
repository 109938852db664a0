//! Pub/Sub Integration Tests
//!
//! These tests require:
//! - Running Redis instance
//! - Environment variable: REDIS_URL
//!
//! Run with: cargo test -p integration-tests --test pubsub_tests

use integration_tests::{
    check_test_env, eventually, unique_channel, ChatMessage, Collector, TestRelay,
};
use parking_lot::Mutex;
use relay_core::{json_receiver, KeyedReceiver, MemorySink, RegistryConfig};
use relay_redis::RedisRegistry;
use std::sync::Arc;

// ============================================================================
// Delivery Tests
// ============================================================================

#[tokio::test]
async fn test_published_message_reaches_every_receiver() {
    if !check_test_env().await {
        return;
    }

    let relay = TestRelay::start().await.unwrap();
    let channel = unique_channel("fanout");
    let other = unique_channel("other");
    let a = Collector::shared();
    let b = Collector::shared();
    let bystander = Collector::shared();

    let receivers: [Arc<dyn KeyedReceiver<String, String>>; 2] = [a.clone(), b.clone()];
    assert_eq!(relay.manager.register_receivers(channel.clone(), receivers), 2);
    relay.manager.register_receiver(other.clone(), bystander.clone());
    relay.wait_for_subscribers(&channel, 1).await.unwrap();

    let delivered = relay.publisher.publish_raw(&channel, "hello").await.unwrap();
    assert_eq!(delivered, 1);

    assert!(eventually(|| a.len() == 1 && b.len() == 1).await);
    assert_eq!(a.messages(), vec![(channel.clone(), "hello".to_string())]);
    assert_eq!(b.messages(), vec![(channel.clone(), "hello".to_string())]);
    assert!(bystander.is_empty());

    relay.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_json_payload_decoded_by_receiver() {
    if !check_test_env().await {
        return;
    }

    let relay = TestRelay::start().await.unwrap();
    let channel = unique_channel("json");
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let receiver = json_receiver(move |_: &String, message: ChatMessage| {
        sink.lock().push(message);
        Ok(())
    });
    relay.manager.register_receiver(channel.clone(), Arc::new(receiver));
    relay.wait_for_subscribers(&channel, 1).await.unwrap();

    let message = ChatMessage::new("bo", "hi there");
    relay.publisher.publish_json(&channel, &message).await.unwrap();

    assert!(eventually(|| !seen.lock().is_empty()).await);
    assert_eq!(seen.lock().clone(), vec![message]);

    relay.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_debug_records_for_received_messages() {
    if !check_test_env().await {
        return;
    }

    let sink: Arc<MemorySink<String, String>> = Arc::new(MemorySink::new());
    let registry = Arc::new(RedisRegistry::with_sink(RegistryConfig::debug(), sink.clone()));
    let relay = TestRelay::start_with_registry(registry).await.unwrap();
    let channel = unique_channel("debug");

    relay.manager.register_receiver(channel.clone(), Collector::shared());
    relay.wait_for_subscribers(&channel, 1).await.unwrap();
    relay.publisher.publish_raw(&channel, "traced").await.unwrap();

    assert!(eventually(|| !sink.is_empty()).await);
    let records = sink.records();
    assert_eq!(records[0].key, channel);
    assert_eq!(records[0].data, "traced");
    assert_eq!(records[0].notified, 1);

    relay.shutdown().await.unwrap();
}

// ============================================================================
// Subscription Tests
// ============================================================================

#[tokio::test]
async fn test_last_unregister_unsubscribes_channel() {
    if !check_test_env().await {
        return;
    }

    let relay = TestRelay::start().await.unwrap();
    let channel = unique_channel("unsubscribe");
    let a = Collector::shared();
    let b = Collector::shared();

    relay.manager.register_receiver(channel.clone(), a.clone());
    relay.manager.register_receiver(channel.clone(), b.clone());
    relay.wait_for_subscribers(&channel, 1).await.unwrap();

    // One receiver left: still subscribed
    assert!(relay.manager.unregister_receiver(&channel, &*a));
    relay.publisher.publish_raw(&channel, "first").await.unwrap();
    assert!(eventually(|| b.len() == 1).await);
    assert!(a.is_empty());

    assert!(relay.manager.unregister_receiver(&channel, &*b));
    relay.wait_for_subscribers(&channel, 0).await.unwrap();

    let delivered = relay.publisher.publish_raw(&channel, "second").await.unwrap();
    assert_eq!(delivered, 0);
    assert_eq!(b.len(), 1);

    relay.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unregister_all_unsubscribes_everything() {
    if !check_test_env().await {
        return;
    }

    let relay = TestRelay::start().await.unwrap();
    let first = unique_channel("all");
    let second = unique_channel("all");
    let collector = Collector::shared();

    relay.manager.register_receiver(first.clone(), collector.clone());
    relay.manager.register_receiver(second.clone(), collector.clone());
    relay.wait_for_subscribers(&first, 1).await.unwrap();
    relay.wait_for_subscribers(&second, 1).await.unwrap();

    relay.manager.unregister_all();
    relay.wait_for_subscribers(&first, 0).await.unwrap();
    relay.wait_for_subscribers(&second, 0).await.unwrap();
    assert!(relay.manager.channels().is_empty());

    relay.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_preloaded_registry_subscribed_on_connect() {
    if !check_test_env().await {
        return;
    }

    let registry = Arc::new(RedisRegistry::default());
    let channel = unique_channel("preloaded");
    let collector = Collector::shared();
    registry.register_receiver(channel.clone(), collector.clone());

    let relay = TestRelay::start_with_registry(registry).await.unwrap();
    relay.wait_for_subscribers(&channel, 1).await.unwrap();

    relay.publisher.publish_raw(&channel, "early").await.unwrap();
    assert!(eventually(|| collector.len() == 1).await);

    relay.shutdown().await.unwrap();
}

// ============================================================================
// Pool Tests
// ============================================================================

#[tokio::test]
async fn test_pool_start_and_stop() {
    if !check_test_env().await {
        return;
    }

    let pool = integration_tests::test_pool().unwrap();
    let database = pool.start().await.unwrap();
    assert_eq!(database, pool.database());

    pool.stop();
    assert!(pool.is_closed());
    assert!(pool.get().await.is_err());
}
