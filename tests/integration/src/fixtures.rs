//! Test fixtures and data generators
//!
//! Provides reusable receivers and payloads for integration tests.

use parking_lot::Mutex;
use relay_core::{KeyedReceiver, ReceiveResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Channel name that no other test (or test run) uses
pub fn unique_channel(prefix: &str) -> String {
    format!("it:{prefix}:{}:{}", std::process::id(), unique_suffix())
}

/// Chat payload published as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(author: &str, text: &str) -> Self {
        Self {
            author: author.to_string(),
            text: text.to_string(),
        }
    }
}

/// Receiver that records every (channel, payload) pair
#[derive(Debug, Default)]
pub struct Collector {
    messages: Mutex<Vec<(String, String)>>,
}

impl Collector {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl KeyedReceiver<String, String> for Collector {
    fn receive(&self, channel: &String, payload: &String) -> ReceiveResult<()> {
        self.messages.lock().push((channel.clone(), payload.clone()));
        Ok(())
    }
}
