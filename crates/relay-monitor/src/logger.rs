//! Receiver that logs every message it is handed.

use relay_core::{KeyedReceiver, ReceiveResult};
use std::sync::atomic::{AtomicU64, Ordering};

const DEFAULT_PREVIEW_CHARS: usize = 256;

/// Logs each message at info level with a bounded payload preview
#[derive(Debug)]
pub struct ChannelLogger {
    preview_chars: usize,
    received: AtomicU64,
}

impl ChannelLogger {
    #[must_use]
    pub fn new(preview_chars: usize) -> Self {
        Self {
            preview_chars,
            received: AtomicU64::new(0),
        }
    }

    /// Messages logged so far, across all channels
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    fn preview<'a>(&self, payload: &'a str) -> (&'a str, bool) {
        match payload.char_indices().nth(self.preview_chars) {
            Some((end, _)) => (&payload[..end], true),
            None => (payload, false),
        }
    }
}

impl Default for ChannelLogger {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_CHARS)
    }
}

impl KeyedReceiver<String, String> for ChannelLogger {
    fn receive(&self, channel: &String, payload: &String) -> ReceiveResult<()> {
        let seq = self.received.fetch_add(1, Ordering::Relaxed) + 1;
        let (preview, truncated) = self.preview(payload);

        tracing::info!(
            channel = %channel,
            seq,
            bytes = payload.len(),
            truncated,
            "{preview}"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "channel-logger"
    }
}
