//! Diagnostic sinks.

use crate::registry::DispatchReport;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;

/// Destination for debug records of fired events
pub trait DiagnosticSink<K, Raw>: Send + Sync {
    /// Called once per fired event, after every receiver ran
    fn record(&self, key: &K, data: &Raw, report: &DispatchReport);
}

/// Sink writing a `debug` level event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl<K, Raw> DiagnosticSink<K, Raw> for TracingSink
where
    K: fmt::Debug,
    Raw: fmt::Debug,
{
    fn record(&self, key: &K, data: &Raw, report: &DispatchReport) {
        tracing::debug!(
            notified = report.notified(),
            failed = report.failures().len(),
            "[{key:?}] Received: {data:?}"
        );
    }
}

/// A fired event as seen by [`MemorySink`]
#[derive(Debug, Clone)]
pub struct DiagnosticRecord<K, Raw> {
    pub key: K,
    pub data: Raw,
    /// Receivers invoked for the event
    pub notified: usize,
    /// Receivers that failed
    pub failed: usize,
    pub recorded_at: DateTime<Utc>,
}

/// Sink keeping records in memory
///
/// Useful in tests and for exposing recent traffic to an admin surface.
/// A capacity bounds memory use by discarding the oldest records.
pub struct MemorySink<K, Raw> {
    records: Mutex<Vec<DiagnosticRecord<K, Raw>>>,
    capacity: Option<usize>,
}

impl<K, Raw> MemorySink<K, Raw> {
    /// Create an unbounded sink
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            capacity: None,
        }
    }

    /// Create a sink keeping at most `capacity` recent records
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(Vec::with_capacity(capacity)),
            capacity: Some(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Remove and return every stored record
    pub fn drain(&self) -> Vec<DiagnosticRecord<K, Raw>> {
        std::mem::take(&mut *self.records.lock())
    }
}

impl<K: Clone, Raw: Clone> MemorySink<K, Raw> {
    /// Copy of the stored records, oldest first
    pub fn records(&self) -> Vec<DiagnosticRecord<K, Raw>> {
        self.records.lock().clone()
    }
}

impl<K, Raw> Default for MemorySink<K, Raw> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, Raw> DiagnosticSink<K, Raw> for MemorySink<K, Raw>
where
    K: Clone + Send,
    Raw: Clone + Send,
{
    fn record(&self, key: &K, data: &Raw, report: &DispatchReport) {
        let mut records = self.records.lock();

        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            if records.len() >= capacity {
                let overflow = records.len() + 1 - capacity;
                records.drain(..overflow);
            }
        }

        records.push(DiagnosticRecord {
            key: key.clone(),
            data: data.clone(),
            notified: report.notified(),
            failed: report.failures().len(),
            recorded_at: Utc::now(),
        });
    }
}

impl<K, Raw> fmt::Debug for MemorySink<K, Raw> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySink")
            .field("records", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records() {
        let sink: MemorySink<&str, u32> = MemorySink::new();
        let report = DispatchReport::default();

        sink.record(&"a", &1, &report);
        sink.record(&"b", &2, &report);

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "a");
        assert_eq!(records[1].data, 2);
        assert_eq!(records[1].notified, 0);
        assert!(records[0].recorded_at <= records[1].recorded_at);
    }

    #[test]
    fn test_memory_sink_capacity_drops_oldest() {
        let sink: MemorySink<&str, u32> = MemorySink::with_capacity(2);
        let report = DispatchReport::default();

        for i in 0..5 {
            sink.record(&"k", &i, &report);
        }

        let data: Vec<u32> = sink.records().iter().map(|r| r.data).collect();
        assert_eq!(data, vec![3, 4]);
    }

    #[test]
    fn test_memory_sink_drain() {
        let sink: MemorySink<&str, u32> = MemorySink::new();
        sink.record(&"k", &1, &DispatchReport::default());

        assert_eq!(sink.drain().len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_tracing_sink_accepts_debug_types() {
        // No subscriber installed; only checks the sink is usable for these types
        let sink = TracingSink;
        DiagnosticSink::<String, Vec<u8>>::record(
            &sink,
            &"chat".to_string(),
            &b"hi".to_vec(),
            &DispatchReport::default(),
        );
    }
}
