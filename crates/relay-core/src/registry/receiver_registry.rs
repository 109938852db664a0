//! Receiver registry
//!
//! Maps keys to sets of receivers using DashMap for thread-safe access. Sets are
//! keyed by receiver identity, so registering the same instance twice under a
//! key stores it once.

use super::{DispatchReport, RegistryConfig};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{FailureReason, ReceiverFailure};
use crate::receiver::{KeyedReceiver, ReceiverId};
use dashmap::DashMap;
use std::any::Any;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Registry of receivers grouped by key
///
/// Generic over the key type `K`, the raw payload type `Raw` and the receiver
/// type `R`, which defaults to a trait object so heterogeneous receivers can
/// share a key.
///
/// All operations take `&self` and may be called concurrently. Dispatch works
/// on a snapshot of the key's receivers taken before any receiver runs, so a
/// receiver unregistered while an event is in flight may still see that event.
pub struct ReceiverRegistry<K, Raw, R: ?Sized = dyn KeyedReceiver<K, Raw>> {
    receivers: DashMap<K, HashMap<ReceiverId, Arc<R>>>,
    config: RegistryConfig,
    sink: Arc<dyn DiagnosticSink<K, Raw>>,
}

impl<K, Raw, R> ReceiverRegistry<K, Raw, R>
where
    K: Eq + Hash + fmt::Debug,
    Raw: fmt::Debug,
    R: ?Sized,
{
    /// Create an empty registry that writes debug records to `tracing`
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }
}

impl<K, Raw, R> ReceiverRegistry<K, Raw, R>
where
    K: Eq + Hash,
    R: ?Sized,
{
    /// Create an empty registry with a custom diagnostic sink
    #[must_use]
    pub fn with_sink(config: RegistryConfig, sink: Arc<dyn DiagnosticSink<K, Raw>>) -> Self {
        Self {
            receivers: DashMap::new(),
            config,
            sink,
        }
    }

    #[must_use]
    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    /// Register a receiver under a key
    ///
    /// Returns `false` if this exact instance was already registered under the key.
    pub fn register_receiver(&self, key: K, receiver: Arc<R>) -> bool {
        let id = ReceiverId::of(&*receiver);
        let mut set = self.receivers.entry(key).or_default();

        if set.contains_key(&id) {
            return false;
        }
        set.insert(id, receiver);
        true
    }

    /// Register several receivers under the same key, in order
    ///
    /// Returns how many of them were newly added.
    pub fn register_receivers<I>(&self, key: K, receivers: I) -> usize
    where
        K: Clone,
        I: IntoIterator<Item = Arc<R>>,
    {
        receivers
            .into_iter()
            .filter(|receiver| self.register_receiver(key.clone(), Arc::clone(receiver)))
            .count()
    }

    /// Unregister a receiver from a key
    ///
    /// Unknown keys and receivers are ignored. A key whose last receiver is
    /// removed is dropped from the registry.
    pub fn unregister_receiver<Q>(&self, key: &Q, receiver: &R) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = ReceiverId::of(receiver);
        let removed = self
            .receivers
            .get_mut(key)
            .is_some_and(|mut set| set.remove(&id).is_some());

        if removed {
            // Only drops the entry if nothing was registered in the meantime
            self.receivers.remove_if(key, |_, set| set.is_empty());
        }

        removed
    }

    /// Unregister several receivers from the same key
    ///
    /// Returns how many were actually registered and got removed.
    pub fn unregister_receivers<'a, Q, I>(&self, key: &Q, receivers: I) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        R: 'a,
        I: IntoIterator<Item = &'a R>,
    {
        receivers
            .into_iter()
            .filter(|receiver| self.unregister_receiver(key, receiver))
            .count()
    }

    /// Unregister every receiver of a key
    ///
    /// Returns the number of receivers that were dropped.
    pub fn unregister_key<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.receivers
            .remove(key)
            .map_or(0, |(_, set)| set.len())
    }

    /// Unregister every receiver of each key
    pub fn unregister_keys<'a, Q, I>(&self, keys: I) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized + 'a,
        I: IntoIterator<Item = &'a Q>,
    {
        keys.into_iter().map(|key| self.unregister_key(key)).sum()
    }

    /// Unregister every receiver of every key
    pub fn unregister_all(&self) {
        self.receivers.clear();
    }

    /// Check if any receiver is registered under a key
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.receivers.get(key).is_some_and(|set| !set.is_empty())
    }

    /// Number of receivers registered under a key
    pub fn receiver_count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.receivers.get(key).map_or(0, |set| set.len())
    }

    /// Number of keys with at least one receiver
    pub fn key_count(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// Snapshot of the keys currently registered
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.receivers.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Notify every receiver registered under `key`
    ///
    /// Receivers run one after another on the calling thread. A receiver that
    /// returns an error or panics is recorded in the report and logged; the
    /// remaining receivers are still notified. In debug mode a diagnostic
    /// record is emitted afterwards, whether or not anything was registered.
    ///
    /// This is the entry point for transports delivering inbound messages.
    pub fn fire_event(&self, key: &K, data: &Raw) -> DispatchReport
    where
        R: KeyedReceiver<K, Raw>,
    {
        // The shard lock is released before any receiver runs, so receivers
        // may register or unregister on this registry.
        let snapshot: Vec<(ReceiverId, Arc<R>)> = self
            .receivers
            .get(key)
            .map(|set| set.iter().map(|(id, r)| (*id, Arc::clone(r))).collect())
            .unwrap_or_default();

        let mut report = DispatchReport::default();

        for (id, receiver) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| receiver.receive(key, data))) {
                Ok(Ok(())) => report.record_delivered(),
                Ok(Err(err)) => {
                    tracing::warn!(
                        receiver = %receiver.name(),
                        receiver_id = %id,
                        error = %err,
                        "Receiver failed to handle event"
                    );
                    report.record_failure(ReceiverFailure::new(
                        id,
                        receiver.name(),
                        FailureReason::Error(err),
                    ));
                }
                Err(payload) => {
                    let message = panic_message(&*payload);
                    tracing::error!(
                        receiver = %receiver.name(),
                        receiver_id = %id,
                        panic = %message,
                        "Receiver panicked while handling event"
                    );
                    report.record_failure(ReceiverFailure::new(
                        id,
                        receiver.name(),
                        FailureReason::Panicked(message),
                    ));
                }
            }
        }

        if self.config.debug {
            self.sink.record(key, data, &report);
        }

        report
    }
}

impl<K, Raw, R> Default for ReceiverRegistry<K, Raw, R>
where
    K: Eq + Hash + fmt::Debug,
    Raw: fmt::Debug,
    R: ?Sized,
{
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl<K, Raw, R> fmt::Debug for ReceiverRegistry<K, Raw, R>
where
    K: Eq + Hash,
    R: ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiverRegistry")
            .field("keys", &self.receivers.len())
            .field("debug", &self.config.debug)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
