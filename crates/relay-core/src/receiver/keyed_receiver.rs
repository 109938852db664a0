//! The receiver capability invoked on event delivery.

use crate::error::ReceiveResult;
use std::fmt;

/// A listener notified with the key and raw payload of every event fired for
/// a key it is registered under.
///
/// Receivers run synchronously on the dispatching thread, so a slow receiver
/// delays every other receiver of the same event and whatever delivered it.
/// Receivers must not rely on being called in any particular order relative
/// to the other receivers of the key.
pub trait KeyedReceiver<K, Raw>: Send + Sync {
    /// Handle one event
    fn receive(&self, key: &K, data: &Raw) -> ReceiveResult<()>;

    /// Name used in logs and failure reports
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Receiver backed by a closure
pub struct FnReceiver<F> {
    name: &'static str,
    handler: F,
}

impl<F> FnReceiver<F> {
    /// Wrap a closure as a receiver
    pub fn new<K, Raw>(handler: F) -> Self
    where
        F: Fn(&K, &Raw) -> ReceiveResult<()> + Send + Sync,
    {
        Self {
            name: "fn-receiver",
            handler,
        }
    }

    /// Set the name reported in logs
    #[must_use]
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl<K, Raw, F> KeyedReceiver<K, Raw> for FnReceiver<F>
where
    F: Fn(&K, &Raw) -> ReceiveResult<()> + Send + Sync,
{
    fn receive(&self, key: &K, data: &Raw) -> ReceiveResult<()> {
        (self.handler)(key, data)
    }

    fn name(&self) -> &str {
        self.name
    }
}

impl<F> fmt::Debug for FnReceiver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnReceiver").field("name", &self.name).finish()
    }
}
