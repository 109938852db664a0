//! Outcome of a single dispatch.

use crate::error::{DispatchError, ReceiverFailure};

/// What happened when an event was fired
#[derive(Debug, Default)]
pub struct DispatchReport {
    notified: usize,
    failures: Vec<ReceiverFailure>,
}

impl DispatchReport {
    pub(crate) fn record_delivered(&mut self) {
        self.notified += 1;
    }

    pub(crate) fn record_failure(&mut self, failure: ReceiverFailure) {
        self.notified += 1;
        self.failures.push(failure);
    }

    /// Number of receivers invoked, failed or not
    #[must_use]
    pub fn notified(&self) -> usize {
        self.notified
    }

    /// Number of receivers that handled the event without failing
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.notified - self.failures.len()
    }

    #[must_use]
    pub fn failures(&self) -> &[ReceiverFailure] {
        &self.failures
    }

    /// True when no receiver was registered for the key
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notified == 0
    }

    /// True when every invoked receiver succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn receiver failures into an aggregated error
    ///
    /// Returns the number of receivers that handled the event on success.
    pub fn into_result(self) -> Result<usize, DispatchError> {
        if self.failures.is_empty() {
            Ok(self.notified)
        } else {
            Err(DispatchError {
                notified: self.notified,
                failures: self.failures,
            })
        }
    }
}
