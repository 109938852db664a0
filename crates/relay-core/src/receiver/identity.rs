//! Receiver identity.
//!
//! Receivers are compared by the address of their shared allocation, never by
//! value. The address stays stable for as long as the registry holds the `Arc`.

use std::fmt;

/// Identity of a registered receiver instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceiverId(usize);

impl ReceiverId {
    /// Identity of the instance behind `receiver`
    ///
    /// Works for unsized receivers too; only the data address is kept, so a
    /// concrete reference and a trait-object reference to the same instance
    /// yield the same id.
    #[must_use]
    pub fn of<T: ?Sized>(receiver: &T) -> Self {
        Self(std::ptr::from_ref(receiver).cast::<()>() as usize)
    }
}

impl fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
