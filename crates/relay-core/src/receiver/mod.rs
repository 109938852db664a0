//! Receiver capability and identity.

mod identity;
mod keyed_receiver;

pub use identity::ReceiverId;
pub use keyed_receiver::{FnReceiver, KeyedReceiver};
