//! Error types for receivers and dispatch.

mod receive_error;

pub use receive_error::{
    DecodeError, DispatchError, FailureReason, ReceiveError, ReceiveResult, ReceiverFailure,
};
