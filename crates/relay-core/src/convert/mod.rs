//! Payload conversion.
//!
//! The registry only routes raw payloads. Receivers that want typed data wrap
//! a handler in a [`DecodingReceiver`], which converts the raw payload with a
//! [`Decoder`] before calling the handler.

mod decoder;
mod decoding_receiver;

pub use decoder::{Decoder, JsonDecoder};
pub use decoding_receiver::{json_receiver, DecodingReceiver};
