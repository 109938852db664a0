//! Receiver adapter that decodes raw payloads before handling them.

use super::{Decoder, JsonDecoder};
use crate::error::ReceiveResult;
use crate::receiver::KeyedReceiver;
use std::fmt;

/// Receiver that decodes the raw payload and hands typed data to a handler
///
/// A payload that fails to decode is reported as
/// [`ReceiveError::Decode`](crate::ReceiveError::Decode) without calling the handler.
pub struct DecodingReceiver<Dec, F> {
    name: &'static str,
    decoder: Dec,
    handler: F,
}

impl<Dec, F> DecodingReceiver<Dec, F> {
    pub fn new(decoder: Dec, handler: F) -> Self {
        Self {
            name: "decoding-receiver",
            decoder,
            handler,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

/// Receiver decoding JSON payloads into `D`
///
/// ```
/// use relay_core::{json_receiver, KeyedReceiver};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Score {
///     points: u32,
/// }
///
/// let receiver = json_receiver(|channel: &String, score: Score| {
///     println!("{channel}: {}", score.points);
///     Ok(())
/// });
/// receiver
///     .receive(&"scores".to_string(), &r#"{"points":12}"#.to_string())
///     .unwrap();
/// ```
pub fn json_receiver<K, D, F>(handler: F) -> DecodingReceiver<JsonDecoder<D>, F>
where
    F: Fn(&K, D) -> ReceiveResult<()> + Send + Sync,
{
    DecodingReceiver::new(JsonDecoder::new(), handler)
}

impl<K, Raw, Dec, F> KeyedReceiver<K, Raw> for DecodingReceiver<Dec, F>
where
    Dec: Decoder<Raw>,
    F: Fn(&K, Dec::Data) -> ReceiveResult<()> + Send + Sync,
{
    fn receive(&self, key: &K, data: &Raw) -> ReceiveResult<()> {
        let decoded = self.decoder.decode(data)?;
        (self.handler)(key, decoded)
    }

    fn name(&self) -> &str {
        self.name
    }
}

impl<Dec: fmt::Debug, F> fmt::Debug for DecodingReceiver<Dec, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodingReceiver")
            .field("name", &self.name)
            .field("decoder", &self.decoder)
            .finish()
    }
}
