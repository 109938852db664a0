//! Raw payload decoders.

use crate::error::DecodeError;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

/// Converts a raw payload into typed data
pub trait Decoder<Raw: ?Sized>: Send + Sync {
    type Data;

    fn decode(&self, raw: &Raw) -> Result<Self::Data, DecodeError>;
}

/// Decodes JSON text or bytes with `serde_json`
///
/// Accepts any raw payload that views as bytes (`str`, `String`, `[u8]`,
/// `Vec<u8>`).
pub struct JsonDecoder<D> {
    _data: PhantomData<fn() -> D>,
}

impl<D> JsonDecoder<D> {
    #[must_use]
    pub fn new() -> Self {
        Self { _data: PhantomData }
    }
}

impl<D> Default for JsonDecoder<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for JsonDecoder<D> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for JsonDecoder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("data", &std::any::type_name::<D>())
            .finish()
    }
}

impl<D, Raw> Decoder<Raw> for JsonDecoder<D>
where
    D: DeserializeOwned,
    Raw: AsRef<[u8]> + ?Sized,
{
    type Data = D;

    fn decode(&self, raw: &Raw) -> Result<D, DecodeError> {
        Ok(serde_json::from_slice(raw.as_ref())?)
    }
}
