//! Response body decoding.

use std::io::Read;

use serde::de::DeserializeOwned;

use crate::error::BoxError;

/// Decodes a response body into a caller-supplied target.
pub trait ResponseDecoder {
    fn decode<T: DeserializeOwned>(&self, body: &mut dyn Read, target: &mut T) -> Result<(), BoxError>;
}

/// Decodes JSON bodies with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl ResponseDecoder for JsonDecoder {
    fn decode<T: DeserializeOwned>(&self, body: &mut dyn Read, target: &mut T) -> Result<(), BoxError> {
        *target = serde_json::from_reader(body)?;
        Ok(())
    }
}
