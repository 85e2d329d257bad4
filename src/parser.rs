//! JSON decoding of response bodies.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Decodes a JSON object into a generic string-keyed map.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the bytes are not valid JSON or the top-level
/// value is not an object (including `null`).
pub fn parse_map(bytes: &[u8]) -> Result<Map<String, Value>> {
    serde_json::from_slice(bytes).map_err(Error::decode)
}

/// Decodes JSON directly into `T`.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the bytes are not valid JSON or do not match
/// the shape of `T`.
pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(Error::decode)
}
