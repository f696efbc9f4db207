//! Compact encoding of exported values
//!
//! Values travel between neighbours as postcard bytes. Storage whose
//! presence is fixed by the type adds nothing to the encoding: a placed
//! value that cannot exist on the sender encodes to zero bytes, and one that
//! always exists encodes exactly as its field. Only storage with runtime
//! presence writes a one-byte flag.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::WireError;

/// Encode a value for transmission
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, WireError> {
    postcard::to_allocvec(value).map_err(|e| WireError::Serialization(e.to_string()))
}

/// Decode a value, rejecting leftover bytes
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    let (value, rest) = postcard::take_from_bytes::<T>(bytes).map_err(|e| {
        debug!(len = bytes.len(), error = %e, "failed to decode value");
        WireError::Deserialization(e.to_string())
    })?;
    if !rest.is_empty() {
        warn!(trailing = rest.len(), "decoded value followed by unexpected bytes");
        return Err(WireError::TrailingBytes(rest.len()));
    }
    Ok(value)
}

/// Decode a value from the front of `bytes`, returning the remainder
pub fn decode_prefix<T: DeserializeOwned>(bytes: &[u8]) -> Result<(T, &[u8]), WireError> {
    postcard::take_from_bytes::<T>(bytes).map_err(|e| WireError::Deserialization(e.to_string()))
}
