//! Codec trait and implementations for serializing wire messages.
//!
//! The protocol layer doesn't care how messages become bytes — anything
//! implementing [`Codec`] will do. [`JsonCodec`] is the default; a binary
//! codec could be added later without touching any other layer.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts wire messages to and from bytes.
///
/// `Send + Sync + 'static` because the codec is shared across connection
/// handler tasks for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable, inspectable in browser DevTools, and exactly what the
/// JavaScript client expects. Behind the `json` feature flag (on by
/// default).
///
/// ## Example
///
/// ```rust
/// use scrawl_protocol::{ClientCommand, Codec, JsonCodec, Username};
///
/// let codec = JsonCodec;
/// let cmd = ClientCommand::Hello { username: Username::from("ala") };
///
/// let bytes = codec.encode(&cmd).unwrap();
/// let decoded: ClientCommand = codec.decode(&bytes).unwrap();
/// assert_eq!(cmd, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
