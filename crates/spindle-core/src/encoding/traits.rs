//! Encoding and decoding traits for serialization.

use crate::CoreError;

/// A trait for types that can be encoded to bytes.
pub trait Encoder: Sized {
    /// Encode this value to bytes.
    fn encode(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        self.encode_to(&mut buf)?;
        Ok(buf)
    }

    /// Append the encoded bytes to `buf`.
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<(), CoreError>;
}

/// A trait for types that can be decoded from bytes.
pub trait Decoder: Sized {
    /// Decode a value from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid data, truncated input or an unknown
    /// format version.
    fn decode(bytes: &[u8]) -> Result<Self, CoreError>;
}

/// Format version for serialized data.
///
/// Written as the first byte of every versioned encoding.
pub const FORMAT_VERSION: u8 = 1;
