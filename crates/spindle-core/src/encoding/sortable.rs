//! Sort-order preserving encoding for edge endpoint values.
//!
//! Comparing two encodings byte-wise gives the same answer as comparing the
//! original [`DirectionValue`]s, and no encoding is a prefix of another. Both
//! properties are needed for edge index keys, where the encoded value is
//! followed directly by the encoded document key.
//!
//! # Layout
//!
//! Every encoding starts with a type tag, so integer and string endpoints live
//! in disjoint ranges and every integer sorts before every string:
//!
//! - `Int` (`0x02`): the value XORed with `0x8000_0000_0000_0000`, big-endian,
//!   which puts negative numbers before positive ones
//! - `String` (`0x04`): the UTF-8 bytes with every `0x00` written as
//!   `0x00 0x01`, closed by `0x00 0x00`
//!
//! The escaped byte form is also used on its own for document keys, see
//! [`encode_bytes_escaped`].
//!
//! # Example
//!
//! ```
//! use spindle_core::encoding::sortable::{decode_direction_value, encode_direction_value};
//! use spindle_core::DirectionValue;
//!
//! let mut encoded: Vec<_> = [
//!     DirectionValue::from("b"),
//!     DirectionValue::from(10),
//!     DirectionValue::from("a"),
//!     DirectionValue::from(-10),
//! ]
//! .iter()
//! .map(encode_direction_value)
//! .collect();
//! encoded.sort();
//!
//! let decoded: Vec<_> = encoded.iter().map(|e| decode_direction_value(e).unwrap()).collect();
//! assert_eq!(
//!     decoded,
//!     vec![
//!         DirectionValue::from(-10),
//!         DirectionValue::from(10),
//!         DirectionValue::from("a"),
//!         DirectionValue::from("b"),
//!     ]
//! );
//! ```

use crate::error::CoreError;
use crate::types::DirectionValue;

/// Type tags for sortable encoding.
///
/// The numbering leaves room for the value kinds that endpoints cannot hold,
/// so the tags stay stable if more kinds become indexable.
pub mod tags {
    /// 64-bit signed integers.
    pub const INT: u8 = 0x02;
    /// UTF-8 strings.
    pub const STRING: u8 = 0x04;
}

const SIGN_FLIP_I64: u64 = 0x8000_0000_0000_0000;

const ESCAPE_BYTE: u8 = 0x01;
const TERMINATOR: u8 = 0x00;

/// Append `data` to `buf` in null-escaped form.
///
/// Each `0x00` becomes `0x00 0x01` and the sequence is closed by `0x00 0x00`.
/// Escaped sequences compare in the same order as the raw bytes and are
/// prefix-free.
pub fn encode_bytes_escaped(data: &[u8], buf: &mut Vec<u8>) {
    for &byte in data {
        if byte == 0x00 {
            buf.extend_from_slice(&[0x00, ESCAPE_BYTE]);
        } else {
            buf.push(byte);
        }
    }
    buf.extend_from_slice(&[0x00, TERMINATOR]);
}

/// Decode a null-escaped sequence from the front of `data`.
///
/// Returns the raw bytes and the number of input bytes consumed, terminator
/// included.
pub fn decode_bytes_escaped(data: &[u8]) -> Result<(Vec<u8>, usize), CoreError> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while let Some(&byte) = data.get(i) {
        if byte != 0x00 {
            out.push(byte);
            i += 1;
            continue;
        }
        match data.get(i + 1) {
            Some(&TERMINATOR) => return Ok((out, i + 2)),
            Some(&ESCAPE_BYTE) => {
                out.push(0x00);
                i += 2;
            }
            Some(other) => {
                return Err(CoreError::Encoding(format!(
                    "invalid escape sequence: 0x00 0x{other:02x}"
                )));
            }
            None => break,
        }
    }
    Err(CoreError::Encoding("missing terminator in escaped bytes".into()))
}

/// Number of bytes [`encode_direction_value_to`] will append for `value`.
#[must_use]
pub fn encoded_len(value: &DirectionValue) -> usize {
    match value {
        DirectionValue::Int(_) => 9,
        DirectionValue::String(s) => {
            let nulls = s.bytes().filter(|b| *b == 0).count();
            1 + s.len() + nulls + 2
        }
    }
}

/// Append the sortable encoding of `value` to `buf`.
pub fn encode_direction_value_to(value: &DirectionValue, buf: &mut Vec<u8>) {
    match value {
        DirectionValue::Int(i) => {
            buf.push(tags::INT);
            #[allow(clippy::cast_sign_loss)]
            let flipped = (*i as u64) ^ SIGN_FLIP_I64;
            buf.extend_from_slice(&flipped.to_be_bytes());
        }
        DirectionValue::String(s) => {
            buf.push(tags::STRING);
            encode_bytes_escaped(s.as_bytes(), buf);
        }
    }
}

/// Encode `value` into a fresh buffer.
#[must_use]
pub fn encode_direction_value(value: &DirectionValue) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(value));
    encode_direction_value_to(value, &mut buf);
    buf
}

/// Decode a value that must span all of `bytes`.
pub fn decode_direction_value(bytes: &[u8]) -> Result<DirectionValue, CoreError> {
    let (value, consumed) = decode_direction_value_with_len(bytes)?;
    if consumed != bytes.len() {
        return Err(CoreError::Encoding(format!(
            "{} trailing bytes after sortable value",
            bytes.len() - consumed
        )));
    }
    Ok(value)
}

/// Decode a value from the front of `bytes`, returning it with the number of
/// bytes consumed.
pub fn decode_direction_value_with_len(bytes: &[u8]) -> Result<(DirectionValue, usize), CoreError> {
    let Some((&tag, rest)) = bytes.split_first() else {
        return Err(CoreError::Encoding("unexpected end of input in sortable decode".into()));
    };

    match tag {
        tags::INT => {
            let raw: [u8; 8] = rest
                .get(..8)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| CoreError::Encoding("unexpected end of input reading int".into()))?;
            #[allow(clippy::cast_possible_wrap)]
            let value = (u64::from_be_bytes(raw) ^ SIGN_FLIP_I64) as i64;
            Ok((DirectionValue::Int(value), 9))
        }
        tags::STRING => {
            let (raw, consumed) = decode_bytes_escaped(rest)?;
            let s = String::from_utf8(raw)
                .map_err(|e| CoreError::Encoding(format!("invalid UTF-8: {e}")))?;
            Ok((DirectionValue::String(s), 1 + consumed))
        }
        _ => Err(CoreError::Encoding(format!("unknown sortable type tag: {tag:#x}"))),
    }
}
