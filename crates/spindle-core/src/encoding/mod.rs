//! Binary encoding for storage.
//!
//! # Encoding Traits
//!
//! - [`Encoder`] - Serialize types to bytes
//! - [`Decoder`] - Deserialize types from bytes
//!
//! # Sortable Values
//!
//! The [`sortable`] module encodes edge endpoint values so that byte order
//! matches value order.
//!
//! # Key Encoding
//!
//! The [`keys`] module builds and parses edge index keys and the range bounds
//! used to scan them.

pub mod keys;
pub mod sortable;
mod traits;


pub use traits::{Decoder, Encoder, FORMAT_VERSION};
