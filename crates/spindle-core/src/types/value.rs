//! Attribute values stored on documents.
//!
//! [`Value`] covers everything a document attribute can hold. [`DirectionValue`]
//! is the narrower set of values an edge endpoint attribute may carry and
//! therefore the only values that can appear inside an edge index key.
//!
//! # Example
//!
//! ```
//! use spindle_core::{DirectionValue, Value};
//!
//! let name: Value = "vertices/v1".into();
//! assert_eq!(name.as_str(), Some("vertices/v1"));
//!
//! let endpoint = DirectionValue::try_from(&name).unwrap();
//! assert_eq!(endpoint.as_str(), Some("vertices/v1"));
//!
//! // Floats cannot address a vertex.
//! assert!(DirectionValue::try_from(&Value::Float(1.5)).is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A value that can be stored as an attribute on a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null/missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Array of values
    Array(Vec<Value>),
}

impl Value {
    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a boolean if it is one.
    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an integer if it is one.
    #[inline]
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float if it is one.
    #[inline]
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is one.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an array slice if it is one.
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Self::Array(a)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Array(a) => {
                f.write_str("[")?;
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A value an edge endpoint attribute can hold.
///
/// Endpoints are usually vertex handles such as `"vertices/v1"`, but integer
/// endpoints are accepted as well. The derived ordering matches the byte order
/// of the sortable encoding: every integer sorts before every string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DirectionValue {
    /// Integer endpoint
    Int(i64),
    /// String endpoint
    String(String),
}

impl DirectionValue {
    /// Returns the endpoint as a string slice if it is one.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// Returns the endpoint as an integer if it is one.
    #[inline]
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::String(_) => None,
        }
    }
}

impl TryFrom<&Value> for DirectionValue {
    type Error = CoreError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(i) => Ok(Self::Int(*i)),
            Value::String(s) => Ok(Self::String(s.clone())),
            other => Err(CoreError::type_mismatch_with_value(
                "string or int",
                other.type_name(),
                other,
            )),
        }
    }
}

impl From<DirectionValue> for Value {
    fn from(v: DirectionValue) -> Self {
        match v {
            DirectionValue::Int(i) => Self::Int(i),
            DirectionValue::String(s) => Self::String(s),
        }
    }
}

impl From<&str> for DirectionValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for DirectionValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for DirectionValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl fmt::Display for DirectionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::String(s) => f.write_str(s),
        }
    }
}
