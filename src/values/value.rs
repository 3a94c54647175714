//! # Typed value union.
//!
//! [`Value`] carries one raw or engineering sample in the wire types the
//! telemetry chain produces. The variant set is fixed by the ground-segment
//! data model; conversions between variants are not performed here.

use std::fmt;

/// One typed sample value (raw or engineering representation).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Signed 32-bit integer.
    Sint32(i32),
    /// Signed 64-bit integer.
    Sint64(i64),
    /// Unsigned 32-bit integer.
    Uint32(u32),
    /// Unsigned 64-bit integer.
    Uint64(u64),
    /// Single-precision float.
    Float(f32),
    /// Double-precision float.
    Double(f64),
    /// Text value (calibrated enumerations, string parameters).
    Text(String),
    /// Opaque binary blob.
    Binary(Vec<u8>),
    /// Timestamp, milliseconds since the mission epoch.
    Timestamp(i64),
}

impl Value {
    /// Returns the value widened to `f64` for numeric variants, `None` for
    /// non-numeric ones.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Sint32(v) => Some(f64::from(*v)),
            Value::Sint64(v) => Some(*v as f64),
            Value::Uint32(v) => Some(f64::from(*v)),
            Value::Uint64(v) => Some(*v as f64),
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            Value::Bool(_) | Value::Text(_) | Value::Binary(_) | Value::Timestamp(_) => None,
        }
    }

    /// Returns the text content for [`Value::Text`], `None` otherwise.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Sint32(v) => write!(f, "{v}"),
            Value::Sint64(v) => write!(f, "{v}"),
            Value::Uint32(v) => write!(f, "{v}"),
            Value::Uint64(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Value::Timestamp(v) => write!(f, "t+{v}ms"),
        }
    }
}
