//! Typed cell values.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{BincodeSerDe, ObjectSerDe};
use crate::error::BlockResult;
use crate::schema::ColumnDataType;

/// A single cell value written to or read from a data block.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Boolean.
    Boolean(bool),
    /// Milliseconds since the epoch.
    Timestamp(i64),
    /// UTF-8 string (also used for dictionary-encoded columns).
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Object already encoded by the object codec.
    Object(Vec<u8>),
    /// Array of ints.
    IntArray(Vec<i32>),
    /// Array of longs.
    LongArray(Vec<i64>),
    /// Array of floats.
    FloatArray(Vec<f32>),
    /// Array of doubles.
    DoubleArray(Vec<f64>),
    /// Array of strings.
    StringArray(Vec<String>),
}

impl Value {
    /// Encodes `value` with the object codec into an [`Value::Object`].
    pub fn object<T: Serialize + DeserializeOwned>(value: &T) -> BlockResult<Self> {
        Ok(Self::Object(BincodeSerDe.serialize(value)?))
    }

    /// Returns true if this is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if this value may be stored in a column of type `ty`.
    ///
    /// NULL fits every column.
    pub fn fits(&self, ty: ColumnDataType) -> bool {
        matches!(
            (self, ty),
            (Self::Null, _)
                | (Self::Int(_), ColumnDataType::Int)
                | (Self::Long(_), ColumnDataType::Long)
                | (Self::Float(_), ColumnDataType::Float)
                | (Self::Double(_), ColumnDataType::Double)
                | (Self::Boolean(_), ColumnDataType::Boolean)
                | (Self::Timestamp(_), ColumnDataType::Timestamp)
                | (
                    Self::String(_),
                    ColumnDataType::String | ColumnDataType::DictString
                )
                | (Self::Bytes(_), ColumnDataType::Bytes)
                | (Self::Object(_), ColumnDataType::Object)
                | (Self::IntArray(_), ColumnDataType::IntArray)
                | (Self::LongArray(_), ColumnDataType::LongArray)
                | (Self::FloatArray(_), ColumnDataType::FloatArray)
                | (Self::DoubleArray(_), ColumnDataType::DoubleArray)
                | (Self::StringArray(_), ColumnDataType::StringArray)
        )
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Int(_) => "INT",
            Self::Long(_) => "LONG",
            Self::Float(_) => "FLOAT",
            Self::Double(_) => "DOUBLE",
            Self::Boolean(_) => "BOOLEAN",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::String(_) => "STRING",
            Self::Bytes(_) => "BYTES",
            Self::Object(_) => "OBJECT",
            Self::IntArray(_) => "INT_ARRAY",
            Self::LongArray(_) => "LONG_ARRAY",
            Self::FloatArray(_) => "FLOAT_ARRAY",
            Self::DoubleArray(_) => "DOUBLE_ARRAY",
            Self::StringArray(_) => "STRING_ARRAY",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(v) => write!(f, "{}", v),
            Self::Long(v) | Self::Timestamp(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::Bytes(v) | Self::Object(v) => write!(f, "<{} bytes>", v.len()),
            Self::IntArray(v) => write!(f, "{:?}", v),
            Self::LongArray(v) => write!(f, "{:?}", v),
            Self::FloatArray(v) => write!(f, "{:?}", v),
            Self::DoubleArray(v) => write!(f, "{:?}", v),
            Self::StringArray(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
