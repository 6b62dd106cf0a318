//! Data block schema.
//!
//! A schema is the ordered list of `(column name, column type)` pairs that
//! determines how the fixed-size region of a block is laid out.

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_common::constants::{
    DOUBLE_BYTES, FLOAT_BYTES, INT_BYTES, LONG_BYTES, POINTER_PAIR_BYTES,
};

use crate::error::{BlockError, BlockResult};

/// Column types that can appear in a data block.
///
/// Fixed-width types are stored inline in the fixed-size region.
/// Variable-width types occupy an `(offset, length)` pointer pair slot and
/// keep their payload in the variable-size region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ColumnDataType {
    /// 32-bit signed integer.
    Int = 0,
    /// 64-bit signed integer.
    Long = 1,
    /// 32-bit float.
    Float = 2,
    /// 64-bit float.
    Double = 3,
    /// Boolean, stored as an int (0 or 1).
    Boolean = 4,
    /// Milliseconds since the epoch.
    Timestamp = 5,
    /// UTF-8 string stored out-of-line.
    String = 6,
    /// String stored as a dictionary code.
    DictString = 7,
    /// Raw bytes stored out-of-line.
    Bytes = 8,
    /// Object serialized with the object codec.
    Object = 9,
    /// Array of ints.
    IntArray = 10,
    /// Array of longs.
    LongArray = 11,
    /// Array of floats.
    FloatArray = 12,
    /// Array of doubles.
    DoubleArray = 13,
    /// Array of strings.
    StringArray = 14,
}

impl ColumnDataType {
    /// Returns the type code written to the wire.
    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Parses a type code read from the wire.
    pub fn from_code(code: u32) -> BlockResult<Self> {
        match code {
            0 => Ok(Self::Int),
            1 => Ok(Self::Long),
            2 => Ok(Self::Float),
            3 => Ok(Self::Double),
            4 => Ok(Self::Boolean),
            5 => Ok(Self::Timestamp),
            6 => Ok(Self::String),
            7 => Ok(Self::DictString),
            8 => Ok(Self::Bytes),
            9 => Ok(Self::Object),
            10 => Ok(Self::IntArray),
            11 => Ok(Self::LongArray),
            12 => Ok(Self::FloatArray),
            13 => Ok(Self::DoubleArray),
            14 => Ok(Self::StringArray),
            _ => Err(BlockError::UnknownColumnType { code }),
        }
    }

    /// Width of this column's slot in the fixed-size region.
    pub const fn fixed_width(self) -> usize {
        match self {
            Self::Int | Self::Boolean | Self::DictString => INT_BYTES,
            Self::Float => FLOAT_BYTES,
            Self::Long | Self::Timestamp => LONG_BYTES,
            Self::Double => DOUBLE_BYTES,
            Self::String
            | Self::Bytes
            | Self::Object
            | Self::IntArray
            | Self::LongArray
            | Self::FloatArray
            | Self::DoubleArray
            | Self::StringArray => POINTER_PAIR_BYTES,
        }
    }

    /// Returns true if values live in the variable-size region.
    pub const fn is_variable_width(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::Bytes
                | Self::Object
                | Self::IntArray
                | Self::LongArray
                | Self::FloatArray
                | Self::DoubleArray
                | Self::StringArray
        )
    }

    /// Returns true for array types.
    pub const fn is_array(self) -> bool {
        matches!(
            self,
            Self::IntArray
                | Self::LongArray
                | Self::FloatArray
                | Self::DoubleArray
                | Self::StringArray
        )
    }

    /// Upper-case type name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::Long => "LONG",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Boolean => "BOOLEAN",
            Self::Timestamp => "TIMESTAMP",
            Self::String => "STRING",
            Self::DictString => "DICT_STRING",
            Self::Bytes => "BYTES",
            Self::Object => "OBJECT",
            Self::IntArray => "INT_ARRAY",
            Self::LongArray => "LONG_ARRAY",
            Self::FloatArray => "FLOAT_ARRAY",
            Self::DoubleArray => "DOUBLE_ARRAY",
            Self::StringArray => "STRING_ARRAY",
        }
    }
}

impl fmt::Display for ColumnDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered column names and types of a data block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DataSchema {
    column_names: Vec<String>,
    column_types: Vec<ColumnDataType>,
}

impl DataSchema {
    /// Creates a schema from `(name, type)` pairs.
    pub fn new(columns: Vec<(String, ColumnDataType)>) -> Self {
        let (column_names, column_types) = columns.into_iter().unzip();
        Self {
            column_names,
            column_types,
        }
    }

    /// Creates a schema from parallel name and type lists.
    pub fn from_parts(
        column_names: Vec<String>,
        column_types: Vec<ColumnDataType>,
    ) -> BlockResult<Self> {
        if column_names.len() != column_types.len() {
            return Err(BlockError::length_mismatch(
                "schema",
                format!(
                    "{} column names but {} column types",
                    column_names.len(),
                    column_types.len()
                ),
            ));
        }
        Ok(Self {
            column_names,
            column_types,
        })
    }

    /// Number of columns.
    pub fn size(&self) -> usize {
        self.column_names.len()
    }

    /// Returns true if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.column_names.is_empty()
    }

    /// Name of a column.
    pub fn column_name(&self, col_id: usize) -> Option<&str> {
        self.column_names.get(col_id).map(String::as_str)
    }

    /// Type of a column.
    pub fn column_type(&self, col_id: usize) -> Option<ColumnDataType> {
        self.column_types.get(col_id).copied()
    }

    /// All column names in order.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// All column types in order.
    pub fn column_types(&self) -> &[ColumnDataType] {
        &self.column_types
    }

    /// Position of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }

    /// Iterates `(name, type)` pairs.
    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnDataType)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.column_types.iter().copied())
    }

    /// Sum of all column slot widths: the bytes one row occupies in the
    /// fixed-size region, in either layout.
    pub fn row_width(&self) -> usize {
        self.column_types.iter().map(|t| t.fixed_width()).sum()
    }
}

impl fmt::Display for DataSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (name, ty)) in self.columns().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, ty)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_schema() -> DataSchema {
        DataSchema::new(vec![
            ("id".to_string(), ColumnDataType::Int),
            ("name".to_string(), ColumnDataType::String),
            ("score".to_string(), ColumnDataType::Double),
            ("city".to_string(), ColumnDataType::DictString),
        ])
    }

    #[test]
    fn test_type_codes_roundtrip() {
        for code in 0..=14 {
            let ty = ColumnDataType::from_code(code).unwrap();
            assert_eq!(ty.code(), code);
        }
        assert!(matches!(
            ColumnDataType::from_code(15),
            Err(BlockError::UnknownColumnType { code: 15 })
        ));
    }

    #[test]
    fn test_fixed_widths() {
        assert_eq!(ColumnDataType::Int.fixed_width(), 4);
        assert_eq!(ColumnDataType::Long.fixed_width(), 8);
        assert_eq!(ColumnDataType::Boolean.fixed_width(), 4);
        assert_eq!(ColumnDataType::DictString.fixed_width(), 4);
        assert_eq!(ColumnDataType::String.fixed_width(), 8);
        assert_eq!(ColumnDataType::StringArray.fixed_width(), 8);
        assert!(ColumnDataType::Object.is_variable_width());
        assert!(!ColumnDataType::DictString.is_variable_width());
        assert!(ColumnDataType::FloatArray.is_array());
    }

    #[test]
    fn test_schema_accessors() {
        let schema = test_schema();
        assert_eq!(schema.size(), 4);
        assert_eq!(schema.column_name(1), Some("name"));
        assert_eq!(schema.column_type(2), Some(ColumnDataType::Double));
        assert_eq!(schema.column_type(9), None);
        assert_eq!(schema.index_of("city"), Some(3));
        assert_eq!(schema.index_of("missing"), None);
        assert_eq!(schema.row_width(), 4 + 8 + 8 + 4);
    }

    #[test]
    fn test_from_parts_length_mismatch() {
        let err = DataSchema::from_parts(vec!["a".into()], vec![]).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_display() {
        let schema = DataSchema::new(vec![
            ("a".to_string(), ColumnDataType::Int),
            ("b".to_string(), ColumnDataType::StringArray),
        ]);
        assert_eq!(schema.to_string(), "[a: INT, b: STRING_ARRAY]");
    }
}
