//! Data block error types.

use thiserror::Error;

use crate::schema::ColumnDataType;

/// Result type for data block operations.
pub type BlockResult<T> = Result<T, BlockError>;

/// Errors that can occur while building, encoding, decoding, or reading a
/// data block.
///
/// Variants fall into two classes:
/// - format errors ([`BlockError::is_format_error`]): the bytes are not a
///   valid block, and the block is rejected as a whole;
/// - programming errors ([`BlockError::is_programming_error`]): the caller
///   addressed a row or column that does not exist, or used the wrong
///   accessor for a column type.
#[derive(Debug, Error)]
pub enum BlockError {
    /// Buffer ended before a section was complete.
    #[error("data block truncated in {section}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        section: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// A declared length disagrees with the data around it.
    #[error("data block length mismatch in {section}: {reason}")]
    LengthMismatch {
        section: &'static str,
        reason: String,
    },

    /// Bytes left over after the variable-size region.
    #[error("{remaining} trailing bytes after data block")]
    TrailingBytes { remaining: usize },

    /// Layout discriminant in the version tag is not a known block type.
    #[error("unknown data block type {block_type} in version tag {tag:#010x}")]
    UnknownBlockType { tag: u32, block_type: u32 },

    /// Format version is newer than this reader understands.
    #[error("unsupported data block version: found {found}, max supported {max}")]
    UnsupportedVersion { found: u32, max: u32 },

    /// Schema carries an unknown column type code.
    #[error("unknown column type code: {code}")]
    UnknownColumnType { code: u32 },

    /// A string field is not valid UTF-8.
    #[error("invalid UTF-8 in {section}: {source}")]
    InvalidUtf8 {
        section: &'static str,
        #[source]
        source: std::str::Utf8Error,
    },

    /// Serialized block exceeds the configured limit.
    #[error("data block too large: {size} bytes exceeds maximum {max} bytes")]
    BlockTooLarge { size: usize, max: usize },

    /// Structurally impossible block (e.g. rows without a schema).
    #[error("malformed data block: {reason}")]
    Malformed { reason: String },

    /// A pointer pair addresses bytes outside the variable-size region.
    #[error("pointer (offset {offset}, length {length}) outside variable-size region of {region_len} bytes")]
    PointerOutOfBounds {
        offset: i32,
        length: i32,
        region_len: usize,
    },

    /// Dictionary-encoded value has no entry.
    #[error("no dictionary entry {code} for column '{column}'")]
    MissingDictionary { column: String, code: i32 },

    /// Null bitmap bytes could not be encoded or decoded.
    #[error("bitmap codec error: {reason}")]
    BitmapCodec { reason: String },

    /// Object bytes could not be encoded or decoded.
    #[error("object codec error: {reason}")]
    ObjectCodec { reason: String },

    /// Row or column index outside the block.
    #[error("position (row {row_id}, column {col_id}) out of range for block with {num_rows} rows and {num_columns} columns")]
    OutOfRange {
        row_id: usize,
        col_id: usize,
        num_rows: usize,
        num_columns: usize,
    },

    /// Accessor does not match the column type.
    #[error("column {col_id} has type {actual}, cannot read as {expected}")]
    TypeMismatch {
        col_id: usize,
        expected: &'static str,
        actual: ColumnDataType,
    },

    /// Row handed to a builder does not fit the schema.
    #[error("invalid row: {reason}")]
    InvalidRow { reason: String },
}

impl BlockError {
    /// Creates a truncation error.
    pub fn truncated(section: &'static str, needed: usize, remaining: usize) -> Self {
        Self::Truncated {
            section,
            needed,
            remaining,
        }
    }

    /// Creates a length mismatch error.
    pub fn length_mismatch(section: &'static str, reason: impl Into<String>) -> Self {
        Self::LengthMismatch {
            section,
            reason: reason.into(),
        }
    }

    /// Creates a malformed block error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Creates a bitmap codec error.
    pub fn bitmap_codec(reason: impl Into<String>) -> Self {
        Self::BitmapCodec {
            reason: reason.into(),
        }
    }

    /// Creates an object codec error.
    pub fn object_codec(reason: impl Into<String>) -> Self {
        Self::ObjectCodec {
            reason: reason.into(),
        }
    }

    /// Creates an invalid row error.
    pub fn invalid_row(reason: impl Into<String>) -> Self {
        Self::InvalidRow {
            reason: reason.into(),
        }
    }

    /// Returns true if the bytes of a block are invalid.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. }
                | Self::LengthMismatch { .. }
                | Self::TrailingBytes { .. }
                | Self::UnknownBlockType { .. }
                | Self::UnsupportedVersion { .. }
                | Self::UnknownColumnType { .. }
                | Self::InvalidUtf8 { .. }
                | Self::BlockTooLarge { .. }
                | Self::Malformed { .. }
                | Self::PointerOutOfBounds { .. }
                | Self::MissingDictionary { .. }
                | Self::BitmapCodec { .. }
                | Self::ObjectCodec { .. }
        )
    }

    /// Returns true if the caller misused the block API.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Self::OutOfRange { .. } | Self::TypeMismatch { .. } | Self::InvalidRow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = BlockError::truncated("schema", 8, 3);
        assert!(err.is_format_error());
        assert!(!err.is_programming_error());

        let err = BlockError::UnknownBlockType {
            tag: 0x61,
            block_type: 3,
        };
        assert!(err.is_format_error());

        let err = BlockError::OutOfRange {
            row_id: 5,
            col_id: 0,
            num_rows: 2,
            num_columns: 1,
        };
        assert!(err.is_programming_error());
        assert!(!err.is_format_error());

        let err = BlockError::TypeMismatch {
            col_id: 1,
            expected: "INT",
            actual: ColumnDataType::String,
        };
        assert!(err.is_programming_error());
    }

    #[test]
    fn test_error_display() {
        let err = BlockError::truncated("fixed-size region", 100, 12);
        let msg = err.to_string();
        assert!(msg.contains("fixed-size region"));
        assert!(msg.contains("100"));
        assert!(msg.contains("12"));

        let err = BlockError::TypeMismatch {
            col_id: 1,
            expected: "INT",
            actual: ColumnDataType::String,
        };
        assert_eq!(err.to_string(), "column 1 has type STRING, cannot read as INT");
    }
}
