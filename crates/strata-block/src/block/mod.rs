//! Data block framing, the [`DataBlock`] trait, and the concrete layouts.
//!
//! Every layout shares [`BaseDataBlock`] and only decides where a
//! `(row, column)` slot lives inside the fixed-size region. All typed reads
//! are provided methods of [`DataBlock`] built on top of
//! [`DataBlock::position_fixed`].

mod any;
mod base;
mod columnar;
mod row;

pub use any::AnyDataBlock;
pub use base::{BaseDataBlock, DictionaryMap};
pub use columnar::ColumnarDataBlock;
pub use row::RowDataBlock;

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use roaring::RoaringBitmap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use strata_common::constants::{DOUBLE_BYTES, FLOAT_BYTES, INT_BYTES, LONG_BYTES};

use crate::codec::{BincodeSerDe, ObjectSerDe, WireReader};
use crate::error::{BlockError, BlockResult};
use crate::schema::{ColumnDataType, DataSchema};
use crate::utils;
use crate::value::Value;

/// Physical arrangement of the fixed-size region.
///
/// The ordinal is stored in the high bits of the version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    /// Row-major: each row's slots are contiguous.
    Row,
    /// Column-major: each column's slots are contiguous.
    Columnar,
}

impl BlockType {
    /// Ordinal stored in the version tag.
    pub const fn ordinal(self) -> u32 {
        match self {
            Self::Row => 0,
            Self::Columnar => 1,
        }
    }

    /// Looks up a block type by ordinal.
    pub const fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Row),
            1 => Some(Self::Columnar),
            _ => None,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row => write!(f, "ROW"),
            Self::Columnar => write!(f, "COLUMNAR"),
        }
    }
}

/// A data block with a concrete fixed-region layout.
///
/// Implementors supply the framing ([`DataBlock::base`]) and the layout
/// constants. Everything else, including typed random access and
/// serialization, is provided.
///
/// Every positional read is a pure function of the block: it returns an
/// owned value or an independent `Bytes` slice and never moves a shared
/// cursor, so a block may be read from many threads at once.
pub trait DataBlock: fmt::Debug + Send + Sync {
    /// Layout-independent framing.
    fn base(&self) -> &BaseDataBlock;

    /// Layout discriminant.
    fn block_type(&self) -> BlockType;

    /// Format version written in the header.
    fn version(&self) -> u32;

    /// Derives per-column offsets and the row width from the schema.
    ///
    /// Constructors call this once; calling it again recomputes identical
    /// values.
    fn compute_layout_constants(&mut self);

    /// Sum of all column slot widths.
    fn row_width(&self) -> usize;

    /// Per-column byte offsets computed by
    /// [`DataBlock::compute_layout_constants`].
    fn column_offsets(&self) -> &[usize];

    /// Byte position of the slot for `(row_id, col_id)` in the fixed-size
    /// region.
    fn position_fixed(&self, row_id: usize, col_id: usize) -> BlockResult<usize>;

    /// New block with this block's metadata and exceptions and no data.
    fn to_metadata_only(&self) -> Self
    where
        Self: Sized;

    /// New block with this block's data and no metadata or exceptions.
    fn to_data_only(&self) -> Self
    where
        Self: Sized;

    /// `version + (block_type << VERSION_TYPE_SHIFT)`.
    fn version_tag(&self) -> u32 {
        utils::version_tag(self.version(), self.block_type())
    }

    /// Number of rows.
    fn num_rows(&self) -> usize {
        self.base().num_rows()
    }

    /// Number of columns.
    fn num_columns(&self) -> usize {
        self.base().num_columns()
    }

    /// Block schema, `None` for metadata-only blocks.
    fn schema(&self) -> Option<&DataSchema> {
        self.base().schema()
    }

    /// Dictionaries of dictionary-encoded columns.
    fn dictionary(&self) -> &DictionaryMap {
        self.base().dictionary()
    }

    /// Execution statistics.
    fn metadata(&self) -> &BTreeMap<String, String> {
        self.base().metadata()
    }

    /// Error code to message.
    fn exceptions(&self) -> &BTreeMap<i32, String> {
        self.base().exceptions()
    }

    /// Resolves the pointer pair of a variable-width cell into an
    /// `(offset, length)` range of the variable-size region.
    fn position_variable(&self, row_id: usize, col_id: usize) -> BlockResult<(usize, usize)> {
        let range = pointer_range(self, row_id, col_id, "variable-width column", |ty| {
            ty.is_variable_width()
        })?;
        Ok((range.start, range.len()))
    }

    /// Payload bytes of a variable-width cell.
    fn variable_bytes(&self, row_id: usize, col_id: usize) -> BlockResult<Bytes> {
        let (offset, length) = self.position_variable(row_id, col_id)?;
        Ok(self
            .base()
            .variable_size_data()
            .slice(offset..offset + length))
    }

    /// Null row ids of `col_id`.
    ///
    /// `Ok(None)` means the block carries no null information at all, which
    /// is not the same as `Ok(Some(empty))`. Callers must keep the two
    /// apart.
    fn null_row_ids(&self, col_id: usize) -> BlockResult<Option<RoaringBitmap>> {
        self.base().null_row_ids(self.row_width(), col_id)
    }

    /// Reads an `INT` cell.
    fn get_int(&self, row_id: usize, col_id: usize) -> BlockResult<i32> {
        fixed_slot(self, row_id, col_id, "INT", |ty| ty == ColumnDataType::Int)
            .map(i32::from_be_bytes)
    }

    /// Reads a `LONG` cell.
    fn get_long(&self, row_id: usize, col_id: usize) -> BlockResult<i64> {
        fixed_slot(self, row_id, col_id, "LONG", |ty| ty == ColumnDataType::Long)
            .map(i64::from_be_bytes)
    }

    /// Reads a `FLOAT` cell.
    fn get_float(&self, row_id: usize, col_id: usize) -> BlockResult<f32> {
        fixed_slot(self, row_id, col_id, "FLOAT", |ty| ty == ColumnDataType::Float)
            .map(f32::from_be_bytes)
    }

    /// Reads a `DOUBLE` cell.
    fn get_double(&self, row_id: usize, col_id: usize) -> BlockResult<f64> {
        fixed_slot(self, row_id, col_id, "DOUBLE", |ty| {
            ty == ColumnDataType::Double
        })
        .map(f64::from_be_bytes)
    }

    /// Reads a `BOOLEAN` cell. Any non-zero slot is true.
    fn get_boolean(&self, row_id: usize, col_id: usize) -> BlockResult<bool> {
        fixed_slot(self, row_id, col_id, "BOOLEAN", |ty| {
            ty == ColumnDataType::Boolean
        })
        .map(|raw| i32::from_be_bytes(raw) != 0)
    }

    /// Reads a `TIMESTAMP` cell as milliseconds since the epoch.
    fn get_timestamp(&self, row_id: usize, col_id: usize) -> BlockResult<i64> {
        fixed_slot(self, row_id, col_id, "TIMESTAMP", |ty| {
            ty == ColumnDataType::Timestamp
        })
        .map(i64::from_be_bytes)
    }

    /// Reads a `STRING` or `DICT_STRING` cell.
    fn get_string(&self, row_id: usize, col_id: usize) -> BlockResult<String> {
        let position = self.position_fixed(row_id, col_id)?;
        let base = self.base();
        match base.column_type(col_id)? {
            ColumnDataType::DictString => {
                let code = base.read_i32(position)?;
                base.dictionary_value(col_id, code)
            }
            ColumnDataType::String => {
                let (offset, length) = base.read_pointer_pair(position)?;
                let range = base.resolve_pointer(offset, length)?;
                std::str::from_utf8(&base.variable_size_data()[range])
                    .map(str::to_owned)
                    .map_err(|source| BlockError::InvalidUtf8 {
                        section: "variable-size region",
                        source,
                    })
            }
            actual => Err(BlockError::TypeMismatch {
                col_id,
                expected: "STRING",
                actual,
            }),
        }
    }

    /// Reads a `BYTES` or `OBJECT` cell as raw bytes.
    fn get_bytes(&self, row_id: usize, col_id: usize) -> BlockResult<Bytes> {
        let range = pointer_range(self, row_id, col_id, "BYTES", |ty| {
            matches!(ty, ColumnDataType::Bytes | ColumnDataType::Object)
        })?;
        Ok(self.base().variable_size_data().slice(range))
    }

    /// Decodes an `OBJECT` cell with the object codec.
    fn get_object<T>(&self, row_id: usize, col_id: usize) -> BlockResult<T>
    where
        Self: Sized,
        T: Serialize + DeserializeOwned,
    {
        let range = pointer_range(self, row_id, col_id, "OBJECT", |ty| {
            ty == ColumnDataType::Object
        })?;
        BincodeSerDe.deserialize(&self.base().variable_size_data()[range])
    }

    /// Reads an `INT_ARRAY` cell.
    fn get_int_array(&self, row_id: usize, col_id: usize) -> BlockResult<Vec<i32>> {
        let payload = array_payload(self, row_id, col_id, ColumnDataType::IntArray)?;
        unpack::<INT_BYTES, _>(&payload, i32::from_be_bytes)
    }

    /// Reads a `LONG_ARRAY` cell.
    fn get_long_array(&self, row_id: usize, col_id: usize) -> BlockResult<Vec<i64>> {
        let payload = array_payload(self, row_id, col_id, ColumnDataType::LongArray)?;
        unpack::<LONG_BYTES, _>(&payload, i64::from_be_bytes)
    }

    /// Reads a `FLOAT_ARRAY` cell.
    fn get_float_array(&self, row_id: usize, col_id: usize) -> BlockResult<Vec<f32>> {
        let payload = array_payload(self, row_id, col_id, ColumnDataType::FloatArray)?;
        unpack::<FLOAT_BYTES, _>(&payload, f32::from_be_bytes)
    }

    /// Reads a `DOUBLE_ARRAY` cell.
    fn get_double_array(&self, row_id: usize, col_id: usize) -> BlockResult<Vec<f64>> {
        let payload = array_payload(self, row_id, col_id, ColumnDataType::DoubleArray)?;
        unpack::<DOUBLE_BYTES, _>(&payload, f64::from_be_bytes)
    }

    /// Reads a `STRING_ARRAY` cell.
    fn get_string_array(&self, row_id: usize, col_id: usize) -> BlockResult<Vec<String>> {
        let payload = array_payload(self, row_id, col_id, ColumnDataType::StringArray)?;
        let mut reader = WireReader::new(payload, usize::MAX);
        let mut values = Vec::new();
        while reader.remaining() > 0 {
            values.push(reader.get_string("string array")?);
        }
        Ok(values)
    }

    /// Reads one cell as a [`Value`] without consulting null bitmaps.
    fn get_value(&self, row_id: usize, col_id: usize) -> BlockResult<Value> {
        self.base().check_position(row_id, col_id)?;
        let value = match self.base().column_type(col_id)? {
            ColumnDataType::Int => Value::Int(self.get_int(row_id, col_id)?),
            ColumnDataType::Long => Value::Long(self.get_long(row_id, col_id)?),
            ColumnDataType::Float => Value::Float(self.get_float(row_id, col_id)?),
            ColumnDataType::Double => Value::Double(self.get_double(row_id, col_id)?),
            ColumnDataType::Boolean => Value::Boolean(self.get_boolean(row_id, col_id)?),
            ColumnDataType::Timestamp => Value::Timestamp(self.get_timestamp(row_id, col_id)?),
            ColumnDataType::String | ColumnDataType::DictString => {
                Value::String(self.get_string(row_id, col_id)?)
            }
            ColumnDataType::Bytes => Value::Bytes(self.get_bytes(row_id, col_id)?.to_vec()),
            ColumnDataType::Object => Value::Object(self.get_bytes(row_id, col_id)?.to_vec()),
            ColumnDataType::IntArray => Value::IntArray(self.get_int_array(row_id, col_id)?),
            ColumnDataType::LongArray => Value::LongArray(self.get_long_array(row_id, col_id)?),
            ColumnDataType::FloatArray => {
                Value::FloatArray(self.get_float_array(row_id, col_id)?)
            }
            ColumnDataType::DoubleArray => {
                Value::DoubleArray(self.get_double_array(row_id, col_id)?)
            }
            ColumnDataType::StringArray => {
                Value::StringArray(self.get_string_array(row_id, col_id)?)
            }
        };
        Ok(value)
    }

    /// Reads every column of one row. Cells marked null in a column's
    /// bitmap come back as [`Value::Null`].
    fn get_row(&self, row_id: usize) -> BlockResult<Vec<Value>> {
        if row_id >= self.num_rows() {
            return Err(BlockError::OutOfRange {
                row_id,
                col_id: 0,
                num_rows: self.num_rows(),
                num_columns: self.num_columns(),
            });
        }
        let null_bitmaps = self.null_bitmaps()?;
        read_row(self, row_id, &null_bitmaps)
    }

    /// Reads every row. Null bitmaps are decoded once.
    fn rows(&self) -> BlockResult<Vec<Vec<Value>>> {
        let null_bitmaps = self.null_bitmaps()?;
        (0..self.num_rows())
            .map(|row_id| read_row(self, row_id, &null_bitmaps))
            .collect()
    }

    /// Null bitmaps of every column, in schema order.
    fn null_bitmaps(&self) -> BlockResult<Vec<Option<RoaringBitmap>>> {
        (0..self.num_columns())
            .map(|col_id| self.null_row_ids(col_id))
            .collect()
    }

    /// Serializes the block.
    fn to_bytes(&self) -> BlockResult<Bytes> {
        let bytes = self.base().serialize(self.version_tag())?;
        tracing::debug!(
            "Serialized {} data block v{}: {} rows, {} bytes",
            self.block_type(),
            self.version(),
            self.num_rows(),
            bytes.len()
        );
        Ok(bytes)
    }
}

fn check_type<B: DataBlock + ?Sized>(
    block: &B,
    col_id: usize,
    expected: &'static str,
    accepts: impl Fn(ColumnDataType) -> bool,
) -> BlockResult<()> {
    let actual = block.base().column_type(col_id)?;
    if !accepts(actual) {
        return Err(BlockError::TypeMismatch {
            col_id,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Reads the raw slot of a fixed-width cell.
fn fixed_slot<const N: usize, B: DataBlock + ?Sized>(
    block: &B,
    row_id: usize,
    col_id: usize,
    expected: &'static str,
    accepts: impl Fn(ColumnDataType) -> bool,
) -> BlockResult<[u8; N]> {
    let position = block.position_fixed(row_id, col_id)?;
    check_type(block, col_id, expected, accepts)?;
    block.base().read_fixed(position)
}

/// Resolves the pointer pair of a variable-width cell.
fn pointer_range<B: DataBlock + ?Sized>(
    block: &B,
    row_id: usize,
    col_id: usize,
    expected: &'static str,
    accepts: impl Fn(ColumnDataType) -> bool,
) -> BlockResult<std::ops::Range<usize>> {
    let position = block.position_fixed(row_id, col_id)?;
    check_type(block, col_id, expected, accepts)?;
    let base = block.base();
    let (offset, length) = base.read_pointer_pair(position)?;
    base.resolve_pointer(offset, length)
}

fn array_payload<B: DataBlock + ?Sized>(
    block: &B,
    row_id: usize,
    col_id: usize,
    ty: ColumnDataType,
) -> BlockResult<Bytes> {
    let range = pointer_range(block, row_id, col_id, ty.name(), |actual| actual == ty)?;
    Ok(block.base().variable_size_data().slice(range))
}

/// Splits a packed array payload into big-endian elements of `N` bytes.
fn unpack<const N: usize, T>(payload: &[u8], decode: fn([u8; N]) -> T) -> BlockResult<Vec<T>> {
    if payload.len() % N != 0 {
        return Err(BlockError::length_mismatch(
            "variable-size region",
            format!(
                "array payload of {} bytes is not a multiple of {}",
                payload.len(),
                N
            ),
        ));
    }
    Ok(payload
        .chunks_exact(N)
        .map(|chunk| {
            let mut raw = [0u8; N];
            raw.copy_from_slice(chunk);
            decode(raw)
        })
        .collect())
}

fn read_row<B: DataBlock + ?Sized>(
    block: &B,
    row_id: usize,
    null_bitmaps: &[Option<RoaringBitmap>],
) -> BlockResult<Vec<Value>> {
    null_bitmaps
        .iter()
        .enumerate()
        .map(|(col_id, nulls)| {
            let is_null = nulls
                .as_ref()
                .is_some_and(|bitmap| bitmap.contains(row_id as u32));
            if is_null {
                Ok(Value::Null)
            } else {
                block.get_value(row_id, col_id)
            }
        })
        .collect()
}
