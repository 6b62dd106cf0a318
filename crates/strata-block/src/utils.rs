//! Version tag packing, layout dispatch, and canned blocks.
//!
//! A version tag packs the format version into the low
//! [`VERSION_TYPE_SHIFT`] bits and the [`BlockType`] ordinal above them:
//!
//! ```text
//!  31                5 4       0
//! +-------------------+---------+
//! |    block type     | version |
//! +-------------------+---------+
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use strata_common::config::DataBlockConfig;
use strata_common::constants::{CURRENT_DATA_BLOCK_VERSION, VERSION_MASK, VERSION_TYPE_SHIFT};

use crate::block::{AnyDataBlock, BaseDataBlock, BlockType, DataBlock, RowDataBlock};
use crate::error::{BlockError, BlockResult};
use crate::schema::DataSchema;

/// Packs a version and layout into a version tag.
pub const fn version_tag(version: u32, block_type: BlockType) -> u32 {
    version + (block_type.ordinal() << VERSION_TYPE_SHIFT)
}

/// Extracts the format version from a tag.
pub const fn version_of(tag: u32) -> u32 {
    tag & VERSION_MASK
}

/// Extracts the layout from a tag, rejecting unknown discriminants.
pub fn block_type_of(tag: u32) -> BlockResult<BlockType> {
    let ordinal = tag >> VERSION_TYPE_SHIFT;
    BlockType::from_ordinal(ordinal).ok_or_else(|| {
        tracing::warn!("Rejecting data block with unknown type {} (tag {:#x})", ordinal, tag);
        BlockError::UnknownBlockType {
            tag,
            block_type: ordinal,
        }
    })
}

/// Fills `offsets` with row-major column offsets and returns the row width.
///
/// Each column's offset is the running sum of the slot widths before it.
/// Variable-width columns count as one pointer pair, never their payload.
pub fn compute_column_offsets(schema: &DataSchema, offsets: &mut Vec<usize>) -> usize {
    offsets.clear();
    offsets.reserve(schema.size());
    let mut row_width = 0;
    for ty in schema.column_types() {
        offsets.push(row_width);
        row_width += ty.fixed_width();
    }
    row_width
}

/// Parses a block of any layout with default limits.
pub fn from_bytes(bytes: Bytes) -> BlockResult<AnyDataBlock> {
    from_bytes_with_config(bytes, &DataBlockConfig::default())
}

/// Parses a block of any layout, dispatching on the tag.
pub fn from_bytes_with_config(bytes: Bytes, config: &DataBlockConfig) -> BlockResult<AnyDataBlock> {
    let (block_type, base) = decode(bytes, config)?;
    Ok(AnyDataBlock::from_base(block_type, base))
}

/// Checks that a tag names a known layout and a readable version.
pub fn check_version_tag(tag: u32) -> BlockResult<BlockType> {
    let block_type = block_type_of(tag)?;
    let version = version_of(tag);
    if version > CURRENT_DATA_BLOCK_VERSION {
        tracing::warn!(
            "Rejecting {} data block with unsupported version {}",
            block_type,
            version
        );
        return Err(BlockError::UnsupportedVersion {
            found: version,
            max: CURRENT_DATA_BLOCK_VERSION,
        });
    }
    Ok(block_type)
}

/// Parses the framing and returns it with the layout named by its tag.
pub(crate) fn decode(bytes: Bytes, config: &DataBlockConfig) -> BlockResult<(BlockType, BaseDataBlock)> {
    let size = bytes.len();
    let (tag, base) = BaseDataBlock::deserialize(bytes, config)?;
    let block_type = check_version_tag(tag)?;

    tracing::debug!(
        "Parsed {} data block v{}: {} rows, {} columns, {} bytes",
        block_type,
        version_of(tag),
        base.num_rows(),
        base.num_columns(),
        size
    );
    Ok((block_type, base))
}

/// Parses the framing of a block that must have layout `expected`.
pub(crate) fn decode_layout(
    bytes: Bytes,
    config: &DataBlockConfig,
    expected: BlockType,
) -> BlockResult<BaseDataBlock> {
    let (block_type, base) = decode(bytes, config)?;
    if block_type != expected {
        return Err(BlockError::malformed(format!(
            "expected {} data block, found {}",
            expected, block_type
        )));
    }
    Ok(base)
}

/// Metadata-only block carrying a single exception.
pub fn error_block(code: impl Into<i32>, message: impl Into<String>) -> RowDataBlock {
    let mut exceptions = BTreeMap::new();
    exceptions.insert(code.into(), message.into());
    error_block_from(exceptions)
}

/// Metadata-only block carrying the given exceptions.
pub fn error_block_from(exceptions: BTreeMap<i32, String>) -> RowDataBlock {
    RowDataBlock::metadata_only(BTreeMap::new(), exceptions)
}

/// Zero-row block that keeps `schema`, sent to mark the end of a stream.
pub fn end_of_stream_block(schema: Arc<DataSchema>) -> RowDataBlock {
    RowDataBlock::from_base(BaseDataBlock::empty(schema))
}

/// Returns true if `block` carries exceptions.
pub fn is_error_block<B: DataBlock + ?Sized>(block: &B) -> bool {
    !block.exceptions().is_empty()
}

/// Returns true if `block` is an end-of-stream marker: no rows, no
/// exceptions.
pub fn is_end_of_stream<B: DataBlock + ?Sized>(block: &B) -> bool {
    block.num_rows() == 0 && block.exceptions().is_empty()
}
