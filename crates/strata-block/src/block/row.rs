//! Row-major layout.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use strata_common::config::DataBlockConfig;
use strata_common::constants::CURRENT_DATA_BLOCK_VERSION;

use super::{BaseDataBlock, BlockType, DataBlock, DictionaryMap};
use crate::error::BlockResult;
use crate::schema::DataSchema;
use crate::utils;

/// Data block whose fixed-size region stores rows back to back.
///
/// ```text
/// | row 0: col 0 | col 1 | ... | row 1: col 0 | col 1 | ... | null pairs |
/// ```
///
/// Column `c` of row `r` lives at `r * row_width + column_offsets[c]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDataBlock {
    base: BaseDataBlock,
    column_offsets: Vec<usize>,
    row_width: usize,
}

impl RowDataBlock {
    /// Format version written by this layout.
    pub const VERSION: u32 = CURRENT_DATA_BLOCK_VERSION;

    /// Creates a data-only block from raw regions.
    pub fn new(
        num_rows: usize,
        schema: Arc<DataSchema>,
        dictionary: DictionaryMap,
        fixed_size_data: Bytes,
        variable_size_data: Bytes,
    ) -> BlockResult<Self> {
        let base = BaseDataBlock::new(
            num_rows,
            Some(schema),
            dictionary,
            fixed_size_data,
            variable_size_data,
        )?;
        Ok(Self::from_base(base))
    }

    /// Creates a block carrying only metadata and exceptions.
    pub fn metadata_only(
        metadata: BTreeMap<String, String>,
        exceptions: BTreeMap<i32, String>,
    ) -> Self {
        Self::from_base(BaseDataBlock::metadata_only(metadata, exceptions))
    }

    /// Wraps existing framing and computes the layout constants.
    pub fn from_base(base: BaseDataBlock) -> Self {
        let mut block = Self {
            base,
            column_offsets: Vec::new(),
            row_width: 0,
        };
        block.compute_layout_constants();
        block
    }

    /// Parses a serialized row block with default limits.
    pub fn from_bytes(bytes: Bytes) -> BlockResult<Self> {
        Self::from_bytes_with_config(bytes, &DataBlockConfig::default())
    }

    /// Parses a serialized row block. Fails if the tag names another layout.
    pub fn from_bytes_with_config(bytes: Bytes, config: &DataBlockConfig) -> BlockResult<Self> {
        utils::decode_layout(bytes, config, BlockType::Row).map(Self::from_base)
    }

    /// Unwraps the framing.
    pub fn into_base(self) -> BaseDataBlock {
        self.base
    }
}

impl DataBlock for RowDataBlock {
    fn base(&self) -> &BaseDataBlock {
        &self.base
    }

    fn block_type(&self) -> BlockType {
        BlockType::Row
    }

    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn compute_layout_constants(&mut self) {
        self.row_width = match self.base.schema() {
            Some(schema) => utils::compute_column_offsets(schema, &mut self.column_offsets),
            None => {
                self.column_offsets.clear();
                0
            }
        };
    }

    fn row_width(&self) -> usize {
        self.row_width
    }

    fn column_offsets(&self) -> &[usize] {
        &self.column_offsets
    }

    fn position_fixed(&self, row_id: usize, col_id: usize) -> BlockResult<usize> {
        self.base.check_position(row_id, col_id)?;
        Ok(row_id * self.row_width + self.column_offsets[col_id])
    }

    fn to_metadata_only(&self) -> Self {
        Self::from_base(self.base.metadata_projection())
    }

    fn to_data_only(&self) -> Self {
        Self {
            base: self.base.data_projection(),
            column_offsets: self.column_offsets.clone(),
            row_width: self.row_width,
        }
    }
}
