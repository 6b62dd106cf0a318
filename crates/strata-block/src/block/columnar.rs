//! Column-major layout.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use strata_common::config::DataBlockConfig;
use strata_common::constants::CURRENT_DATA_BLOCK_VERSION;

use super::{BaseDataBlock, BlockType, DataBlock, DictionaryMap};
use crate::error::BlockResult;
use crate::schema::DataSchema;
use crate::utils;

/// Data block whose fixed-size region stores each column contiguously.
///
/// ```text
/// | col 0: row 0 | row 1 | ... | col 1: row 0 | row 1 | ... | null pairs |
/// ```
///
/// Row data still occupies exactly `num_rows * row_width` bytes, so null
/// bitmap pointer pairs sit at the same position as in a row block.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnarDataBlock {
    base: BaseDataBlock,
    column_offsets: Vec<usize>,
    column_widths: Vec<usize>,
    row_width: usize,
}

impl ColumnarDataBlock {
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
            column_widths: Vec::new(),
            row_width: 0,
        };
        block.compute_layout_constants();
        block
    }

    /// Parses a serialized columnar block with default limits.
    pub fn from_bytes(bytes: Bytes) -> BlockResult<Self> {
        Self::from_bytes_with_config(bytes, &DataBlockConfig::default())
    }

    /// Parses a serialized columnar block. Fails if the tag names another
    /// layout.
    pub fn from_bytes_with_config(bytes: Bytes, config: &DataBlockConfig) -> BlockResult<Self> {
        utils::decode_layout(bytes, config, BlockType::Columnar).map(Self::from_base)
    }

    /// Slot width of each column.
    pub fn column_widths(&self) -> &[usize] {
        &self.column_widths
    }

    /// Unwraps the framing.
    pub fn into_base(self) -> BaseDataBlock {
        self.base
    }
}

impl DataBlock for ColumnarDataBlock {
    fn base(&self) -> &BaseDataBlock {
        &self.base
    }

    fn block_type(&self) -> BlockType {
        BlockType::Columnar
    }

    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn compute_layout_constants(&mut self) {
        self.column_offsets.clear();
        self.column_widths.clear();
        self.row_width = 0;

        let num_rows = self.base.num_rows();
        if let Some(schema) = self.base.schema() {
            let mut start = 0;
            for ty in schema.column_types() {
                let width = ty.fixed_width();
                self.column_offsets.push(start);
                self.column_widths.push(width);
                start += num_rows * width;
                self.row_width += width;
            }
        }
    }

    fn row_width(&self) -> usize {
        self.row_width
    }

    fn column_offsets(&self) -> &[usize] {
        &self.column_offsets
    }

    fn position_fixed(&self, row_id: usize, col_id: usize) -> BlockResult<usize> {
        self.base.check_position(row_id, col_id)?;
        Ok(self.column_offsets[col_id] + row_id * self.column_widths[col_id])
    }

    fn to_metadata_only(&self) -> Self {
        Self::from_base(self.base.metadata_projection())
    }

    fn to_data_only(&self) -> Self {
        Self {
            base: self.base.data_projection(),
            column_offsets: self.column_offsets.clone(),
            column_widths: self.column_widths.clone(),
            row_width: self.row_width,
        }
    }
}
