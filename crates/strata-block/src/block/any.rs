//! Layout-erased data block returned by dispatch.

use super::{BaseDataBlock, BlockType, ColumnarDataBlock, DataBlock, RowDataBlock};
use crate::error::BlockResult;

/// A data block of either layout.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyDataBlock {
    /// Row-major block.
    Row(RowDataBlock),
    /// Column-major block.
    Columnar(ColumnarDataBlock),
}

impl AnyDataBlock {
    /// Wraps framing in the layout named by `block_type`.
    pub fn from_base(block_type: BlockType, base: BaseDataBlock) -> Self {
        match block_type {
            BlockType::Row => Self::Row(RowDataBlock::from_base(base)),
            BlockType::Columnar => Self::Columnar(ColumnarDataBlock::from_base(base)),
        }
    }

    /// Returns the row block, if this is one.
    pub fn as_row(&self) -> Option<&RowDataBlock> {
        match self {
            Self::Row(block) => Some(block),
            Self::Columnar(_) => None,
        }
    }

    /// Returns the columnar block, if this is one.
    pub fn as_columnar(&self) -> Option<&ColumnarDataBlock> {
        match self {
            Self::Columnar(block) => Some(block),
            Self::Row(_) => None,
        }
    }

    /// Converts into the row block, if this is one.
    pub fn into_row(self) -> Option<RowDataBlock> {
        match self {
            Self::Row(block) => Some(block),
            Self::Columnar(_) => None,
        }
    }

    /// Converts into the columnar block, if this is one.
    pub fn into_columnar(self) -> Option<ColumnarDataBlock> {
        match self {
            Self::Columnar(block) => Some(block),
            Self::Row(_) => None,
        }
    }

    fn inner(&self) -> &dyn DataBlock {
        match self {
            Self::Row(block) => block,
            Self::Columnar(block) => block,
        }
    }
}

impl DataBlock for AnyDataBlock {
    fn base(&self) -> &BaseDataBlock {
        self.inner().base()
    }

    fn block_type(&self) -> BlockType {
        self.inner().block_type()
    }

    fn version(&self) -> u32 {
        self.inner().version()
    }

    fn compute_layout_constants(&mut self) {
        match self {
            Self::Row(block) => block.compute_layout_constants(),
            Self::Columnar(block) => block.compute_layout_constants(),
        }
    }

    fn row_width(&self) -> usize {
        self.inner().row_width()
    }

    fn column_offsets(&self) -> &[usize] {
        self.inner().column_offsets()
    }

    fn position_fixed(&self, row_id: usize, col_id: usize) -> BlockResult<usize> {
        self.inner().position_fixed(row_id, col_id)
    }

    fn to_metadata_only(&self) -> Self {
        match self {
            Self::Row(block) => Self::Row(block.to_metadata_only()),
            Self::Columnar(block) => Self::Columnar(block.to_metadata_only()),
        }
    }

    fn to_data_only(&self) -> Self {
        match self {
            Self::Row(block) => Self::Row(block.to_data_only()),
            Self::Columnar(block) => Self::Columnar(block.to_data_only()),
        }
    }
}

impl From<RowDataBlock> for AnyDataBlock {
    fn from(block: RowDataBlock) -> Self {
        Self::Row(block)
    }
}

impl From<ColumnarDataBlock> for AnyDataBlock {
    fn from(block: ColumnarDataBlock) -> Self {
        Self::Columnar(block)
    }
}
