//! # strata-block
//!
//! The intermediate wire format for relational result data moving between
//! stages of a distributed query.
//!
//! A data block is a self-describing binary unit made of a shared framing
//! (version tag, schema, dictionary, metadata, exceptions) and two byte
//! regions:
//!
//! - the **fixed-size region**, holding constant-width values and
//!   `(offset, length)` pointer pairs, and
//! - the **variable-size region**, holding strings, arrays, serialized
//!   objects, and null bitmaps addressed by those pointer pairs.
//!
//! Two physical layouts share that framing: [`RowDataBlock`] (row-major) and
//! [`ColumnarDataBlock`] (column-major). The layout is encoded in the high
//! bits of the version tag, so a receiver can dispatch with
//! [`utils::from_bytes`] before parsing anything else.
//!
//! ## Wire Format
//!
//! ```text
//! +-------------+----------+--------+------------+----------+------------+
//! | VersionTag  | NumRows  | Schema | Dictionary | Metadata | Exceptions |
//! +-------------+----------+--------+------------+----------+------------+
//! | FixedLen(4) | Fixed region bytes | VarLen(4) | Variable region bytes |
//! +-------------+--------------------+-----------+-----------------------+
//! ```
//!
//! All integers are big-endian.
//!
//! ## Example
//!
//! ```rust
//! use strata_block::{utils, ColumnDataType, DataBlock, DataBlockBuilder, DataSchema, Value};
//!
//! let schema = DataSchema::new(vec![
//!     ("id".to_string(), ColumnDataType::Int),
//!     ("name".to_string(), ColumnDataType::String),
//! ]);
//! let mut builder = DataBlockBuilder::row(schema);
//! builder.add_row(vec![Value::Int(7), Value::String("a".into())]).unwrap();
//! let block = builder.build().unwrap();
//!
//! let received = utils::from_bytes(block.to_bytes().unwrap()).unwrap();
//! assert_eq!(received.get_int(0, 0).unwrap(), 7);
//! assert_eq!(received.get_string(0, 1).unwrap(), "a");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod builder;
mod error;
mod metadata;
mod schema;
mod value;

/// Data block framing and the concrete layouts.
pub mod block;

/// Object and bitmap codecs plus wire primitives.
pub mod codec;

/// Layout dispatch, tag helpers, and canned blocks.
pub mod utils;

pub use block::{
    AnyDataBlock, BaseDataBlock, BlockType, ColumnarDataBlock, DataBlock, DictionaryMap,
    RowDataBlock,
};
pub use builder::DataBlockBuilder;
pub use error::{BlockError, BlockResult};
pub use metadata::MetadataKey;
pub use schema::{ColumnDataType, DataSchema};
pub use value::Value;

pub use roaring::RoaringBitmap;
