//! Codecs used by data blocks.
//!
//! Values that the block format does not lay out itself (null bitmaps and
//! arbitrary objects) go through the [`ObjectSerDe`] seam. The block only
//! ever sees the resulting bytes.

mod bitmap;
mod object;
mod wire;

pub use bitmap::{RoaringBitmapSerDe, ROARING_BITMAP_SER_DE};
pub use object::BincodeSerDe;
pub(crate) use wire::{put_len, put_region, put_string, WireReader};

use crate::error::BlockResult;

/// Serializes values of type `T` to bytes and back.
pub trait ObjectSerDe<T> {
    /// Encodes `value`.
    fn serialize(&self, value: &T) -> BlockResult<Vec<u8>>;

    /// Decodes a value previously produced by [`ObjectSerDe::serialize`].
    fn deserialize(&self, bytes: &[u8]) -> BlockResult<T>;
}
