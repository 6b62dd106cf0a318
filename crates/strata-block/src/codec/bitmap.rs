//! Null bitmap codec.

use roaring::RoaringBitmap;

use super::ObjectSerDe;
use crate::error::{BlockError, BlockResult};

/// Encodes null row sets with the portable roaring serialization format.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoaringBitmapSerDe;

/// Shared codec instance.
pub const ROARING_BITMAP_SER_DE: RoaringBitmapSerDe = RoaringBitmapSerDe;

impl ObjectSerDe<RoaringBitmap> for RoaringBitmapSerDe {
    fn serialize(&self, value: &RoaringBitmap) -> BlockResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(value.serialized_size());
        value
            .serialize_into(&mut buf)
            .map_err(|e| BlockError::bitmap_codec(e.to_string()))?;
        Ok(buf)
    }

    fn deserialize(&self, bytes: &[u8]) -> BlockResult<RoaringBitmap> {
        RoaringBitmap::deserialize_from(bytes).map_err(|e| BlockError::bitmap_codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_roundtrip() {
        let bitmap: RoaringBitmap = [1u32, 3, 5, 70_000].into_iter().collect();
        let bytes = ROARING_BITMAP_SER_DE.serialize(&bitmap).unwrap();
        let decoded = ROARING_BITMAP_SER_DE.deserialize(&bytes).unwrap();
        assert_eq!(decoded, bitmap);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = ROARING_BITMAP_SER_DE
            .deserialize(&[0xde, 0xad, 0xbe, 0xef])
            .unwrap_err();
        assert!(matches!(err, BlockError::BitmapCodec { .. }));
    }
}
