//! Length-prefixed wire primitives.
//!
//! Every integer is big-endian. Strings and regions are a `u32` byte length
//! followed by exactly that many bytes.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{BlockError, BlockResult};

/// Writes a `u32` count or length, rejecting values that do not fit.
pub(crate) fn put_len(buf: &mut BytesMut, len: usize) -> BlockResult<()> {
    let len = u32::try_from(len).map_err(|_| BlockError::BlockTooLarge {
        size: len,
        max: u32::MAX as usize,
    })?;
    buf.put_u32(len);
    Ok(())
}

/// Writes a length-prefixed UTF-8 string.
pub(crate) fn put_string(buf: &mut BytesMut, s: &str) -> BlockResult<()> {
    put_region(buf, s.as_bytes())
}

/// Writes a length-prefixed byte region.
pub(crate) fn put_region(buf: &mut BytesMut, bytes: &[u8]) -> BlockResult<()> {
    put_len(buf, bytes.len())?;
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Bounds-checked reader over a received block.
///
/// Regions are returned as slices of the input `Bytes`, so parsing a block
/// never copies its fixed-size or variable-size data.
pub(crate) struct WireReader {
    buf: Bytes,
    pos: usize,
    max_string_length: usize,
}

impl WireReader {
    pub(crate) fn new(buf: Bytes, max_string_length: usize) -> Self {
        Self {
            buf,
            pos: 0,
            max_string_length,
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn ensure(&self, section: &'static str, needed: usize) -> BlockResult<()> {
        if self.remaining() < needed {
            return Err(BlockError::truncated(section, needed, self.remaining()));
        }
        Ok(())
    }

    fn take(&mut self, section: &'static str, len: usize) -> BlockResult<Bytes> {
        self.ensure(section, len)?;
        let out = self.buf.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(out)
    }

    pub(crate) fn get_u32(&mut self, section: &'static str) -> BlockResult<u32> {
        self.ensure(section, 4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(u32::from_be_bytes(raw))
    }

    pub(crate) fn get_i32(&mut self, section: &'static str) -> BlockResult<i32> {
        self.get_u32(section).map(|v| v as i32)
    }

    /// Reads an element count and rejects counts that could not possibly fit
    /// in the rest of the buffer, given each element needs at least
    /// `min_element_bytes`.
    pub(crate) fn get_count(
        &mut self,
        section: &'static str,
        min_element_bytes: usize,
    ) -> BlockResult<usize> {
        let count = self.get_u32(section)? as usize;
        let needed = count.saturating_mul(min_element_bytes);
        if needed > self.remaining() {
            return Err(BlockError::length_mismatch(
                section,
                format!(
                    "count {} needs at least {} bytes, {} remaining",
                    count,
                    needed,
                    self.remaining()
                ),
            ));
        }
        Ok(count)
    }

    /// Reads a length-prefixed string of at most `max_string_length` bytes.
    pub(crate) fn get_string(&mut self, section: &'static str) -> BlockResult<String> {
        let len = self.get_u32(section)? as usize;
        if len > self.max_string_length {
            return Err(BlockError::length_mismatch(
                section,
                format!(
                    "string of {} bytes exceeds maximum {}",
                    len, self.max_string_length
                ),
            ));
        }
        let raw = self.take(section, len)?;
        std::str::from_utf8(&raw)
            .map(str::to_owned)
            .map_err(|source| BlockError::InvalidUtf8 { section, source })
    }

    /// Reads a length-prefixed region. Regions are bounded by the buffer
    /// itself, which the caller has already checked against the block size
    /// limit.
    pub(crate) fn get_region(&mut self, section: &'static str) -> BlockResult<Bytes> {
        let len = self.get_u32(section)? as usize;
        self.take(section, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_and_region() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "hello").unwrap();
        put_region(&mut buf, &[1, 2, 3]).unwrap();
        buf.put_u32(7);

        let mut reader = WireReader::new(buf.freeze(), 1024);
        assert_eq!(reader.get_string("test").unwrap(), "hello");
        assert_eq!(&reader.get_region("test").unwrap()[..], &[1, 2, 3]);
        assert_eq!(reader.get_u32("test").unwrap(), 7);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_string() {
        let mut buf = BytesMut::new();
        buf.put_u32(10);
        buf.extend_from_slice(b"abc");

        let mut reader = WireReader::new(buf.freeze(), 1024);
        let err = reader.get_string("metadata").unwrap_err();
        assert!(matches!(
            err,
            BlockError::Truncated {
                section: "metadata",
                needed: 10,
                remaining: 3
            }
        ));
    }

    #[test]
    fn test_string_limit() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "too long for the limit").unwrap();

        let mut reader = WireReader::new(buf.freeze(), 4);
        assert!(matches!(
            reader.get_string("schema"),
            Err(BlockError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut buf = BytesMut::new();
        put_region(&mut buf, &[0xff, 0xfe]).unwrap();

        let mut reader = WireReader::new(buf.freeze(), 1024);
        assert!(matches!(
            reader.get_string("schema"),
            Err(BlockError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn test_region_not_bound_by_string_limit() {
        let mut buf = BytesMut::new();
        put_region(&mut buf, &[0u8; 16]).unwrap();
        put_string(&mut buf, "abcdefgh").unwrap();

        let mut reader = WireReader::new(buf.freeze(), 4);
        assert_eq!(reader.get_region("fixed-size region").unwrap().len(), 16);
        assert!(matches!(
            reader.get_string("metadata"),
            Err(BlockError::LengthMismatch { .. })
        ));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_length_prefix_overflow() {
        let mut buf = BytesMut::new();
        let err = put_len(&mut buf, u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(
            err,
            BlockError::BlockTooLarge { size, max } if size == u32::MAX as usize + 1 && max == u32::MAX as usize
        ));
        assert!(buf.is_empty());

        put_len(&mut buf, u32::MAX as usize).unwrap();
        assert_eq!(&buf[..], &[0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_implausible_count() {
        let mut buf = BytesMut::new();
        buf.put_u32(u32::MAX);

        let mut reader = WireReader::new(buf.freeze(), 1024);
        assert!(matches!(
            reader.get_count("exceptions", 8),
            Err(BlockError::LengthMismatch { .. })
        ));
    }
}
