//! System-wide constants for Strata.
//!
//! These values are part of the data block wire format. Changing any of
//! them breaks compatibility with buffers produced by other stages.

// =============================================================================
// Primitive Widths
// =============================================================================

/// Width of a serialized `i32`/`u32` in bytes.
pub const INT_BYTES: usize = 4;

/// Width of a serialized `i64` in bytes.
pub const LONG_BYTES: usize = 8;

/// Width of a serialized `f32` in bytes.
pub const FLOAT_BYTES: usize = 4;

/// Width of a serialized `f64` in bytes.
pub const DOUBLE_BYTES: usize = 8;

/// Width of an (offset, length) pointer pair into the variable-size region.
pub const POINTER_PAIR_BYTES: usize = 2 * INT_BYTES;

// =============================================================================
// Version Tag Layout
// =============================================================================

/// Bit shift separating the format version (low bits) from the block type
/// ordinal (high bits) in a data block version tag.
pub const VERSION_TYPE_SHIFT: u32 = 5;

/// Mask extracting the format version from a version tag.
pub const VERSION_MASK: u32 = (1 << VERSION_TYPE_SHIFT) - 1;

/// Current data block format version written by this crate.
pub const CURRENT_DATA_BLOCK_VERSION: u32 = 1;

// =============================================================================
// Decode Limits
// =============================================================================

/// Default upper bound on a serialized data block (256 MB).
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 256 * 1024 * 1024;

/// Default upper bound on any single length-prefixed string (16 MB).
pub const DEFAULT_MAX_STRING_LENGTH: usize = 16 * 1024 * 1024;
