//! Core identifier types for Strata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage identifier - identifies one stage of a distributed query plan.
///
/// Stage 0 is the root (broker-side reduce) stage; leaf stages that scan
/// data get higher ids as the planner splits the plan at exchange points.
///
/// # Example
///
/// ```rust
/// use strata_common::types::StageId;
///
/// let stage = StageId::new(3);
/// assert_eq!(stage.as_u32(), 3);
/// assert!(!stage.is_root());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct StageId(u32);

impl StageId {
    /// The root stage of every plan.
    pub const ROOT: Self = Self(0);

    /// Creates a new `StageId` from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns true if this is the root stage.
    #[inline]
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == Self::ROOT.0
    }
}

impl fmt::Debug for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StageId({})", self.0)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StageId {
    #[inline]
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl From<StageId> for u32 {
    #[inline]
    fn from(id: StageId) -> Self {
        id.0
    }
}
