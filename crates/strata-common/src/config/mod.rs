//! Configuration for Strata.

mod datablock;

pub use datablock::{DataBlockConfig, DataBlockConfigBuilder};
