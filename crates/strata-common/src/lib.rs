//! # strata-common
//!
//! Common types, error codes, and configuration for Strata.
//!
//! This crate provides the foundational pieces shared by the data block
//! format and the stage plan nodes:
//!
//! - **Constants**: Wire-format widths, version/type tag layout, decode limits
//! - **Types**: Typed identifiers such as `StageId`
//! - **Errors**: Stable `QueryErrorCode`s carried inside data block exception maps
//! - **Config**: `DataBlockConfig`, loadable from TOML
//!
//! ## Example
//!
//! ```rust
//! use strata_common::types::StageId;
//! use strata_common::error::QueryErrorCode;
//!
//! let sender = StageId::new(2);
//! assert_eq!(sender.as_u32(), 2);
//! assert_eq!(QueryErrorCode::ExecutionTimeout.category(), "Execution");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::DataBlockConfig;
pub use constants::*;
pub use error::QueryErrorCode;
pub use types::StageId;
