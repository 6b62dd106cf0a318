//! Error codes shared across Strata.
//!
//! Failures raised while a stage processes data are not propagated as Rust
//! errors across the exchange boundary. They travel as `(code, message)`
//! entries inside a data block's exception map, keyed by the codes defined
//! here.

mod query;

pub use query::QueryErrorCode;
