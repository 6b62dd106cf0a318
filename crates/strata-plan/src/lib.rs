//! # strata-plan
//!
//! Plan-level description of how query stages exchange data blocks.
//!
//! Nodes here are plain values: they can be compared, cloned and serialized
//! as part of a larger plan, and they perform no I/O. An executor reads a
//! [`MailboxReceiveNode`] to learn which upstream stage to poll and how
//! that stage routes its rows.
//!
//! ## Example
//!
//! ```rust
//! use strata_plan::{ExchangeType, MailboxReceiveNode, MailboxSendNode, StageNode};
//!
//! let receive = MailboxReceiveNode::new(1u32, 2u32, ExchangeType::HashDistributed);
//! let send: StageNode = MailboxSendNode::new(1u32, 0u32, ExchangeType::Singleton)
//!     .with_input(receive)
//!     .into();
//!
//! assert_eq!(send.inputs().len(), 1);
//! assert_eq!(send.upstream_stages()[0].as_u32(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod stage;

pub use stage::{ExchangeType, MailboxReceiveNode, MailboxSendNode, StageNode};
pub use strata_common::StageId;
