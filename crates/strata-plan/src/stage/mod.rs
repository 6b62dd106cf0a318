//! Stage plan nodes.
//!
//! A distributed plan is cut into stages at every exchange. Each stage's
//! tree starts at a [`MailboxSendNode`] (or is the root stage) and bottoms
//! out at [`MailboxReceiveNode`]s that pull data blocks from upstream
//! stages.

mod exchange;
mod mailbox;

pub use exchange::ExchangeType;
pub use mailbox::{MailboxReceiveNode, MailboxSendNode};

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_common::StageId;

/// A node of a stage plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageNode {
    /// Pulls data blocks from an upstream stage.
    MailboxReceive(MailboxReceiveNode),
    /// Pushes data blocks to a downstream stage.
    MailboxSend(MailboxSendNode),
}

impl StageNode {
    /// Stage the node belongs to.
    pub fn stage_id(&self) -> StageId {
        match self {
            StageNode::MailboxReceive(node) => node.stage_id,
            StageNode::MailboxSend(node) => node.stage_id,
        }
    }

    /// Child nodes within the same stage.
    pub fn inputs(&self) -> &[StageNode] {
        match self {
            StageNode::MailboxReceive(_) => &[],
            StageNode::MailboxSend(node) => &node.inputs,
        }
    }

    /// Returns the exchange type of this node.
    pub fn exchange_type(&self) -> ExchangeType {
        match self {
            StageNode::MailboxReceive(node) => node.exchange_type,
            StageNode::MailboxSend(node) => node.exchange_type,
        }
    }

    /// Returns the node name.
    pub fn name(&self) -> &'static str {
        match self {
            StageNode::MailboxReceive(_) => "MailboxReceive",
            StageNode::MailboxSend(_) => "MailboxSend",
        }
    }

    /// Sender stages of every receive node in this tree, in depth-first
    /// order.
    pub fn upstream_stages(&self) -> Vec<StageId> {
        let mut stages = Vec::new();
        self.collect_upstream(&mut stages);
        stages
    }

    fn collect_upstream(&self, stages: &mut Vec<StageId>) {
        if let StageNode::MailboxReceive(node) = self {
            stages.push(node.sender_stage_id);
        }
        for input in self.inputs() {
            input.collect_upstream(stages);
        }
    }
}

impl fmt::Display for StageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageNode::MailboxReceive(node) => write!(
                f,
                "MailboxReceive(stage={}, from={}, {})",
                node.stage_id, node.sender_stage_id, node.exchange_type
            ),
            StageNode::MailboxSend(node) => write!(
                f,
                "MailboxSend(stage={}, to={}, {})",
                node.stage_id, node.receiver_stage_id, node.exchange_type
            ),
        }
    }
}

impl From<MailboxReceiveNode> for StageNode {
    fn from(node: MailboxReceiveNode) -> Self {
        StageNode::MailboxReceive(node)
    }
}

impl From<MailboxSendNode> for StageNode {
    fn from(node: MailboxSendNode) -> Self {
        StageNode::MailboxSend(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stage_tree() -> StageNode {
        MailboxSendNode::new(1u32, 0u32, ExchangeType::Singleton)
            .with_input(MailboxReceiveNode::new(1u32, 2u32, ExchangeType::HashDistributed))
            .with_input(MailboxReceiveNode::new(1u32, 3u32, ExchangeType::BroadcastDistributed))
            .into()
    }

    #[test]
    fn test_stage_node_accessors() {
        let node = two_stage_tree();
        assert_eq!(node.stage_id(), StageId::new(1));
        assert_eq!(node.name(), "MailboxSend");
        assert_eq!(node.inputs().len(), 2);
        assert!(node.inputs()[0].inputs().is_empty());
        assert_eq!(node.inputs()[1].exchange_type(), ExchangeType::BroadcastDistributed);
        assert_eq!(
            node.upstream_stages(),
            vec![StageId::new(2), StageId::new(3)]
        );
    }

    #[test]
    fn test_display() {
        let node: StageNode = MailboxReceiveNode::new(1u32, 2u32, ExchangeType::Any).into();
        assert_eq!(node.to_string(), "MailboxReceive(stage=1, from=2, ANY)");
    }

    #[test]
    fn test_bincode_roundtrip() {
        let node = two_stage_tree();
        let bytes = bincode::serialize(&node).unwrap();
        let back: StageNode = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, node);
    }
}
