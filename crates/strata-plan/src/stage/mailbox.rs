//! Mailbox nodes: the two ends of an exchange between stages.

use serde::{Deserialize, Serialize};
use strata_block::DataSchema;
use strata_common::StageId;

use super::{ExchangeType, StageNode};

/// Receiving end of an exchange.
///
/// Declares which upstream stage feeds this stage and how that stage's
/// rows are routed to the instances of this one. The executor polls the
/// corresponding mailboxes for data blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailboxReceiveNode {
    /// Stage this node belongs to.
    pub stage_id: StageId,
    /// Stage whose mailbox send node feeds this one.
    pub sender_stage_id: StageId,
    /// Routing strategy used by the sender.
    pub exchange_type: ExchangeType,
    /// Schema of the blocks that arrive, when known at planning time.
    #[serde(default)]
    pub data_schema: Option<DataSchema>,
}

impl MailboxReceiveNode {
    /// Creates a receive node with no declared schema.
    pub fn new(
        stage_id: impl Into<StageId>,
        sender_stage_id: impl Into<StageId>,
        exchange_type: ExchangeType,
    ) -> Self {
        Self {
            stage_id: stage_id.into(),
            sender_stage_id: sender_stage_id.into(),
            exchange_type,
            data_schema: None,
        }
    }

    /// Declares the schema of incoming blocks.
    pub fn with_data_schema(mut self, schema: DataSchema) -> Self {
        self.data_schema = Some(schema);
        self
    }
}

/// Sending end of an exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailboxSendNode {
    /// Stage this node belongs to.
    pub stage_id: StageId,
    /// Stage whose mailbox receive node consumes this one's output.
    pub receiver_stage_id: StageId,
    /// Routing strategy.
    pub exchange_type: ExchangeType,
    /// Column ids hashed or ranged on. Empty unless the exchange is
    /// partitioned.
    #[serde(default)]
    pub partition_key_selector: Vec<usize>,
    /// Nodes producing the rows that are sent.
    #[serde(default)]
    pub inputs: Vec<StageNode>,
}

impl MailboxSendNode {
    /// Creates a send node with no inputs and no partition key.
    pub fn new(
        stage_id: impl Into<StageId>,
        receiver_stage_id: impl Into<StageId>,
        exchange_type: ExchangeType,
    ) -> Self {
        Self {
            stage_id: stage_id.into(),
            receiver_stage_id: receiver_stage_id.into(),
            exchange_type,
            partition_key_selector: Vec::new(),
            inputs: Vec::new(),
        }
    }

    /// Sets the partition key columns.
    pub fn with_partition_keys(mut self, column_ids: Vec<usize>) -> Self {
        self.partition_key_selector = column_ids;
        self
    }

    /// Adds an input node.
    pub fn with_input(mut self, input: impl Into<StageNode>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// Returns true if the partition key matches the exchange type: present
    /// for partitioned exchanges and absent otherwise.
    pub fn is_consistent(&self) -> bool {
        self.exchange_type.requires_key() != self.partition_key_selector.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_block::ColumnDataType;

    #[test]
    fn test_receive_node_equality() {
        let a = MailboxReceiveNode::new(1u32, 2u32, ExchangeType::HashDistributed);
        let b = MailboxReceiveNode::new(StageId::new(1), StageId::new(2), ExchangeType::HashDistributed);
        assert_eq!(a, b);

        let c = MailboxReceiveNode::new(1u32, 2u32, ExchangeType::BroadcastDistributed);
        assert_ne!(a, c);

        let schema = DataSchema::new(vec![("id".to_string(), ColumnDataType::Int)]);
        assert_ne!(a, b.with_data_schema(schema));
    }

    #[test]
    fn test_receive_node_json() {
        let node = MailboxReceiveNode::new(1u32, 3u32, ExchangeType::Singleton);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["sender_stage_id"], 3);
        assert_eq!(json["exchange_type"], "SINGLETON");
        assert!(json["data_schema"].is_null());

        let back: MailboxReceiveNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_send_node_consistency() {
        let hash = MailboxSendNode::new(2u32, 1u32, ExchangeType::HashDistributed);
        assert!(!hash.is_consistent());
        assert!(hash.with_partition_keys(vec![0]).is_consistent());

        let broadcast = MailboxSendNode::new(2u32, 1u32, ExchangeType::BroadcastDistributed);
        assert!(broadcast.is_consistent());
        assert!(!broadcast.with_partition_keys(vec![1]).is_consistent());
    }
}
