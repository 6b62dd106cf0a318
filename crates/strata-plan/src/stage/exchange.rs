//! Exchange strategies between stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How rows emitted by a sending stage are routed among the instances of
/// the receiving stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeType {
    /// Everything goes to a single receiver instance.
    Singleton,
    /// Rows are hash-partitioned on a key.
    HashDistributed,
    /// Rows are partitioned by key ranges.
    RangeDistributed,
    /// Each block goes to a randomly chosen receiver.
    RandomDistributed,
    /// Blocks are dealt to receivers in turn.
    RoundRobinDistributed,
    /// Every receiver gets every block.
    BroadcastDistributed,
    /// No routing constraint.
    Any,
}

impl ExchangeType {
    /// Every exchange type.
    pub const ALL: [ExchangeType; 7] = [
        Self::Singleton,
        Self::HashDistributed,
        Self::RangeDistributed,
        Self::RandomDistributed,
        Self::RoundRobinDistributed,
        Self::BroadcastDistributed,
        Self::Any,
    ];

    /// Returns true if each receiver sees a disjoint subset of rows chosen
    /// by key.
    pub const fn is_partitioned(self) -> bool {
        matches!(self, Self::HashDistributed | Self::RangeDistributed)
    }

    /// Returns true if the exchange needs a partition key selector.
    pub const fn requires_key(self) -> bool {
        self.is_partitioned()
    }

    /// Returns true if every receiver must wait for end-of-stream from all
    /// sender instances, not just one.
    pub const fn requires_all_senders(self) -> bool {
        !matches!(self, Self::Any)
    }

    /// Upper-case name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Singleton => "SINGLETON",
            Self::HashDistributed => "HASH_DISTRIBUTED",
            Self::RangeDistributed => "RANGE_DISTRIBUTED",
            Self::RandomDistributed => "RANDOM_DISTRIBUTED",
            Self::RoundRobinDistributed => "ROUND_ROBIN_DISTRIBUTED",
            Self::BroadcastDistributed => "BROADCAST_DISTRIBUTED",
            Self::Any => "ANY",
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitioned() {
        assert!(ExchangeType::HashDistributed.is_partitioned());
        assert!(ExchangeType::RangeDistributed.requires_key());
        assert!(!ExchangeType::BroadcastDistributed.is_partitioned());
        assert!(!ExchangeType::Singleton.requires_key());
    }

    #[test]
    fn test_requires_all_senders() {
        assert!(ExchangeType::Singleton.requires_all_senders());
        assert!(ExchangeType::BroadcastDistributed.requires_all_senders());
        assert!(!ExchangeType::Any.requires_all_senders());
    }

    #[test]
    fn test_serde_names_match_display() {
        for ty in ExchangeType::ALL {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty));
            let back: ExchangeType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, ty);
        }
    }
}
