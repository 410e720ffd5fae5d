//! # Domain Entities
//!
//! Core entities for the sharding subsystem.

use super::errors::{ShardError, ShardResult};
use super::value_objects::{
    NodeId, PartitionId, PartitionIntentKind, PartitionKind, PartitionStatus, ShardId,
    ShardStatus,
};
use serde::{Deserialize, Serialize};
use shared_types::{LedgerTransaction, Timestamp};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Sharding configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShardConfig {
    /// Quota given to shards created without an explicit one.
    pub default_resource_quota: u64,
    /// Upper bound for any shard's quota.
    pub max_resource_quota: u64,
    /// Maximum transactions attached to one shard.
    pub max_transactions_per_shard: usize,
    /// Cross-shard messages kept per destination; the oldest is dropped first.
    pub max_inbox_messages: usize,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            default_resource_quota: 100,
            max_resource_quota: 10_000,
            max_transactions_per_shard: 100_000,
            max_inbox_messages: 1_024,
        }
    }
}

impl ShardConfig {
    /// Create config for testing.
    pub fn for_testing() -> Self {
        Self {
            default_resource_quota: 10,
            max_resource_quota: 100,
            max_transactions_per_shard: 8,
            max_inbox_messages: 4,
        }
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> ShardResult<()> {
        if self.max_resource_quota == 0
            || self.max_transactions_per_shard == 0
            || self.max_inbox_messages == 0
        {
            return Err(ShardError::InvalidInput(
                "shard limits must be non-zero".to_string(),
            ));
        }
        if self.default_resource_quota == 0
            || self.default_resource_quota > self.max_resource_quota
        {
            return Err(ShardError::QuotaExceeded {
                requested: self.default_resource_quota,
                max: self.max_resource_quota,
            });
        }
        Ok(())
    }
}

/// Parameters for creating a shard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewShard {
    /// Shard identifier.
    pub id: ShardId,
    /// Node the shard is assigned to.
    pub node_id: NodeId,
    /// Resource quota; `None` uses the configured default.
    pub resource_quota: Option<u64>,
    /// Parent state channel, if the shard backs one.
    pub state_channel: Option<String>,
}

impl NewShard {
    /// Shard with default quota and no state channel.
    pub fn new(id: impl Into<ShardId>, node_id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            node_id: node_id.into(),
            resource_quota: None,
            state_channel: None,
        }
    }

    /// Set an explicit quota.
    pub fn with_quota(mut self, quota: u64) -> Self {
        self.resource_quota = Some(quota);
        self
    }

    /// Attach to a parent state channel.
    pub fn with_state_channel(mut self, channel: impl Into<String>) -> Self {
        self.state_channel = Some(channel.into());
        self
    }
}

/// Who validated a shard and when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    /// Validator identity.
    pub validator: String,
    /// Validation time.
    pub validated_at: Timestamp,
}

/// A unit of ledger state and transaction processing assigned to a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    /// Shard identifier.
    pub id: ShardId,
    /// Node currently hosting the shard.
    pub node_id: NodeId,
    /// Lifecycle status.
    pub status: ShardStatus,
    /// Whether the shard is taking traffic.
    pub available: bool,
    /// Resource quota in integer units.
    pub resource_quota: u64,
    /// Transactions attached to the shard, in arrival order.
    pub transactions: Vec<LedgerTransaction>,
    /// Parent state channel.
    pub state_channel: Option<String>,
    /// Rollups placed on this shard.
    pub hosted_rollups: BTreeSet<String>,
    /// Last validation.
    pub last_validation: Option<ValidationRecord>,
    /// Last sync touch.
    pub last_synced_at: Option<Timestamp>,
    /// Creation time.
    pub created_at: Timestamp,
}

impl Shard {
    /// Create an active, available shard.
    pub fn new(params: NewShard, resource_quota: u64, created_at: Timestamp) -> Self {
        Self {
            id: params.id,
            node_id: params.node_id,
            status: ShardStatus::Active,
            available: true,
            resource_quota,
            transactions: Vec::new(),
            state_channel: params.state_channel,
            hosted_rollups: BTreeSet::new(),
            last_validation: None,
            last_synced_at: None,
            created_at,
        }
    }

    /// Fail with `ClosedShard` if the shard is terminal.
    pub fn ensure_open(&self) -> ShardResult<()> {
        if self.status.is_terminal() {
            return Err(ShardError::ClosedShard(self.id.to_string()));
        }
        Ok(())
    }

    /// Move to a new status.
    pub fn transition_to(&mut self, next: ShardStatus) -> ShardResult<()> {
        self.ensure_open()?;
        if !self.status.can_transition_to(next) {
            return Err(ShardError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", next),
            });
        }
        self.status = next;
        if next.is_terminal() {
            self.available = false;
        }
        Ok(())
    }

    /// True if open and taking traffic.
    pub fn is_serving(&self) -> bool {
        !self.status.is_terminal() && self.available
    }
}

/// An external delegation recorded against a shard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// Delegated shard.
    pub shard_id: ShardId,
    /// Delegate identity.
    pub delegate: String,
    /// Free-form delegation details.
    pub details: String,
    /// When the delegation was recorded.
    pub recorded_at: Timestamp,
}

/// Logical merge of two shards.
///
/// Transaction sequences are not combined; both shards keep their own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Shard that absorbs the other.
    pub target: ShardId,
    /// Shard merged into the target.
    pub source: ShardId,
    /// When the merge was recorded.
    pub recorded_at: Timestamp,
}

/// Logical split of a shard into children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Shard being split.
    pub source: ShardId,
    /// Child shard identifiers.
    pub children: Vec<ShardId>,
    /// When the split was recorded.
    pub recorded_at: Timestamp,
}

/// A message from one shard to another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossShardMessage {
    /// Message identifier.
    pub id: Uuid,
    /// Sending shard.
    pub from: ShardId,
    /// Receiving shard.
    pub to: ShardId,
    /// Opaque body.
    pub payload: Vec<u8>,
    /// Send time.
    pub sent_at: Timestamp,
}

/// One entry in a partition's intent log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionIntent {
    /// What was requested.
    pub kind: PartitionIntentKind,
    /// Free-form details.
    pub details: String,
    /// When it was logged.
    pub recorded_at: Timestamp,
}

/// Logical view over one or more shards.
///
/// Owns no data; shard references are by identifier only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Partition identifier.
    pub id: PartitionId,
    /// Horizontal or vertical.
    pub kind: PartitionKind,
    /// Opaque configuration blob.
    pub config: String,
    /// Shards covered by this view.
    pub shard_ids: Vec<ShardId>,
    /// Lifecycle status.
    pub status: PartitionStatus,
    /// Intent log, oldest first.
    pub intents: Vec<PartitionIntent>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last change.
    pub updated_at: Timestamp,
}

impl Partition {
    /// Create a partition with its creation intent logged.
    pub fn new(
        id: PartitionId,
        kind: PartitionKind,
        config: String,
        shard_ids: Vec<ShardId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            kind,
            config,
            shard_ids,
            status: PartitionStatus::Active,
            intents: vec![PartitionIntent {
                kind: PartitionIntentKind::Created,
                details: String::new(),
                recorded_at: created_at,
            }],
            created_at,
            updated_at: created_at,
        }
    }

    /// Log an intent, checking it applies to this partition's kind.
    pub fn log_intent(
        &mut self,
        kind: PartitionIntentKind,
        details: String,
        at: Timestamp,
    ) -> ShardResult<()> {
        if let Some(required) = kind.required_kind() {
            if required != self.kind {
                return Err(ShardError::InvalidTransition {
                    from: format!("{:?}", self.kind),
                    to: format!("{:?}", kind),
                });
            }
        }
        self.status = match kind {
            PartitionIntentKind::Rebalance => PartitionStatus::Rebalanced,
            PartitionIntentKind::HorizontalSplit | PartitionIntentKind::VerticalSplit => {
                PartitionStatus::Split
            }
            PartitionIntentKind::Created => self.status,
        };
        self.intents.push(PartitionIntent {
            kind,
            details,
            recorded_at: at,
        });
        self.updated_at = at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_shard() -> Shard {
        Shard::new(NewShard::new("s1", "n1"), 10, 1_000)
    }

    #[test]
    fn test_shard_config_default() {
        let config = ShardConfig::default();
        assert_eq!(config.default_resource_quota, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_shard_config_rejects_default_above_max() {
        let config = ShardConfig {
            default_resource_quota: 500,
            max_resource_quota: 100,
            max_transactions_per_shard: 1,
            max_inbox_messages: 1,
        };
        assert!(matches!(
            config.validate(),
            Err(ShardError::QuotaExceeded { requested: 500, .. })
        ));
    }

    #[test]
    fn test_new_shard_is_serving() {
        let shard = test_shard();
        assert_eq!(shard.status, ShardStatus::Active);
        assert!(shard.is_serving());
        assert!(shard.transactions.is_empty());
    }

    #[test]
    fn test_close_shard_is_terminal() {
        let mut shard = test_shard();
        shard.transition_to(ShardStatus::Closed).unwrap();
        assert!(!shard.is_serving());
        assert!(matches!(
            shard.transition_to(ShardStatus::Active),
            Err(ShardError::ClosedShard(_))
        ));
    }

    #[test]
    fn test_partition_intent_kind_mismatch() {
        let mut partition = Partition::new(
            "p1".into(),
            PartitionKind::Vertical,
            "{}".into(),
            vec![],
            1,
        );
        let result = partition.log_intent(PartitionIntentKind::HorizontalSplit, String::new(), 2);
        assert!(matches!(result, Err(ShardError::InvalidTransition { .. })));
        assert_eq!(partition.intents.len(), 1);
    }

    #[test]
    fn test_partition_split_intent() {
        let mut partition = Partition::new(
            "p1".into(),
            PartitionKind::Horizontal,
            "{}".into(),
            vec![],
            1,
        );
        partition
            .log_intent(PartitionIntentKind::HorizontalSplit, "by key".into(), 5)
            .unwrap();
        assert_eq!(partition.status, PartitionStatus::Split);
        assert_eq!(partition.updated_at, 5);
        assert_eq!(partition.intents.len(), 2);
    }
}
