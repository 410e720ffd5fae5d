//! # Inbound Ports
//!
//! API traits defining what the sharding subsystem can do.
//!
//! Every mutating operation other than creation fails with
//! [`ShardError::NotFound`](crate::domain::ShardError::NotFound) when the
//! target is absent and with
//! [`ShardError::ClosedShard`](crate::domain::ShardError::ClosedShard) when
//! it targets a closed shard.

use crate::domain::{
    CrossShardMessage, Delegation, MergeRecord, NewShard, NodeId, Partition, PartitionId,
    PartitionKind, Shard, ShardId, ShardResult, ShardStatus, SplitRecord,
};
use shared_types::{LedgerTransaction, Timestamp};

/// Sharding API - inbound port.
pub trait ShardingApi: Send + Sync {
    /// Create an active, available shard.
    fn create_shard(&self, params: NewShard) -> ShardResult<Shard>;

    /// Move a shard to `status`. Closing through here is equivalent to
    /// [`close_shard`](Self::close_shard).
    fn update_shard_status(&self, id: &ShardId, status: ShardStatus) -> ShardResult<()>;

    /// Record an external delegation. Shard fields are untouched.
    fn delegate_shard(&self, id: &ShardId, delegate: &str, details: &str)
        -> ShardResult<Delegation>;

    /// Reassign the shard to another node.
    fn reallocate_shard(&self, id: &ShardId, node_id: NodeId) -> ShardResult<()>;

    /// Record a logical merge of `source` into `target`.
    fn merge_shards(&self, target: &ShardId, source: &ShardId) -> ShardResult<MergeRecord>;

    /// Record a logical split of `id` into `children`.
    fn split_shard(&self, id: &ShardId, children: Vec<ShardId>) -> ShardResult<SplitRecord>;

    /// Toggle whether the shard takes traffic.
    fn set_shard_availability(&self, id: &ShardId, available: bool) -> ShardResult<()>;

    /// Append a transaction to the shard's log.
    fn add_shard_transaction(&self, id: &ShardId, tx: LedgerTransaction) -> ShardResult<()>;

    /// Close the shard. Terminal.
    fn close_shard(&self, id: &ShardId) -> ShardResult<()>;

    /// Touch the shard's sync timestamp.
    fn sync_shard(&self, id: &ShardId) -> ShardResult<Timestamp>;

    /// Replace the shard's resource quota.
    fn rebalance_shard(&self, id: &ShardId, quota: u64) -> ShardResult<()>;

    /// Record a validation without changing status.
    fn validate_shard(&self, id: &ShardId, validator: &str) -> ShardResult<()>;

    /// Mark `rollup_id` as hosted on the shard. Idempotent.
    fn attach_rollup(&self, id: &ShardId, rollup_id: &str) -> ShardResult<()>;

    /// Remove `rollup_id` from the shard's hosted set.
    fn detach_rollup(&self, id: &ShardId, rollup_id: &str) -> ShardResult<()>;

    /// Send a message between two active shards.
    fn send_cross_shard_message(
        &self,
        from: &ShardId,
        to: &ShardId,
        payload: Vec<u8>,
    ) -> ShardResult<CrossShardMessage>;

    /// Look up a shard.
    fn get_shard(&self, id: &ShardId) -> ShardResult<Shard>;

    /// All shards, ordered by id.
    fn list_shards(&self) -> Vec<Shard>;

    /// Ids of shards that are active and available, ordered.
    fn active_shards(&self) -> Vec<ShardId>;

    /// Messages delivered to `id`, oldest first.
    fn messages_for(&self, id: &ShardId) -> ShardResult<Vec<CrossShardMessage>>;

    /// Delegations recorded against `id`.
    fn delegations(&self, id: &ShardId) -> ShardResult<Vec<Delegation>>;
}

/// Partitioning API - inbound port.
pub trait PartitioningApi: Send + Sync {
    /// Create a partition over `shard_ids`.
    fn create_partition(
        &self,
        id: PartitionId,
        kind: PartitionKind,
        config: String,
        shard_ids: Vec<ShardId>,
    ) -> ShardResult<Partition>;

    /// Replace the partition's configuration.
    fn rebalance_partition(&self, id: &PartitionId, config: String) -> ShardResult<()>;

    /// Log a horizontal split intent.
    fn record_horizontal_partition(&self, id: &PartitionId, details: &str) -> ShardResult<()>;

    /// Log a vertical split intent.
    fn record_vertical_partition(&self, id: &PartitionId, details: &str) -> ShardResult<()>;

    /// Look up a partition.
    fn get_partition(&self, id: &PartitionId) -> ShardResult<Partition>;

    /// All partitions, ordered by id.
    fn list_partitions(&self) -> Vec<Partition>;
}
