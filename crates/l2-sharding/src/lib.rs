//! # L2 Sharding
//!
//! The scaling substrate rollups run on: shards assigned to nodes, and
//! partitions that give a logical view over groups of shards.
//!
//! ## Purpose
//!
//! - Shard lifecycle (`Active` -> `Closed`), resource quotas, availability
//! - Logical merge/split records (transactions are never moved)
//! - Cross-shard messaging and rollup placement bookkeeping
//! - Horizontal/vertical partition intent logs
//!
//! ## Module Structure
//!
//! ```text
//! l2-sharding/
//! ├── domain/          # Shard, Partition, records, invariants, errors
//! ├── algorithms/      # Rendezvous placement
//! ├── ports/           # ShardingApi, PartitioningApi
//! └── store/           # ShardStore, PartitionStore
//! ```
//!
//! Each store owns its table behind a single lock. A closed shard rejects
//! every mutation with `ShardError::ClosedShard` but stays readable.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod store;

// Re-exports
pub use algorithms::{place, rendezvous_pick, rendezvous_weight};
pub use domain::{
    CrossShardMessage, Delegation, MergeRecord, NewShard, NodeId, Partition, PartitionId,
    PartitionIntent, PartitionIntentKind, PartitionKind, PartitionStatus, Shard, ShardConfig,
    ShardError, ShardId, ShardResult, ShardStatus, SplitRecord, ValidationRecord,
};
pub use ports::{PartitioningApi, ShardingApi};
pub use store::{PartitionStore, PartitionTable, ShardStore, ShardTable};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
