//! # Stores
//!
//! Lock-owning tables for shards and partitions.

pub mod partition_store;
pub mod shard_store;

pub use partition_store::{PartitionStore, PartitionTable};
pub use shard_store::{ShardStore, ShardTable};
