//! # Ports
//!
//! API traits the sharding stores expose to the rest of the node.

pub mod inbound;

pub use inbound::{PartitioningApi, ShardingApi};
