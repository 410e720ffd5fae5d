//! # Node Errors

use l2_rollup::RollupError;
use l2_sharding::ShardError;
use thiserror::Error;

/// Errors surfaced by the node runtime.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Rollup subsystem rejected the command.
    #[error("rollup: {0}")]
    Rollup(#[from] RollupError),

    /// Sharding subsystem rejected the command.
    #[error("sharding: {0}")]
    Sharding(#[from] ShardError),

    /// Snapshot could not be encoded or decoded.
    #[error("snapshot: {0}")]
    Snapshot(String),

    /// Configuration is unusable.
    #[error("config: {0}")]
    Config(String),

    /// No active shard can host the rollup.
    #[error("no active shard available for rollup {0}")]
    NoActiveShards(String),
}

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_subsystem_errors() {
        let err: NodeError = ShardError::ClosedShard("s1".into()).into();
        assert_eq!(err.to_string(), "sharding: Shard s1 is closed");

        let err: NodeError = RollupError::ChallengePending("b1".into()).into();
        assert!(matches!(err, NodeError::Rollup(RollupError::ChallengePending(_))));
    }
}
