//! # Domain Errors
//!
//! Error types for the sharding subsystem.

use thiserror::Error;

/// Sharding error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShardError {
    /// Referenced shard, partition or record is absent.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Requested identifier
        id: String,
    },

    /// Identifier already in use on create.
    #[error("Duplicate {entity} id: {id}")]
    DuplicateId {
        /// Entity kind
        entity: &'static str,
        /// Colliding identifier
        id: String,
    },

    /// Mutation attempted on a closed shard.
    #[error("Shard {0} is closed")]
    ClosedShard(String),

    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state
        from: String,
        /// Attempted state
        to: String,
    },

    /// Empty, negative or malformed argument.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource quota above the configured maximum.
    #[error("Quota exceeded: requested {requested}, max {max}")]
    QuotaExceeded {
        /// Requested quota
        requested: u64,
        /// Configured maximum
        max: u64,
    },

    /// Shard transaction log is full.
    #[error("Shard {shard} reached its transaction limit of {limit}")]
    CapacityExceeded {
        /// Shard ID
        shard: String,
        /// Configured limit
        limit: usize,
    },
}

impl ShardError {
    pub(crate) fn shard_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "shard",
            id: id.into(),
        }
    }

    pub(crate) fn partition_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "partition",
            id: id.into(),
        }
    }
}

/// Result type for sharding operations.
pub type ShardResult<T> = Result<T, ShardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = ShardError::shard_not_found("s9");
        assert!(err.to_string().contains("s9"));
        assert!(err.to_string().starts_with("shard"));
    }

    #[test]
    fn test_closed_shard_error() {
        let err = ShardError::ClosedShard("s1".to_string());
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn test_quota_exceeded_error() {
        let err = ShardError::QuotaExceeded {
            requested: 500,
            max: 100,
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = ShardError::InvalidTransition {
            from: "Closed".into(),
            to: "Active".into(),
        };
        assert_eq!(err.to_string(), "Invalid state transition: Closed -> Active");
    }
}
