//! # Domain Value Objects
//!
//! Identifiers and closed status enumerations for shards and partitions.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True if the identifier is empty or whitespace.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Caller-assigned shard identifier.
    ShardId
);
string_id!(
    /// Node a shard is assigned to.
    NodeId
);
string_id!(
    /// Caller-assigned partition identifier.
    PartitionId
);

/// Shard lifecycle. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ShardStatus {
    /// Accepting transactions and reallocation.
    #[default]
    Active,
    /// Terminal; no further mutation.
    Closed,
}

impl ShardStatus {
    /// Check if transition to next state is valid.
    pub fn can_transition_to(&self, next: ShardStatus) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Active) | (Self::Active, Self::Closed)
        )
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// How a partition slices the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionKind {
    /// Rows spread across shards.
    Horizontal,
    /// Columns spread across shards.
    Vertical,
}

/// Partition lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PartitionStatus {
    /// Freshly created.
    #[default]
    Active,
    /// Configuration replaced at least once.
    Rebalanced,
    /// A split intent has been logged.
    Split,
}

/// Kind of intent logged against a partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionIntentKind {
    /// Partition was created.
    Created,
    /// Configuration was replaced.
    Rebalance,
    /// Horizontal split requested.
    HorizontalSplit,
    /// Vertical split requested.
    VerticalSplit,
}

impl PartitionIntentKind {
    /// Partition kind this intent is restricted to, if any.
    pub fn required_kind(&self) -> Option<PartitionKind> {
        match self {
            Self::HorizontalSplit => Some(PartitionKind::Horizontal),
            Self::VerticalSplit => Some(PartitionKind::Vertical),
            Self::Created | Self::Rebalance => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_status_transitions() {
        assert!(ShardStatus::Active.can_transition_to(ShardStatus::Closed));
        assert!(ShardStatus::Active.can_transition_to(ShardStatus::Active));
        assert!(!ShardStatus::Closed.can_transition_to(ShardStatus::Active));
        assert!(!ShardStatus::Closed.can_transition_to(ShardStatus::Closed));
    }

    #[test]
    fn test_shard_status_terminal() {
        assert!(ShardStatus::Closed.is_terminal());
        assert!(!ShardStatus::Active.is_terminal());
    }

    #[test]
    fn test_string_id_blank() {
        assert!(ShardId::new("  ").is_blank());
        assert!(!ShardId::from("s1").is_blank());
        assert_eq!(NodeId::from("n1").to_string(), "n1");
    }

    #[test]
    fn test_intent_required_kind() {
        assert_eq!(
            PartitionIntentKind::HorizontalSplit.required_kind(),
            Some(PartitionKind::Horizontal)
        );
        assert_eq!(PartitionIntentKind::Rebalance.required_kind(), None);
    }
}
