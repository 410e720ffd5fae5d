//! # Ledger Events
//!
//! Every event type that flows through the shared bus. Identifiers are
//! carried as strings so subscribers need no dependency on the subsystem
//! crates.

use serde::{Deserialize, Serialize};

/// Subsystem that emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subsystem {
    /// Rollup registry, batches, proofs and challenges.
    Rollup,
    /// Shards and partitions.
    Sharding,
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    // =========================================================================
    // ROLLUP REGISTRY
    // =========================================================================
    /// A rollup was created.
    RollupCreated {
        /// New rollup ID.
        rollup_id: String,
        /// Validator that owns the rollup.
        validator: String,
    },

    /// Rollup metadata changed (oracles, data sources, layers, rebalance,
    /// governance).
    RollupUpdated {
        /// Rollup ID.
        rollup_id: String,
        /// Short description, e.g. `oracle+ oracle-1`.
        change: String,
    },

    /// A rollup stopped accepting new batches.
    RollupRetired {
        /// Rollup ID.
        rollup_id: String,
    },

    /// A rollup was deleted.
    RollupRemoved {
        /// Rollup ID.
        rollup_id: String,
    },

    /// A cross-rollup or bridge transaction was recorded.
    InterRollupTransactionRecorded {
        /// Transaction ID.
        tx_id: String,
        /// Source rollup.
        source: String,
        /// Target rollup.
        target: String,
        /// True for bridge transactions.
        bridge: bool,
    },

    /// A bridge transaction was finalized.
    BridgeTransactionFinalized {
        /// Transaction ID.
        tx_id: String,
    },

    // =========================================================================
    // BATCH PIPELINE
    // =========================================================================
    /// A batch was appended to a rollup.
    BatchCreated {
        /// Batch ID.
        batch_id: String,
        /// Parent rollup.
        rollup_id: String,
    },

    /// A batch moved through its lifecycle.
    BatchTransitioned {
        /// Batch ID.
        batch_id: String,
        /// Previous state.
        from: String,
        /// New state.
        to: String,
    },

    /// An upheld challenge rolled a batch back to `Created`.
    BatchRolledBack {
        /// Batch ID.
        batch_id: String,
        /// Challenge that caused the rollback.
        challenge_id: String,
    },

    // =========================================================================
    // PROOF LEDGER
    // =========================================================================
    /// A proof artifact was recorded.
    ProofGenerated {
        /// Proof ID.
        proof_id: String,
        /// Proof kind.
        kind: String,
        /// Subject the proof attests to.
        subject: String,
    },

    /// A proof changed status.
    ProofStatusChanged {
        /// Proof ID.
        proof_id: String,
        /// New status.
        status: String,
        /// Validator or invalidator identity.
        actor: String,
    },

    // =========================================================================
    // CHALLENGE PROTOCOL
    // =========================================================================
    /// A challenge was opened against a batch.
    ChallengeSubmitted {
        /// Challenge ID.
        challenge_id: String,
        /// Challenged batch.
        batch_id: String,
    },

    /// A challenge was escalated.
    ChallengeEscalated {
        /// Challenge ID.
        challenge_id: String,
    },

    /// A challenge reached its terminal state.
    ChallengeResolved {
        /// Challenge ID.
        challenge_id: String,
        /// Challenged batch.
        batch_id: String,
        /// Outcome name.
        outcome: String,
    },

    // =========================================================================
    // SHARDING
    // =========================================================================
    /// A shard was created.
    ShardCreated {
        /// Shard ID.
        shard_id: String,
        /// Assigned node.
        node_id: String,
    },

    /// Shard fields changed (node, availability, quota, sync, validation,
    /// delegation, rollup placement).
    ShardUpdated {
        /// Shard ID.
        shard_id: String,
        /// Short description of the change.
        change: String,
    },

    /// A shard was closed.
    ShardClosed {
        /// Shard ID.
        shard_id: String,
    },

    /// A logical merge was recorded.
    ShardsMerged {
        /// Merge record ID.
        record_id: String,
        /// Merged shards.
        sources: Vec<String>,
    },

    /// A logical split was recorded.
    ShardSplit {
        /// Split record ID.
        record_id: String,
        /// Split shard.
        source: String,
        /// Child shard IDs.
        children: Vec<String>,
    },

    /// A message crossed between shards.
    CrossShardMessageSent {
        /// Message ID.
        message_id: String,
        /// Sending shard.
        from: String,
        /// Receiving shard.
        to: String,
    },

    /// A partition was created.
    PartitionCreated {
        /// Partition ID.
        partition_id: String,
        /// Horizontal or vertical.
        kind: String,
    },

    /// Intent was logged against a partition.
    PartitionIntentRecorded {
        /// Partition ID.
        partition_id: String,
        /// Intent name.
        intent: String,
    },
}

impl LedgerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::RollupCreated { .. }
            | Self::RollupUpdated { .. }
            | Self::RollupRetired { .. }
            | Self::RollupRemoved { .. }
            | Self::InterRollupTransactionRecorded { .. }
            | Self::BridgeTransactionFinalized { .. } => EventTopic::Rollup,
            Self::BatchCreated { .. }
            | Self::BatchTransitioned { .. }
            | Self::BatchRolledBack { .. } => EventTopic::Batch,
            Self::ProofGenerated { .. } | Self::ProofStatusChanged { .. } => EventTopic::Proof,
            Self::ChallengeSubmitted { .. }
            | Self::ChallengeEscalated { .. }
            | Self::ChallengeResolved { .. } => EventTopic::Challenge,
            Self::ShardCreated { .. }
            | Self::ShardUpdated { .. }
            | Self::ShardClosed { .. }
            | Self::ShardsMerged { .. }
            | Self::ShardSplit { .. }
            | Self::CrossShardMessageSent { .. } => EventTopic::Shard,
            Self::PartitionCreated { .. } | Self::PartitionIntentRecorded { .. } => {
                EventTopic::Partition
            }
        }
    }

    /// Get the originating subsystem.
    #[must_use]
    pub fn source_subsystem(&self) -> Subsystem {
        match self.topic() {
            EventTopic::Shard | EventTopic::Partition => Subsystem::Sharding,
            _ => Subsystem::Rollup,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Rollup registry events.
    Rollup,
    /// Batch lifecycle events.
    Batch,
    /// Proof ledger events.
    Proof,
    /// Challenge protocol events.
    Challenge,
    /// Shard store events.
    Shard,
    /// Partition store events.
    Partition,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source subsystems to include. Empty means all sources.
    pub source_subsystems: Vec<Subsystem>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_subsystems: Vec::new(),
        }
    }

    /// Create a filter for events from specific subsystems.
    #[must_use]
    pub fn from_subsystems(subsystems: Vec<Subsystem>) -> Self {
        Self {
            topics: Vec::new(),
            source_subsystems: subsystems,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_subsystems.is_empty()
            || self.source_subsystems.contains(&event.source_subsystem());

        topic_match && source_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_created() -> LedgerEvent {
        LedgerEvent::BatchCreated {
            batch_id: "b1".into(),
            rollup_id: "r1".into(),
        }
    }

    fn shard_closed() -> LedgerEvent {
        LedgerEvent::ShardClosed {
            shard_id: "s1".into(),
        }
    }

    #[test]
    fn test_event_topic_mapping() {
        assert_eq!(batch_created().topic(), EventTopic::Batch);
        assert_eq!(batch_created().source_subsystem(), Subsystem::Rollup);
        assert_eq!(shard_closed().topic(), EventTopic::Shard);
        assert_eq!(shard_closed().source_subsystem(), Subsystem::Sharding);
    }

    #[test]
    fn test_filter_all() {
        assert!(EventFilter::all().matches(&batch_created()));
        assert!(EventFilter::topics(vec![EventTopic::All]).matches(&shard_closed()));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Batch]);
        assert!(filter.matches(&batch_created()));
        assert!(!filter.matches(&shard_closed()));
    }

    #[test]
    fn test_filter_by_subsystem() {
        let filter = EventFilter::from_subsystems(vec![Subsystem::Sharding]);
        assert!(filter.matches(&shard_closed()));
        assert!(!filter.matches(&batch_created()));
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&batch_created()).unwrap();
        assert!(json.contains("BatchCreated"));
        let back: LedgerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, batch_created());
    }
}
