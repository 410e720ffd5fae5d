//! Rollup aggregate and inter-rollup transfers

use super::ids::{BatchId, RollupId, TransferId};
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::collections::{BTreeMap, BTreeSet};

/// Rollup lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RollupState {
    /// Accepting new batches.
    #[default]
    Active,
    /// No new batches; existing ones run to completion.
    Retired,
}

/// Membership sets a rollup keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberKind {
    /// Price/data oracles.
    Oracle,
    /// External data sources.
    DataSource,
}

impl MemberKind {
    /// Entity name used in errors and events.
    pub fn entity(&self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::DataSource => "data source",
        }
    }
}

/// One rebalance applied to a rollup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceRecord {
    /// Free-form rebalance metadata.
    pub details: String,
    /// When it was recorded.
    pub recorded_at: Timestamp,
}

/// A rollup and everything hanging off it except batch bodies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollup {
    pub id: RollupId,
    /// Validator address that created the rollup.
    pub validator: String,
    pub state: RollupState,
    /// Batches in creation order.
    pub batches: Vec<BatchId>,
    /// Finalized layers in finalization order, without duplicates.
    pub finalized_layers: Vec<String>,
    pub oracles: BTreeSet<String>,
    pub data_sources: BTreeSet<String>,
    pub rebalances: Vec<RebalanceRecord>,
    pub governance: BTreeMap<String, String>,
    pub created_at: Timestamp,
}

impl Rollup {
    /// New active rollup with empty sequences.
    pub fn new(id: RollupId, validator: String, created_at: Timestamp) -> Self {
        Self {
            id,
            validator,
            state: RollupState::Active,
            batches: Vec::new(),
            finalized_layers: Vec::new(),
            oracles: BTreeSet::new(),
            data_sources: BTreeSet::new(),
            rebalances: Vec::new(),
            governance: BTreeMap::new(),
            created_at,
        }
    }

    /// Mutable access to one membership set.
    pub fn members_mut(&mut self, kind: MemberKind) -> &mut BTreeSet<String> {
        match kind {
            MemberKind::Oracle => &mut self.oracles,
            MemberKind::DataSource => &mut self.data_sources,
        }
    }

    /// Record a finalized layer. Returns false if it was already final.
    pub fn finalize_layer(&mut self, layer: &str) -> bool {
        if self.finalized_layers.iter().any(|l| l == layer) {
            return false;
        }
        self.finalized_layers.push(layer.to_string());
        true
    }

    /// True if new batches may be created.
    pub fn accepts_batches(&self) -> bool {
        self.state == RollupState::Active
    }
}

/// Cross-rollup transfer flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
    /// Plain cross-rollup transaction; immutable once recorded.
    CrossRollup,
    /// Bridge transaction; finalized exactly once.
    Bridge,
}

impl TransferKind {
    /// Entity name used in errors.
    pub fn entity(&self) -> &'static str {
        match self {
            Self::CrossRollup => "cross-rollup transaction",
            Self::Bridge => "bridge transaction",
        }
    }
}

/// A transaction moving between two rollups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub kind: TransferKind,
    pub source: RollupId,
    pub target: RollupId,
    pub recorded_at: Timestamp,
    /// Set once for bridges; always `None` for cross-rollup transactions.
    pub finalized_at: Option<Timestamp>,
}

impl Transfer {
    /// True once a bridge transaction has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn rollup() -> Rollup {
        Rollup::new(RollupId::from_uuid(Uuid::from_u128(1)), "v1".into(), 10)
    }

    #[test]
    fn test_new_rollup_is_active_and_empty() {
        let rollup = rollup();
        assert!(rollup.accepts_batches());
        assert!(rollup.batches.is_empty());
        assert!(rollup.oracles.is_empty());
    }

    #[test]
    fn test_finalize_layer_dedupes() {
        let mut rollup = rollup();
        assert!(rollup.finalize_layer("L1"));
        assert!(!rollup.finalize_layer("L1"));
        assert!(rollup.finalize_layer("L2"));
        assert_eq!(rollup.finalized_layers, vec!["L1", "L2"]);
    }

    #[test]
    fn test_members_mut_selects_set() {
        let mut rollup = rollup();
        rollup.members_mut(MemberKind::DataSource).insert("feed".into());
        assert!(rollup.oracles.is_empty());
        assert_eq!(rollup.data_sources.len(), 1);
    }
}
