//! Batch state machine
//!
//! ```text
//! Created → Validated → Broadcast → Submitted → Finalized
//!    │          │           │           │
//!    └──────────┴───────────┴───────────┴──→ Removed (tombstone)
//! ```
//!
//! An upheld challenge rolls a non-terminal batch back to `Created`.

use super::ids::{BatchId, RollupId};
use serde::{Deserialize, Serialize};
use shared_types::{LedgerTransaction, Timestamp};

/// Batch lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BatchState {
    #[default]
    Created,
    Validated,
    Broadcast,
    Submitted,
    Finalized,
    Removed,
}

impl BatchState {
    /// The single forward successor, if any.
    pub fn successor(&self) -> Option<BatchState> {
        match self {
            Self::Created => Some(Self::Validated),
            Self::Validated => Some(Self::Broadcast),
            Self::Broadcast => Some(Self::Submitted),
            Self::Submitted => Some(Self::Finalized),
            Self::Finalized | Self::Removed => None,
        }
    }

    /// Check if transition to next state is valid.
    pub fn can_transition_to(&self, next: BatchState) -> bool {
        if next == Self::Removed {
            return !self.is_terminal();
        }
        self.successor() == Some(next)
    }

    /// Finalized and Removed accept nothing further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Removed)
    }
}

/// An ordered group of transactions committed together within a rollup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub rollup_id: RollupId,
    pub state: BatchState,
    pub transactions: Vec<LedgerTransaction>,
    /// Times an upheld challenge sent this batch back to `Created`.
    pub rollback_count: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Batch {
    pub fn new(id: BatchId, rollup_id: RollupId, created_at: Timestamp) -> Self {
        Self {
            id,
            rollup_id,
            state: BatchState::Created,
            transactions: Vec::new(),
            rollback_count: 0,
            created_at,
            updated_at: created_at,
        }
    }

    /// Send the batch back to `Created`. Returns the state it left.
    pub fn roll_back(&mut self, at: Timestamp) -> Option<BatchState> {
        if self.state.is_terminal() {
            return None;
        }
        let from = self.state;
        self.state = BatchState::Created;
        self.rollback_count += 1;
        self.updated_at = at;
        Some(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_forward_chain_only() {
        use BatchState::*;
        assert!(Created.can_transition_to(Validated));
        assert!(Validated.can_transition_to(Broadcast));
        assert!(Broadcast.can_transition_to(Submitted));
        assert!(Submitted.can_transition_to(Finalized));

        assert!(!Created.can_transition_to(Submitted));
        assert!(!Created.can_transition_to(Finalized));
        assert!(!Validated.can_transition_to(Created));
        assert!(!Finalized.can_transition_to(Created));
    }

    #[test]
    fn test_removed_reachable_before_finality() {
        use BatchState::*;
        for state in [Created, Validated, Broadcast, Submitted] {
            assert!(state.can_transition_to(Removed), "{:?}", state);
        }
        assert!(!Finalized.can_transition_to(Removed));
        assert!(!Removed.can_transition_to(Removed));
    }

    #[test]
    fn test_roll_back() {
        let mut batch = Batch::new(
            BatchId::from_uuid(Uuid::from_u128(1)),
            RollupId::from_uuid(Uuid::from_u128(2)),
            5,
        );
        batch.state = BatchState::Submitted;
        assert_eq!(batch.roll_back(9), Some(BatchState::Submitted));
        assert_eq!(batch.state, BatchState::Created);
        assert_eq!(batch.rollback_count, 1);

        batch.state = BatchState::Removed;
        assert_eq!(batch.roll_back(10), None);
    }
}
