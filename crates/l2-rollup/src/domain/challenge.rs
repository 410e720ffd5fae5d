//! Fraud challenges against batches
//!
//! ```text
//! Submitted ──→ Escalated ──→ Resolved
//!     │                          ↑
//!     └──────────────────────────┘
//! ```

use super::ids::{BatchId, ChallengeId, ProofId, RollupId};
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;

/// Challenge lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChallengeState {
    #[default]
    Submitted,
    Escalated,
    Resolved,
}

impl ChallengeState {
    /// Check if transition to next state is valid.
    pub fn can_transition_to(&self, next: ChallengeState) -> bool {
        matches!(
            (self, next),
            (Self::Submitted, Self::Escalated)
                | (Self::Submitted, Self::Resolved)
                | (Self::Escalated, Self::Resolved)
        )
    }

    /// Submitted or Escalated.
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Resolved)
    }
}

/// How a challenge ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeOutcome {
    /// Fraud shown; the batch goes back to `Created`.
    Upheld,
    /// Challenge dismissed; the batch proceeds.
    Rejected,
    /// Nobody resolved it in time; treated as rejected.
    Expired,
}

impl ChallengeOutcome {
    /// Label used in metrics and events.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Upheld => "upheld",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

/// Resolution payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResolution {
    pub outcome: ChallengeOutcome,
    /// Fraud proof backing the outcome, if any.
    pub evidence: Option<ProofId>,
    pub note: String,
}

impl ChallengeResolution {
    /// Upheld without evidence.
    pub fn upheld(note: impl Into<String>) -> Self {
        Self {
            outcome: ChallengeOutcome::Upheld,
            evidence: None,
            note: note.into(),
        }
    }

    /// Rejected without evidence.
    pub fn rejected(note: impl Into<String>) -> Self {
        Self {
            outcome: ChallengeOutcome::Rejected,
            evidence: None,
            note: note.into(),
        }
    }

    /// Attach a fraud proof as evidence.
    pub fn with_evidence(mut self, proof: ProofId) -> Self {
        self.evidence = Some(proof);
        self
    }
}

/// A dispute opened against a batch before finality.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub batch_id: BatchId,
    pub rollup_id: RollupId,
    pub state: ChallengeState,
    pub resolution: Option<ChallengeResolution>,
    pub submitted_at: Timestamp,
    pub escalated_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
}

impl Challenge {
    pub fn new(
        id: ChallengeId,
        batch_id: BatchId,
        rollup_id: RollupId,
        submitted_at: Timestamp,
    ) -> Self {
        Self {
            id,
            batch_id,
            rollup_id,
            state: ChallengeState::Submitted,
            resolution: None,
            submitted_at,
            escalated_at: None,
            resolved_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_transitions() {
        use ChallengeState::*;
        assert!(Submitted.can_transition_to(Escalated));
        assert!(Submitted.can_transition_to(Resolved));
        assert!(Escalated.can_transition_to(Resolved));
        assert!(!Escalated.can_transition_to(Escalated));
        assert!(!Resolved.can_transition_to(Escalated));
        assert!(!Resolved.can_transition_to(Resolved));
    }

    #[test]
    fn test_open_states() {
        assert!(ChallengeState::Submitted.is_open());
        assert!(ChallengeState::Escalated.is_open());
        assert!(!ChallengeState::Resolved.is_open());
    }

    #[test]
    fn test_resolution_builders() {
        let proof = ProofId::from_uuid(uuid::Uuid::from_u128(3));
        let resolution = ChallengeResolution::upheld("bad state root").with_evidence(proof);
        assert_eq!(resolution.outcome, ChallengeOutcome::Upheld);
        assert_eq!(resolution.evidence, Some(proof));
    }
}
