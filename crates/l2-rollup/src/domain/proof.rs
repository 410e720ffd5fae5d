//! Proof artifacts and their audit trail
//!
//! ```text
//! Generated ──→ Validated ──→ Invalidated ──→ Revalidated
//!                   ↑                               │
//!                   └───────────────────────────────┘
//!
//! FraudProof (any non-Resolved) ──resolve──→ Resolved (terminal)
//! ```

use super::ids::{ProofId, RollupId, SubjectId};
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;

/// Proof flavour. The payload is opaque to the ledger; the verifier
/// interprets it per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofKind {
    ZkProof,
    FraudProof,
    SpaceTimeProof,
}

impl ProofKind {
    /// Label used in metrics and events.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ZkProof => "zk",
            Self::FraudProof => "fraud",
            Self::SpaceTimeProof => "space_time",
        }
    }
}

/// Proof lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProofStatus {
    #[default]
    Generated,
    Validated,
    Invalidated,
    /// Staging state; a fresh validation is needed to reach `Validated`.
    Revalidated,
    /// Fraud proofs only. Terminal.
    Resolved,
}

impl ProofStatus {
    /// Check if a lifecycle transition is valid. Resolution is checked
    /// separately because it depends on the proof kind.
    pub fn can_transition_to(&self, next: ProofStatus) -> bool {
        matches!(
            (self, next),
            (Self::Generated, Self::Validated)
                | (Self::Revalidated, Self::Validated)
                | (Self::Validated, Self::Invalidated)
                | (Self::Invalidated, Self::Revalidated)
        )
    }
}

/// One status change in a proof's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofAuditEntry {
    pub status: ProofStatus,
    /// Who caused the change.
    pub actor: String,
    /// Mandatory for invalidation.
    pub reason: Option<String>,
    pub timestamp: Timestamp,
}

/// Outcome attached to a resolved fraud proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudResolution {
    pub rollup_id: RollupId,
    /// True if the fraud was confirmed.
    pub fraud_confirmed: bool,
    pub resolved_at: Timestamp,
}

/// A stored proof artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub id: ProofId,
    pub kind: ProofKind,
    pub subject: SubjectId,
    pub payload: Vec<u8>,
    pub status: ProofStatus,
    pub validated_by: Option<String>,
    pub invalidated_by: Option<String>,
    pub resolution: Option<FraudResolution>,
    /// Every status change, oldest first.
    pub history: Vec<ProofAuditEntry>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Proof {
    pub fn new(
        id: ProofId,
        kind: ProofKind,
        subject: SubjectId,
        payload: Vec<u8>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            kind,
            subject,
            payload,
            status: ProofStatus::Generated,
            validated_by: None,
            invalidated_by: None,
            resolution: None,
            history: vec![ProofAuditEntry {
                status: ProofStatus::Generated,
                actor: String::new(),
                reason: None,
                timestamp: created_at,
            }],
            created_at,
            updated_at: created_at,
        }
    }

    /// Apply a status change and append it to the history.
    pub(crate) fn record(
        &mut self,
        status: ProofStatus,
        actor: &str,
        reason: Option<String>,
        at: Timestamp,
    ) {
        self.status = status;
        self.updated_at = at;
        self.history.push(ProofAuditEntry {
            status,
            actor: actor.to_string(),
            reason,
            timestamp: at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_graph() {
        use ProofStatus::*;
        assert!(Generated.can_transition_to(Validated));
        assert!(Validated.can_transition_to(Invalidated));
        assert!(Invalidated.can_transition_to(Revalidated));
        assert!(Revalidated.can_transition_to(Validated));

        assert!(!Invalidated.can_transition_to(Validated));
        assert!(!Validated.can_transition_to(Validated));
        assert!(!Generated.can_transition_to(Invalidated));
        assert!(!Resolved.can_transition_to(Validated));
    }

    #[test]
    fn test_record_appends_history() {
        let mut proof = Proof::new(
            ProofId::from_uuid(uuid::Uuid::from_u128(1)),
            ProofKind::ZkProof,
            SubjectId::from("b1"),
            vec![1],
            3,
        );
        proof.record(ProofStatus::Validated, "v1", None, 4);
        assert_eq!(proof.status, ProofStatus::Validated);
        assert_eq!(proof.history.len(), 2);
        assert_eq!(proof.history[1].actor, "v1");
        assert_eq!(proof.updated_at, 4);
    }
}
