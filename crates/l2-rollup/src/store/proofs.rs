//! Proof ledger table
//!
//! One uniform record type for every proof kind, indexed by subject so the
//! batch validation gate never scans the whole ledger.

use crate::domain::{
    FraudResolution, Proof, ProofId, ProofKind, ProofStatus, RollupId, SubjectId,
};
use crate::error::{RollupError, RollupResult};
use serde::{Deserialize, Serialize};
use shared_types::{generate_unique_id, Timestamp};
use std::collections::HashMap;

/// Proofs keyed by identity, plus a subject index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofLedger {
    proofs: HashMap<ProofId, Proof>,
    by_subject: HashMap<SubjectId, Vec<ProofId>>,
}

fn require_actor(actor: &str) -> RollupResult<()> {
    if actor.trim().is_empty() {
        return Err(RollupError::InvalidInput("actor must be non-empty".to_string()));
    }
    Ok(())
}

impl ProofLedger {
    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }

    pub fn get(&self, id: &ProofId) -> RollupResult<&Proof> {
        self.proofs
            .get(id)
            .ok_or_else(|| RollupError::not_found("proof", id))
    }

    fn get_mut(&mut self, id: &ProofId) -> RollupResult<&mut Proof> {
        self.proofs
            .get_mut(id)
            .ok_or_else(|| RollupError::not_found("proof", id))
    }

    fn check(proof: &Proof, next: ProofStatus) -> RollupResult<()> {
        if !proof.status.can_transition_to(next) {
            return Err(RollupError::transition("proof", proof.status, next));
        }
        Ok(())
    }

    /// Insert a `Generated` proof.
    pub fn generate(
        &mut self,
        kind: ProofKind,
        subject: SubjectId,
        payload: Vec<u8>,
        attempts: u32,
        now: Timestamp,
    ) -> RollupResult<Proof> {
        if subject.is_blank() {
            return Err(RollupError::InvalidInput("proof subject must be non-empty".to_string()));
        }
        if payload.is_empty() {
            return Err(RollupError::InvalidInput("proof payload must be non-empty".to_string()));
        }

        let id = generate_unique_id(attempts, |candidate| {
            self.proofs.contains_key(&ProofId::from_uuid(*candidate))
        })
        .map(ProofId::from_uuid)
        .ok_or(RollupError::IdExhausted {
            entity: "proof",
            attempts,
        })?;

        let proof = Proof::new(id, kind, subject.clone(), payload, now);
        self.proofs.insert(id, proof.clone());
        self.by_subject.entry(subject).or_default().push(id);
        Ok(proof)
    }

    /// What the verifier needs, provided the proof may become `Validated`.
    pub fn verification_input(&self, id: &ProofId) -> RollupResult<(ProofKind, Vec<u8>)> {
        let proof = self.get(id)?;
        Self::check(proof, ProofStatus::Validated)?;
        Ok((proof.kind, proof.payload.clone()))
    }

    /// Mark a proof `Validated` after the verifier accepted it.
    ///
    /// The status is checked again; it may have moved while the verifier ran.
    pub fn mark_validated(
        &mut self,
        id: &ProofId,
        validator: &str,
        now: Timestamp,
    ) -> RollupResult<ProofStatus> {
        require_actor(validator)?;
        let proof = self.get_mut(id)?;
        Self::check(proof, ProofStatus::Validated)?;
        let from = proof.status;
        proof.validated_by = Some(validator.to_string());
        proof.record(ProofStatus::Validated, validator, None, now);
        Ok(from)
    }

    /// `Validated` → `Invalidated`. The reason is mandatory.
    pub fn invalidate(
        &mut self,
        id: &ProofId,
        invalidator: &str,
        reason: &str,
        now: Timestamp,
    ) -> RollupResult<()> {
        require_actor(invalidator)?;
        if reason.trim().is_empty() {
            return Err(RollupError::InvalidInput(
                "invalidation reason must be non-empty".to_string(),
            ));
        }
        let proof = self.get_mut(id)?;
        Self::check(proof, ProofStatus::Invalidated)?;
        proof.invalidated_by = Some(invalidator.to_string());
        proof.record(
            ProofStatus::Invalidated,
            invalidator,
            Some(reason.to_string()),
            now,
        );
        Ok(())
    }

    /// `Invalidated` → `Revalidated`.
    pub fn revalidate(&mut self, id: &ProofId, validator: &str, now: Timestamp) -> RollupResult<()> {
        require_actor(validator)?;
        let proof = self.get_mut(id)?;
        Self::check(proof, ProofStatus::Revalidated)?;
        proof.record(ProofStatus::Revalidated, validator, None, now);
        Ok(())
    }

    /// Terminal resolution of a fraud proof, from any unresolved status.
    pub fn resolve_fraud(
        &mut self,
        id: &ProofId,
        rollup_id: RollupId,
        fraud_confirmed: bool,
        now: Timestamp,
    ) -> RollupResult<FraudResolution> {
        let proof = self.get_mut(id)?;
        if proof.kind != ProofKind::FraudProof {
            return Err(RollupError::InvalidInput(format!(
                "proof {} is a {:?}, only fraud proofs resolve",
                id, proof.kind
            )));
        }
        if proof.status == ProofStatus::Resolved {
            return Err(RollupError::transition(
                "proof",
                proof.status,
                ProofStatus::Resolved,
            ));
        }
        let resolution = FraudResolution {
            rollup_id,
            fraud_confirmed,
            resolved_at: now,
        };
        proof.resolution = Some(resolution.clone());
        let verdict = if fraud_confirmed { "fraud confirmed" } else { "no fraud" };
        proof.record(
            ProofStatus::Resolved,
            &rollup_id.to_string(),
            Some(verdict.to_string()),
            now,
        );
        Ok(resolution)
    }

    /// Proofs filed under `subject`, oldest first.
    pub fn for_subject(&self, subject: &SubjectId) -> Vec<Proof> {
        self.by_subject
            .get(subject)
            .map(|ids| ids.iter().filter_map(|id| self.proofs.get(id)).cloned().collect())
            .unwrap_or_default()
    }

    /// True if at least one proof for `subject` is currently `Validated`.
    pub fn has_validated(&self, subject: &SubjectId) -> bool {
        self.by_subject.get(subject).is_some_and(|ids| {
            ids.iter()
                .filter_map(|id| self.proofs.get(id))
                .any(|p| p.status == ProofStatus::Validated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ledger_with(kind: ProofKind) -> (ProofLedger, ProofId) {
        let mut ledger = ProofLedger::default();
        let proof = ledger
            .generate(kind, SubjectId::from("batch-1"), vec![1, 2], 8, 1)
            .unwrap();
        (ledger, proof.id)
    }

    #[test]
    fn test_generate_rejects_empty() {
        let mut ledger = ProofLedger::default();
        assert!(ledger
            .generate(ProofKind::ZkProof, SubjectId::from(""), vec![1], 8, 1)
            .is_err());
        assert!(ledger
            .generate(ProofKind::ZkProof, SubjectId::from("s"), vec![], 8, 1)
            .is_err());
    }

    #[test]
    fn test_invalidate_then_validate_fails() {
        let (mut ledger, id) = ledger_with(ProofKind::ZkProof);
        ledger.mark_validated(&id, "v1", 2).unwrap();
        ledger.invalidate(&id, "auditor", "bad witness", 3).unwrap();
        assert!(matches!(
            ledger.verification_input(&id),
            Err(RollupError::InvalidTransition { entity: "proof", .. })
        ));
        assert!(ledger.mark_validated(&id, "v1", 4).is_err());
    }

    #[test]
    fn test_invalidate_revalidate_validate() {
        let (mut ledger, id) = ledger_with(ProofKind::ZkProof);
        ledger.mark_validated(&id, "v1", 2).unwrap();
        ledger.invalidate(&id, "auditor", "bad witness", 3).unwrap();
        ledger.revalidate(&id, "v2", 4).unwrap();
        assert!(!ledger.has_validated(&SubjectId::from("batch-1")));
        ledger.mark_validated(&id, "v2", 5).unwrap();

        let proof = ledger.get(&id).unwrap();
        assert_eq!(proof.status, ProofStatus::Validated);
        let statuses: Vec<ProofStatus> = proof.history.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                ProofStatus::Generated,
                ProofStatus::Validated,
                ProofStatus::Invalidated,
                ProofStatus::Revalidated,
                ProofStatus::Validated,
            ]
        );
        assert_eq!(proof.history[2].reason.as_deref(), Some("bad witness"));
    }

    #[test]
    fn test_invalidate_requires_reason() {
        let (mut ledger, id) = ledger_with(ProofKind::ZkProof);
        ledger.mark_validated(&id, "v1", 2).unwrap();
        assert!(matches!(
            ledger.invalidate(&id, "auditor", "  ", 3),
            Err(RollupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_resolve_only_fraud_proofs() {
        let (mut ledger, id) = ledger_with(ProofKind::SpaceTimeProof);
        let rollup = RollupId::from_uuid(Uuid::from_u128(1));
        assert!(matches!(
            ledger.resolve_fraud(&id, rollup, true, 2),
            Err(RollupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_resolve_fraud_is_terminal() {
        let (mut ledger, id) = ledger_with(ProofKind::FraudProof);
        let rollup = RollupId::from_uuid(Uuid::from_u128(1));
        ledger.resolve_fraud(&id, rollup, true, 2).unwrap();
        assert_eq!(ledger.get(&id).unwrap().status, ProofStatus::Resolved);
        assert!(ledger.resolve_fraud(&id, rollup, false, 3).is_err());
        assert!(ledger.verification_input(&id).is_err());
    }

    #[test]
    fn test_subject_index() {
        let (mut ledger, _) = ledger_with(ProofKind::ZkProof);
        ledger
            .generate(ProofKind::FraudProof, SubjectId::from("batch-1"), vec![9], 8, 2)
            .unwrap();
        ledger
            .generate(ProofKind::ZkProof, SubjectId::from("batch-2"), vec![9], 8, 2)
            .unwrap();
        assert_eq!(ledger.for_subject(&SubjectId::from("batch-1")).len(), 2);
        assert!(ledger.for_subject(&SubjectId::from("nope")).is_empty());
    }
}
