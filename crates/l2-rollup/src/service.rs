//! Rollup Service - Core business logic
//!
//! Orchestrates the four rollup-side tables. Each table sits behind its own
//! lock and locks are only ever taken in field order:
//!
//! ```text
//! registry → batches → challenges → proofs
//! ```
//!
//! Single-table commands take one lock. Multi-table commands (`create_batch`,
//! `remove_rollup`, `validate_batch`, `finalize_batch`, `submit_challenge`,
//! `resolve_challenge`, `resolve_fraud_proof`) hold the locks they need, in
//! that order, for the whole read-check-write. The proof verifier is called
//! with no lock held: snapshot the proof, verify, then re-lock and re-check.
//!
//! Events, history records and metrics are emitted after locks are released.

use crate::domain::{
    Batch, BatchId, BatchState, Challenge, ChallengeId, ChallengeOutcome, ChallengeResolution,
    MemberKind, Proof, ProofId, ProofKind, ProofStatus, RebalanceRecord, Rollup, RollupId,
    SubjectId, Transfer, TransferId, TransferKind,
};
use crate::error::{RollupError, RollupResult};
use crate::metrics;
use crate::ports::inbound::RollupApi;
use crate::ports::outbound::{ProofVerifier, VerifierError};
use crate::store::{BatchPipeline, ChallengeProtocol, ProofLedger, RollupRegistry};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_bus::{LedgerEvent, LedgerObserver};
use shared_types::{current_timestamp, LedgerTransaction, Timestamp, DEFAULT_ID_ATTEMPTS};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rollup configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupConfig {
    /// Transactions a single batch may carry
    pub max_batch_transactions: usize,
    /// Concurrently open challenges against one batch
    pub max_open_challenges_per_batch: usize,
    /// Age after which an open challenge expires (seconds)
    pub challenge_expiry_secs: u64,
    /// Identity generation attempts before giving up
    pub id_generation_attempts: u32,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            max_batch_transactions: 10_000,
            max_open_challenges_per_batch: 16,
            challenge_expiry_secs: 7 * 24 * 60 * 60,
            id_generation_attempts: DEFAULT_ID_ATTEMPTS,
        }
    }
}

impl RollupConfig {
    /// Create config for testing
    pub fn for_testing() -> Self {
        Self {
            max_batch_transactions: 4,
            max_open_challenges_per_batch: 2,
            challenge_expiry_secs: 60,
            id_generation_attempts: 4,
        }
    }

    /// Reject zero limits.
    pub fn validate(&self) -> RollupResult<()> {
        if self.max_batch_transactions == 0
            || self.max_open_challenges_per_batch == 0
            || self.challenge_expiry_secs == 0
            || self.id_generation_attempts == 0
        {
            return Err(RollupError::InvalidInput(
                "rollup limits must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Full state of the rollup subsystem. Serializable for persistence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupSnapshot {
    pub registry: RollupRegistry,
    pub batches: BatchPipeline,
    pub challenges: ChallengeProtocol,
    pub proofs: ProofLedger,
}

/// Rollup Service implementation
pub struct RollupService<V: ProofVerifier> {
    config: RollupConfig,
    // Field order is lock order.
    registry: RwLock<RollupRegistry>,
    batches: RwLock<BatchPipeline>,
    challenges: RwLock<ChallengeProtocol>,
    proofs: RwLock<ProofLedger>,
    verifier: Arc<V>,
    observer: LedgerObserver,
}

impl<V: ProofVerifier> RollupService<V> {
    /// Create an empty service
    pub fn new(config: RollupConfig, verifier: Arc<V>, observer: LedgerObserver) -> Self {
        Self::restore(config, RollupSnapshot::default(), verifier, observer)
    }

    /// Rebuild a service from a snapshot
    pub fn restore(
        config: RollupConfig,
        snapshot: RollupSnapshot,
        verifier: Arc<V>,
        observer: LedgerObserver,
    ) -> Self {
        Self {
            config,
            registry: RwLock::new(snapshot.registry),
            batches: RwLock::new(snapshot.batches),
            challenges: RwLock::new(snapshot.challenges),
            proofs: RwLock::new(snapshot.proofs),
            verifier,
            observer,
        }
    }

    /// Consistent copy of every table
    pub fn snapshot(&self) -> RollupSnapshot {
        let registry = self.registry.read();
        let batches = self.batches.read();
        let challenges = self.challenges.read();
        let proofs = self.proofs.read();
        RollupSnapshot {
            registry: registry.clone(),
            batches: batches.clone(),
            challenges: challenges.clone(),
            proofs: proofs.clone(),
        }
    }

    pub fn config(&self) -> &RollupConfig {
        &self.config
    }

    fn attempts(&self) -> u32 {
        self.config.id_generation_attempts
    }

    fn rollup_updated(&self, rollup: &RollupId, change: String) {
        debug!("[l2-rollup] Rollup {} updated: {}", rollup, change);
        self.observer.emit(
            LedgerEvent::RollupUpdated {
                rollup_id: rollup.to_string(),
                change: change.clone(),
            },
            &rollup.to_string(),
            "rollup.updated",
            change,
        );
    }

    fn batch_transitioned(&self, batch: &BatchId, from: BatchState, to: BatchState) {
        info!(
            batch_id = %batch,
            "[l2-rollup] Batch {:?} -> {:?}", from, to
        );
        self.observer.emit(
            LedgerEvent::BatchTransitioned {
                batch_id: batch.to_string(),
                from: format!("{:?}", from),
                to: format!("{:?}", to),
            },
            &batch.to_string(),
            &format!("batch.{:?}", to).to_lowercase(),
            format!("{:?} -> {:?}", from, to),
        );
    }

    fn proof_status_changed(&self, proof: &ProofId, status: ProofStatus, actor: &str) {
        info!(
            proof_id = %proof,
            actor,
            "[l2-rollup] Proof now {:?}", status
        );
        self.observer.emit(
            LedgerEvent::ProofStatusChanged {
                proof_id: proof.to_string(),
                status: format!("{:?}", status),
                actor: actor.to_string(),
            },
            &proof.to_string(),
            &format!("proof.{:?}", status).to_lowercase(),
            actor.to_string(),
        );
    }

    fn challenge_resolved(&self, challenge: &Challenge) {
        let outcome = challenge
            .resolution
            .as_ref()
            .map(|r| r.outcome.label())
            .unwrap_or("unknown");
        metrics::record_challenge_resolved(outcome);
        info!(
            challenge_id = %challenge.id,
            batch_id = %challenge.batch_id,
            outcome,
            "[l2-rollup] Challenge resolved"
        );
        self.observer.emit(
            LedgerEvent::ChallengeResolved {
                challenge_id: challenge.id.to_string(),
                batch_id: challenge.batch_id.to_string(),
                outcome: outcome.to_string(),
            },
            challenge.id.0.as_str(),
            "challenge.resolved",
            outcome.to_string(),
        );
    }

    fn register_member(&self, rollup: &RollupId, kind: MemberKind, member: &str) -> RollupResult<()> {
        let inserted = self.registry.write().register_member(rollup, kind, member)?;
        if inserted {
            self.rollup_updated(rollup, format!("{}+ {}", kind.entity(), member));
        } else {
            debug!("[l2-rollup] {} {} already registered on {}", kind.entity(), member, rollup);
        }
        Ok(())
    }

    fn remove_member(&self, rollup: &RollupId, kind: MemberKind, member: &str) -> RollupResult<()> {
        if let Err(e) = self.registry.write().remove_member(rollup, kind, member) {
            debug!("[l2-rollup] Remove {} {} from {}: {}", kind.entity(), member, rollup, e);
            return Err(e);
        }
        self.rollup_updated(rollup, format!("{}- {}", kind.entity(), member));
        Ok(())
    }

    fn record_transfer(
        &self,
        kind: TransferKind,
        source: &RollupId,
        target: &RollupId,
    ) -> RollupResult<TransferId> {
        let transfer = self.registry.write().record_transfer(
            kind,
            source,
            target,
            self.attempts(),
            current_timestamp(),
        )?;

        info!(
            tx_id = %transfer.id,
            source = %source,
            target = %target,
            "[l2-rollup] {} recorded", kind.entity()
        );
        self.observer.emit(
            LedgerEvent::InterRollupTransactionRecorded {
                tx_id: transfer.id.to_string(),
                source: source.to_string(),
                target: target.to_string(),
                bridge: kind == TransferKind::Bridge,
            },
            &transfer.id.to_string(),
            match kind {
                TransferKind::CrossRollup => "rollup.cross_transaction",
                TransferKind::Bridge => "rollup.bridge_transaction",
            },
            format!("{} -> {}", source, target),
        );
        Ok(transfer.id)
    }

    /// Single-table forward step for broadcast, submit and remove.
    fn step_batch(&self, batch: &BatchId, next: BatchState) -> RollupResult<()> {
        let result = self
            .batches
            .write()
            .transition(batch, next, current_timestamp());
        match result {
            Ok(from) => {
                self.batch_transitioned(batch, from, next);
                Ok(())
            }
            Err(e) => {
                warn!("[l2-rollup] Batch {} -> {:?} rejected: {}", batch, next, e);
                Err(e)
            }
        }
    }

    /// Evidence must be a fraud proof about the challenged batch whose
    /// resolution, if any, agrees with the outcome.
    fn check_evidence(
        proofs: &ProofLedger,
        evidence: &ProofId,
        batch: &BatchId,
        outcome: ChallengeOutcome,
    ) -> RollupResult<()> {
        let proof = proofs.get(evidence)?;
        if proof.kind != ProofKind::FraudProof {
            return Err(RollupError::InvalidInput(format!(
                "evidence {} is a {:?}, not a fraud proof",
                evidence, proof.kind
            )));
        }
        if proof.subject != batch.subject() {
            return Err(RollupError::InvalidInput(format!(
                "evidence {} is about {}, not batch {}",
                evidence, proof.subject, batch
            )));
        }
        if let Some(resolution) = &proof.resolution {
            let upheld = outcome == ChallengeOutcome::Upheld;
            if resolution.fraud_confirmed != upheld {
                return Err(RollupError::InvalidInput(format!(
                    "evidence {} contradicts outcome {:?}",
                    evidence, outcome
                )));
            }
        }
        Ok(())
    }
}

impl<V: ProofVerifier> RollupApi for RollupService<V> {
    fn create_rollup(&self, validator: &str) -> RollupResult<RollupId> {
        let rollup = self
            .registry
            .write()
            .create(validator, self.attempts(), current_timestamp())?;

        info!(
            rollup_id = %rollup.id,
            validator,
            "[l2-rollup] Rollup created"
        );
        self.observer.emit(
            LedgerEvent::RollupCreated {
                rollup_id: rollup.id.to_string(),
                validator: validator.to_string(),
            },
            &rollup.id.to_string(),
            "rollup.created",
            format!("validator={}", validator),
        );
        Ok(rollup.id)
    }

    fn register_oracle(&self, rollup: &RollupId, oracle: &str) -> RollupResult<()> {
        self.register_member(rollup, MemberKind::Oracle, oracle)
    }

    fn remove_oracle(&self, rollup: &RollupId, oracle: &str) -> RollupResult<()> {
        self.remove_member(rollup, MemberKind::Oracle, oracle)
    }

    fn register_data_source(&self, rollup: &RollupId, source: &str) -> RollupResult<()> {
        self.register_member(rollup, MemberKind::DataSource, source)
    }

    fn remove_data_source(&self, rollup: &RollupId, source: &str) -> RollupResult<()> {
        self.remove_member(rollup, MemberKind::DataSource, source)
    }

    fn finalize_layer(&self, rollup: &RollupId, layer: &str) -> RollupResult<()> {
        if self.registry.write().finalize_layer(rollup, layer)? {
            self.rollup_updated(rollup, format!("layer {} finalized", layer));
        } else {
            debug!("[l2-rollup] Layer {} already final on {}", layer, rollup);
        }
        Ok(())
    }

    fn rebalance_rollup(&self, rollup: &RollupId, details: &str) -> RollupResult<RebalanceRecord> {
        let record = self
            .registry
            .write()
            .rebalance(rollup, details, current_timestamp())?;
        self.rollup_updated(rollup, format!("rebalanced: {}", details));
        Ok(record)
    }

    fn retire_rollup(&self, rollup: &RollupId) -> RollupResult<()> {
        self.registry.write().retire(rollup)?;
        info!(rollup_id = %rollup, "[l2-rollup] Rollup retired");
        self.observer.emit(
            LedgerEvent::RollupRetired {
                rollup_id: rollup.to_string(),
            },
            &rollup.to_string(),
            "rollup.retired",
            String::new(),
        );
        Ok(())
    }

    fn remove_rollup(&self, rollup: &RollupId) -> RollupResult<()> {
        {
            let mut registry = self.registry.write();
            let pending = {
                let batches = self.batches.read();
                batches.pending_among(&registry.get(rollup)?.batches)
            };
            if pending > 0 {
                warn!(
                    rollup_id = %rollup,
                    pending,
                    "[l2-rollup] Refusing to remove rollup with pending batches"
                );
                return Err(RollupError::BatchesPending {
                    rollup: rollup.to_string(),
                    pending,
                });
            }
            registry.remove(rollup)?;
        }

        info!(rollup_id = %rollup, "[l2-rollup] Rollup removed");
        self.observer.emit(
            LedgerEvent::RollupRemoved {
                rollup_id: rollup.to_string(),
            },
            &rollup.to_string(),
            "rollup.removed",
            String::new(),
        );
        Ok(())
    }

    fn update_governance(&self, rollup: &RollupId, key: &str, value: &str) -> RollupResult<()> {
        self.registry.write().update_governance(rollup, key, value)?;
        self.rollup_updated(rollup, format!("governance {}={}", key, value));
        Ok(())
    }

    fn record_cross_rollup_transaction(
        &self,
        source: &RollupId,
        target: &RollupId,
    ) -> RollupResult<TransferId> {
        self.record_transfer(TransferKind::CrossRollup, source, target)
    }

    fn record_bridge_transaction(
        &self,
        source: &RollupId,
        target: &RollupId,
    ) -> RollupResult<TransferId> {
        self.record_transfer(TransferKind::Bridge, source, target)
    }

    fn finalize_bridge_transaction(&self, tx: &TransferId) -> RollupResult<()> {
        self.registry
            .write()
            .finalize_bridge(tx, current_timestamp())?;
        info!(tx_id = %tx, "[l2-rollup] Bridge transaction finalized");
        self.observer.emit(
            LedgerEvent::BridgeTransactionFinalized {
                tx_id: tx.to_string(),
            },
            &tx.to_string(),
            "rollup.bridge_finalized",
            String::new(),
        );
        Ok(())
    }

    fn get_rollup(&self, rollup: &RollupId) -> RollupResult<Rollup> {
        self.registry.read().get(rollup).cloned()
    }

    fn list_rollups(&self) -> Vec<Rollup> {
        self.registry.read().list()
    }

    fn get_bridge_transaction(&self, tx: &TransferId) -> RollupResult<Transfer> {
        self.registry
            .read()
            .transfer(tx, TransferKind::Bridge)
            .cloned()
    }

    fn get_cross_rollup_transaction(&self, tx: &TransferId) -> RollupResult<Transfer> {
        self.registry
            .read()
            .transfer(tx, TransferKind::CrossRollup)
            .cloned()
    }

    fn create_batch(&self, rollup: &RollupId) -> RollupResult<BatchId> {
        let batch = {
            let mut registry = self.registry.write();
            registry.ensure_accepts_batches(rollup)?;
            let batch = self
                .batches
                .write()
                .create(*rollup, self.attempts(), current_timestamp())?;
            registry.attach_batch(rollup, batch.id)?;
            batch
        };

        metrics::record_batch_created();
        info!(
            batch_id = %batch.id,
            rollup_id = %rollup,
            "[l2-rollup] Batch created"
        );
        self.observer.emit(
            LedgerEvent::BatchCreated {
                batch_id: batch.id.to_string(),
                rollup_id: rollup.to_string(),
            },
            &batch.id.to_string(),
            "batch.created",
            format!("rollup={}", rollup),
        );
        Ok(batch.id)
    }

    fn add_batch_transaction(&self, batch: &BatchId, tx: LedgerTransaction) -> RollupResult<()> {
        let tx_id = tx.tx_id.clone();
        let count = self.batches.write().add_transaction(
            batch,
            tx,
            self.config.max_batch_transactions,
            current_timestamp(),
        )?;
        debug!(
            batch_id = %batch,
            tx_id = %tx_id,
            count,
            "[l2-rollup] Transaction added to batch"
        );
        Ok(())
    }

    fn validate_batch(&self, batch: &BatchId) -> RollupResult<()> {
        let from = {
            let mut batches = self.batches.write();
            batches.check_transition(batch, BatchState::Validated)?;
            if !self.proofs.read().has_validated(&batch.subject()) {
                warn!(batch_id = %batch, "[l2-rollup] Batch validation needs a validated proof");
                return Err(RollupError::ProofRequired(batch.to_string()));
            }
            batches.transition(batch, BatchState::Validated, current_timestamp())?
        };
        self.batch_transitioned(batch, from, BatchState::Validated);
        Ok(())
    }

    fn broadcast_batch(&self, batch: &BatchId) -> RollupResult<()> {
        self.step_batch(batch, BatchState::Broadcast)
    }

    fn submit_batch(&self, batch: &BatchId) -> RollupResult<()> {
        self.step_batch(batch, BatchState::Submitted)
    }

    fn finalize_batch(&self, batch: &BatchId) -> RollupResult<()> {
        let from = {
            let mut batches = self.batches.write();
            batches.check_transition(batch, BatchState::Finalized)?;
            if self.challenges.read().has_open(batch) {
                warn!(batch_id = %batch, "[l2-rollup] Finalization blocked by open challenge");
                return Err(RollupError::ChallengePending(batch.to_string()));
            }
            batches.transition(batch, BatchState::Finalized, current_timestamp())?
        };
        metrics::record_batch_finalized();
        self.batch_transitioned(batch, from, BatchState::Finalized);
        Ok(())
    }

    fn remove_batch(&self, batch: &BatchId) -> RollupResult<()> {
        self.step_batch(batch, BatchState::Removed)
    }

    fn get_batch(&self, batch: &BatchId) -> RollupResult<Batch> {
        self.batches.read().get(batch).cloned()
    }

    fn batches_for_rollup(&self, rollup: &RollupId) -> RollupResult<Vec<Batch>> {
        let registry = self.registry.read();
        let ids = &registry.get(rollup)?.batches;
        Ok(self.batches.read().collect(ids))
    }

    fn generate_proof(
        &self,
        kind: ProofKind,
        subject: SubjectId,
        payload: Vec<u8>,
    ) -> RollupResult<ProofId> {
        let proof = self.proofs.write().generate(
            kind,
            subject,
            payload,
            self.attempts(),
            current_timestamp(),
        )?;

        metrics::record_proof_generated(kind.label());
        info!(
            proof_id = %proof.id,
            kind = kind.label(),
            subject = %proof.subject,
            "[l2-rollup] Proof generated"
        );
        self.observer.emit(
            LedgerEvent::ProofGenerated {
                proof_id: proof.id.to_string(),
                kind: format!("{:?}", kind),
                subject: proof.subject.to_string(),
            },
            &proof.id.to_string(),
            "proof.generated",
            format!("{:?} for {}", kind, proof.subject),
        );
        Ok(proof.id)
    }

    fn validate_proof(&self, proof: &ProofId, validator: &str) -> RollupResult<()> {
        if validator.trim().is_empty() {
            return Err(RollupError::InvalidInput(
                "validator must be non-empty".to_string(),
            ));
        }

        let (kind, payload) = self.proofs.read().verification_input(proof)?;

        match self.verifier.verify(kind, &payload) {
            Ok(true) => {}
            Ok(false) => {
                metrics::record_proof_rejected("invalid");
                warn!(proof_id = %proof, "[l2-rollup] Verifier rejected proof");
                return Err(RollupError::ProofRejected(proof.to_string()));
            }
            Err(VerifierError::Timeout) => {
                metrics::record_proof_rejected("timeout");
                warn!(proof_id = %proof, "[l2-rollup] Verifier timed out");
                return Err(RollupError::VerificationTimeout(proof.to_string()));
            }
            Err(e) => {
                metrics::record_proof_rejected("verifier_error");
                warn!(proof_id = %proof, error = %e, "[l2-rollup] Verifier failed");
                return Err(RollupError::ProofRejected(proof.to_string()));
            }
        }

        self.proofs
            .write()
            .mark_validated(proof, validator, current_timestamp())?;
        self.proof_status_changed(proof, ProofStatus::Validated, validator);
        Ok(())
    }

    fn invalidate_proof(
        &self,
        proof: &ProofId,
        invalidator: &str,
        reason: &str,
    ) -> RollupResult<()> {
        self.proofs
            .write()
            .invalidate(proof, invalidator, reason, current_timestamp())?;
        self.proof_status_changed(proof, ProofStatus::Invalidated, invalidator);
        Ok(())
    }

    fn revalidate_proof(&self, proof: &ProofId, validator: &str) -> RollupResult<()> {
        self.proofs
            .write()
            .revalidate(proof, validator, current_timestamp())?;
        self.proof_status_changed(proof, ProofStatus::Revalidated, validator);
        Ok(())
    }

    fn resolve_fraud_proof(
        &self,
        proof: &ProofId,
        rollup: &RollupId,
        fraud_confirmed: bool,
    ) -> RollupResult<()> {
        {
            let registry = self.registry.read();
            registry.get(rollup)?;
            self.proofs
                .write()
                .resolve_fraud(proof, *rollup, fraud_confirmed, current_timestamp())?;
        }
        self.proof_status_changed(proof, ProofStatus::Resolved, &rollup.to_string());
        Ok(())
    }

    fn get_proof(&self, proof: &ProofId) -> RollupResult<Proof> {
        self.proofs.read().get(proof).cloned()
    }

    fn proofs_for_subject(&self, subject: &SubjectId) -> Vec<Proof> {
        self.proofs.read().for_subject(subject)
    }

    fn has_validated_proof(&self, subject: &SubjectId) -> bool {
        self.proofs.read().has_validated(subject)
    }

    fn submit_challenge(&self, challenge: ChallengeId, batch: &BatchId) -> RollupResult<()> {
        let challenge = {
            let batches = self.batches.read();
            let target = batches.get(batch)?;
            if target.state.is_terminal() {
                warn!(
                    batch_id = %batch,
                    "[l2-rollup] Cannot challenge a {:?} batch", target.state
                );
                return Err(RollupError::InvalidTransition {
                    entity: "batch",
                    from: format!("{:?}", target.state),
                    to: "Challenged".to_string(),
                });
            }
            self.challenges.write().submit(
                challenge,
                *batch,
                target.rollup_id,
                self.config.max_open_challenges_per_batch,
                current_timestamp(),
            )?
        };

        metrics::record_challenge_opened();
        info!(
            challenge_id = %challenge.id,
            batch_id = %batch,
            "[l2-rollup] Challenge submitted"
        );
        self.observer.emit(
            LedgerEvent::ChallengeSubmitted {
                challenge_id: challenge.id.to_string(),
                batch_id: batch.to_string(),
            },
            challenge.id.0.as_str(),
            "challenge.submitted",
            format!("batch={}", batch),
        );
        Ok(())
    }

    fn escalate_challenge(&self, challenge: &ChallengeId) -> RollupResult<()> {
        self.challenges
            .write()
            .escalate(challenge, current_timestamp())?;
        info!(challenge_id = %challenge, "[l2-rollup] Challenge escalated");
        self.observer.emit(
            LedgerEvent::ChallengeEscalated {
                challenge_id: challenge.to_string(),
            },
            challenge.0.as_str(),
            "challenge.escalated",
            String::new(),
        );
        Ok(())
    }

    fn resolve_challenge(
        &self,
        challenge: &ChallengeId,
        resolution: ChallengeResolution,
    ) -> RollupResult<()> {
        let now = current_timestamp();
        let (resolved, rolled_back) = {
            let mut batches = self.batches.write();
            let mut challenges = self.challenges.write();

            let batch_id = challenges.open_challenge(challenge)?.batch_id;
            batches.get(&batch_id)?;
            if let Some(evidence) = &resolution.evidence {
                let proofs = self.proofs.read();
                Self::check_evidence(&proofs, evidence, &batch_id, resolution.outcome)?;
            }

            let upheld = resolution.outcome == ChallengeOutcome::Upheld;
            let resolved = challenges.resolve(challenge, resolution, now)?;
            let rolled_back = if upheld {
                batches.roll_back(&batch_id, now)?
            } else {
                None
            };
            (resolved, rolled_back)
        };

        self.challenge_resolved(&resolved);
        if let Some(from) = rolled_back {
            metrics::record_batch_rolled_back();
            warn!(
                batch_id = %resolved.batch_id,
                challenge_id = %challenge,
                "[l2-rollup] Batch rolled back from {:?}", from
            );
            self.observer.emit(
                LedgerEvent::BatchRolledBack {
                    batch_id: resolved.batch_id.to_string(),
                    challenge_id: challenge.to_string(),
                },
                &resolved.batch_id.to_string(),
                "batch.rolled_back",
                format!("from {:?} by {}", from, challenge),
            );
        }
        Ok(())
    }

    fn has_open_challenge(&self, batch: &BatchId) -> bool {
        self.challenges.read().has_open(batch)
    }

    fn get_challenge(&self, challenge: &ChallengeId) -> RollupResult<Challenge> {
        self.challenges.read().get(challenge).cloned()
    }

    fn expire_stale_challenges(&self, now: Timestamp) -> RollupResult<Vec<ChallengeId>> {
        let expired = self
            .challenges
            .write()
            .expire(now, self.config.challenge_expiry_secs)?;
        if expired.is_empty() {
            debug!("[l2-rollup] No stale challenges");
        }
        for challenge in &expired {
            self.challenge_resolved(challenge);
        }
        Ok(expired.into_iter().map(|c| c.id).collect())
    }
}
