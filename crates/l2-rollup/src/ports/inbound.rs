//! Driving Ports (API - Inbound)
//!
//! The synchronous command surface of the rollup subsystem. Every command
//! returns a value or a typed [`RollupError`](crate::error::RollupError);
//! no failure is swallowed.

use crate::domain::{
    Batch, BatchId, Challenge, ChallengeId, ChallengeResolution, Proof, ProofId, ProofKind,
    RebalanceRecord, Rollup, RollupId, SubjectId, Transfer, TransferId,
};
use crate::error::RollupResult;
use shared_types::{LedgerTransaction, Timestamp};

/// Rollup API - inbound port.
pub trait RollupApi: Send + Sync {
    // --- Rollups ---------------------------------------------------------

    /// Create an active rollup owned by `validator`.
    fn create_rollup(&self, validator: &str) -> RollupResult<RollupId>;
    /// Add an oracle. Idempotent.
    fn register_oracle(&self, rollup: &RollupId, oracle: &str) -> RollupResult<()>;
    /// Remove an oracle; `NotFound` if it was not registered.
    fn remove_oracle(&self, rollup: &RollupId, oracle: &str) -> RollupResult<()>;
    /// Add a data source. Idempotent.
    fn register_data_source(&self, rollup: &RollupId, source: &str) -> RollupResult<()>;
    /// Remove a data source; `NotFound` if it was not registered.
    fn remove_data_source(&self, rollup: &RollupId, source: &str) -> RollupResult<()>;
    /// Mark a layer final. Repeats are ignored.
    fn finalize_layer(&self, rollup: &RollupId, layer: &str) -> RollupResult<()>;
    /// Record rebalance metadata. Batch state is untouched.
    fn rebalance_rollup(&self, rollup: &RollupId, details: &str) -> RollupResult<RebalanceRecord>;
    /// Stop accepting new batches.
    fn retire_rollup(&self, rollup: &RollupId) -> RollupResult<()>;
    /// Hard delete; `BatchesPending` while any batch is not Finalized/Removed.
    fn remove_rollup(&self, rollup: &RollupId) -> RollupResult<()>;
    /// Set a governance metadata entry.
    fn update_governance(&self, rollup: &RollupId, key: &str, value: &str) -> RollupResult<()>;
    fn record_cross_rollup_transaction(
        &self,
        source: &RollupId,
        target: &RollupId,
    ) -> RollupResult<TransferId>;
    fn record_bridge_transaction(
        &self,
        source: &RollupId,
        target: &RollupId,
    ) -> RollupResult<TransferId>;
    /// Set the bridge finalization marker. A second call is `InvalidTransition`.
    fn finalize_bridge_transaction(&self, tx: &TransferId) -> RollupResult<()>;
    fn get_rollup(&self, rollup: &RollupId) -> RollupResult<Rollup>;
    fn list_rollups(&self) -> Vec<Rollup>;
    fn get_bridge_transaction(&self, tx: &TransferId) -> RollupResult<Transfer>;
    fn get_cross_rollup_transaction(&self, tx: &TransferId) -> RollupResult<Transfer>;

    // --- Batches ---------------------------------------------------------

    /// Append a `Created` batch to an active rollup.
    fn create_batch(&self, rollup: &RollupId) -> RollupResult<BatchId>;
    /// Append a transaction to a `Created` batch.
    fn add_batch_transaction(&self, batch: &BatchId, tx: LedgerTransaction) -> RollupResult<()>;
    /// `Created` → `Validated`, gated on a validated proof for the batch.
    fn validate_batch(&self, batch: &BatchId) -> RollupResult<()>;
    /// `Validated` → `Broadcast`.
    fn broadcast_batch(&self, batch: &BatchId) -> RollupResult<()>;
    /// `Broadcast` → `Submitted`.
    fn submit_batch(&self, batch: &BatchId) -> RollupResult<()>;
    /// `Submitted` → `Finalized`; `ChallengePending` while challenged.
    fn finalize_batch(&self, batch: &BatchId) -> RollupResult<()>;
    /// Tombstone a batch that is not yet final.
    fn remove_batch(&self, batch: &BatchId) -> RollupResult<()>;
    fn get_batch(&self, batch: &BatchId) -> RollupResult<Batch>;
    /// Batches of a rollup in creation order.
    fn batches_for_rollup(&self, rollup: &RollupId) -> RollupResult<Vec<Batch>>;

    // --- Proofs ----------------------------------------------------------

    fn generate_proof(
        &self,
        kind: ProofKind,
        subject: SubjectId,
        payload: Vec<u8>,
    ) -> RollupResult<ProofId>;
    /// Verify and mark `Validated`. The verifier runs with no lock held.
    fn validate_proof(&self, proof: &ProofId, validator: &str) -> RollupResult<()>;
    fn invalidate_proof(&self, proof: &ProofId, invalidator: &str, reason: &str)
        -> RollupResult<()>;
    /// `Invalidated` → `Revalidated`; a fresh validation is still required.
    fn revalidate_proof(&self, proof: &ProofId, validator: &str) -> RollupResult<()>;
    /// Terminal resolution of a fraud proof.
    fn resolve_fraud_proof(
        &self,
        proof: &ProofId,
        rollup: &RollupId,
        fraud_confirmed: bool,
    ) -> RollupResult<()>;
    fn get_proof(&self, proof: &ProofId) -> RollupResult<Proof>;
    fn proofs_for_subject(&self, subject: &SubjectId) -> Vec<Proof>;
    fn has_validated_proof(&self, subject: &SubjectId) -> bool;

    // --- Challenges ------------------------------------------------------

    /// Open a challenge against a batch that is not yet final.
    fn submit_challenge(&self, challenge: ChallengeId, batch: &BatchId) -> RollupResult<()>;
    fn escalate_challenge(&self, challenge: &ChallengeId) -> RollupResult<()>;
    /// Resolve; an upheld outcome rolls the batch back to `Created`.
    fn resolve_challenge(
        &self,
        challenge: &ChallengeId,
        resolution: ChallengeResolution,
    ) -> RollupResult<()>;
    fn has_open_challenge(&self, batch: &BatchId) -> bool;
    fn get_challenge(&self, challenge: &ChallengeId) -> RollupResult<Challenge>;
    /// Resolve every open challenge older than the configured expiry as
    /// `Expired`. Returns the ids resolved.
    fn expire_stale_challenges(&self, now: Timestamp) -> RollupResult<Vec<ChallengeId>>;
}
