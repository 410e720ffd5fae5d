//! Batch pipeline table
//!
//! Owns batch records. Removal leaves a `Removed` tombstone so the audit
//! trail survives.

use crate::domain::{Batch, BatchId, BatchState, RollupId};
use crate::error::{RollupError, RollupResult};
use serde::{Deserialize, Serialize};
use shared_types::{generate_unique_id, LedgerTransaction, Timestamp};
use std::collections::HashMap;

/// Batches keyed by identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPipeline {
    batches: HashMap<BatchId, Batch>,
}

impl BatchPipeline {
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn get(&self, id: &BatchId) -> RollupResult<&Batch> {
        self.batches
            .get(id)
            .ok_or_else(|| RollupError::not_found("batch", id))
    }

    fn get_mut(&mut self, id: &BatchId) -> RollupResult<&mut Batch> {
        self.batches
            .get_mut(id)
            .ok_or_else(|| RollupError::not_found("batch", id))
    }

    /// Insert a fresh `Created` batch.
    pub fn create(
        &mut self,
        rollup_id: RollupId,
        attempts: u32,
        now: Timestamp,
    ) -> RollupResult<Batch> {
        let id = generate_unique_id(attempts, |candidate| {
            self.batches.contains_key(&BatchId::from_uuid(*candidate))
        })
        .map(BatchId::from_uuid)
        .ok_or(RollupError::IdExhausted {
            entity: "batch",
            attempts,
        })?;

        let batch = Batch::new(id, rollup_id, now);
        self.batches.insert(id, batch.clone());
        Ok(batch)
    }

    /// Fail with `InvalidTransition` unless `id` may move to `next`.
    pub fn check_transition(&self, id: &BatchId, next: BatchState) -> RollupResult<BatchState> {
        let batch = self.get(id)?;
        if !batch.state.can_transition_to(next) {
            return Err(RollupError::transition("batch", batch.state, next));
        }
        Ok(batch.state)
    }

    /// Move `id` to `next`. Returns the state it left.
    pub fn transition(
        &mut self,
        id: &BatchId,
        next: BatchState,
        now: Timestamp,
    ) -> RollupResult<BatchState> {
        let from = self.check_transition(id, next)?;
        let batch = self.get_mut(id)?;
        batch.state = next;
        batch.updated_at = now;
        Ok(from)
    }

    /// Append a transaction to a `Created` batch.
    pub fn add_transaction(
        &mut self,
        id: &BatchId,
        tx: LedgerTransaction,
        max: usize,
        now: Timestamp,
    ) -> RollupResult<usize> {
        if !tx.is_well_formed() {
            return Err(RollupError::InvalidInput(
                "transaction id must be non-empty".to_string(),
            ));
        }
        let batch = self.get_mut(id)?;
        if batch.state != BatchState::Created {
            return Err(RollupError::InvalidTransition {
                entity: "batch",
                from: format!("{:?}", batch.state),
                to: "AddTransaction".to_string(),
            });
        }
        if batch.transactions.len() >= max {
            return Err(RollupError::InvalidInput(format!(
                "batch {} is full ({} transactions)",
                id, max
            )));
        }
        batch.transactions.push(tx);
        batch.updated_at = now;
        Ok(batch.transactions.len())
    }

    /// Roll a non-terminal batch back to `Created`.
    ///
    /// Returns the state it left, or `None` if the batch was already
    /// terminal and stays untouched.
    pub fn roll_back(&mut self, id: &BatchId, now: Timestamp) -> RollupResult<Option<BatchState>> {
        Ok(self.get_mut(id)?.roll_back(now))
    }

    /// Non-terminal batches among `ids`.
    pub fn pending_among(&self, ids: &[BatchId]) -> usize {
        ids.iter()
            .filter_map(|id| self.batches.get(id))
            .filter(|b| !b.state.is_terminal())
            .count()
    }

    /// Batches among `ids`, in the given order.
    pub fn collect(&self, ids: &[BatchId]) -> Vec<Batch> {
        ids.iter()
            .filter_map(|id| self.batches.get(id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn rollup() -> RollupId {
        RollupId::from_uuid(Uuid::from_u128(1))
    }

    fn pipeline_with_batch() -> (BatchPipeline, BatchId) {
        let mut pipeline = BatchPipeline::default();
        let batch = pipeline.create(rollup(), 8, 1).unwrap();
        (pipeline, batch.id)
    }

    #[test]
    fn test_submit_on_created_fails() {
        let (mut pipeline, id) = pipeline_with_batch();
        let result = pipeline.transition(&id, BatchState::Submitted, 2);
        assert!(matches!(
            result,
            Err(RollupError::InvalidTransition { entity: "batch", .. })
        ));
        assert_eq!(pipeline.get(&id).unwrap().state, BatchState::Created);
    }

    #[test]
    fn test_forward_walk() {
        let (mut pipeline, id) = pipeline_with_batch();
        for next in [
            BatchState::Validated,
            BatchState::Broadcast,
            BatchState::Submitted,
            BatchState::Finalized,
        ] {
            pipeline.transition(&id, next, 2).unwrap();
        }
        assert_eq!(pipeline.get(&id).unwrap().state, BatchState::Finalized);
        assert!(pipeline.transition(&id, BatchState::Removed, 3).is_err());
    }

    #[test]
    fn test_remove_is_tombstone() {
        let (mut pipeline, id) = pipeline_with_batch();
        pipeline.transition(&id, BatchState::Removed, 2).unwrap();
        assert_eq!(pipeline.get(&id).unwrap().state, BatchState::Removed);
        assert_eq!(pipeline.len(), 1);
    }

    #[test]
    fn test_add_transaction_bounds() {
        let (mut pipeline, id) = pipeline_with_batch();
        pipeline
            .add_transaction(&id, LedgerTransaction::new("t1", vec![]), 1, 2)
            .unwrap();
        assert!(matches!(
            pipeline.add_transaction(&id, LedgerTransaction::new("t2", vec![]), 1, 2),
            Err(RollupError::InvalidInput(_))
        ));
        assert!(matches!(
            pipeline.add_transaction(&id, LedgerTransaction::new("", vec![]), 5, 2),
            Err(RollupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_add_transaction_only_when_created() {
        let (mut pipeline, id) = pipeline_with_batch();
        pipeline.transition(&id, BatchState::Validated, 2).unwrap();
        assert!(matches!(
            pipeline.add_transaction(&id, LedgerTransaction::new("t1", vec![]), 5, 3),
            Err(RollupError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_pending_among() {
        let (mut pipeline, a) = pipeline_with_batch();
        let b = pipeline.create(rollup(), 8, 1).unwrap().id;
        assert_eq!(pipeline.pending_among(&[a, b]), 2);
        pipeline.transition(&b, BatchState::Removed, 2).unwrap();
        assert_eq!(pipeline.pending_among(&[a, b]), 1);
    }
}
