//! Challenge protocol table
//!
//! Keeps an index of open challenges per batch so the finalize gate costs
//! O(open challenges for that batch).

use crate::domain::{
    BatchId, Challenge, ChallengeId, ChallengeOutcome, ChallengeResolution, ChallengeState,
    RollupId,
};
use crate::error::{RollupError, RollupResult};
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::collections::{BTreeSet, HashMap};

/// Challenges keyed by identity, plus the open-per-batch index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeProtocol {
    challenges: HashMap<ChallengeId, Challenge>,
    open_by_batch: HashMap<BatchId, BTreeSet<ChallengeId>>,
}

impl ChallengeProtocol {
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    pub fn get(&self, id: &ChallengeId) -> RollupResult<&Challenge> {
        self.challenges
            .get(id)
            .ok_or_else(|| RollupError::not_found("challenge", id))
    }

    fn get_mut(&mut self, id: &ChallengeId) -> RollupResult<&mut Challenge> {
        self.challenges
            .get_mut(id)
            .ok_or_else(|| RollupError::not_found("challenge", id))
    }

    /// Open a challenge against a batch. The caller checks the batch.
    pub fn submit(
        &mut self,
        id: ChallengeId,
        batch_id: BatchId,
        rollup_id: RollupId,
        max_open: usize,
        now: Timestamp,
    ) -> RollupResult<Challenge> {
        if id.is_blank() {
            return Err(RollupError::InvalidInput(
                "challenge id must be non-empty".to_string(),
            ));
        }
        if self.challenges.contains_key(&id) {
            return Err(RollupError::DuplicateId {
                entity: "challenge",
                id: id.to_string(),
            });
        }
        let open = self.open_for(&batch_id).len();
        if open >= max_open {
            return Err(RollupError::InvalidInput(format!(
                "batch {} already has {} open challenges",
                batch_id, open
            )));
        }

        let challenge = Challenge::new(id.clone(), batch_id, rollup_id, now);
        self.challenges.insert(id.clone(), challenge.clone());
        self.open_by_batch.entry(batch_id).or_default().insert(id);
        Ok(challenge)
    }

    /// `Submitted` → `Escalated`.
    pub fn escalate(&mut self, id: &ChallengeId, now: Timestamp) -> RollupResult<()> {
        let challenge = self.get_mut(id)?;
        if !challenge.state.can_transition_to(ChallengeState::Escalated) {
            return Err(RollupError::transition(
                "challenge",
                challenge.state,
                ChallengeState::Escalated,
            ));
        }
        challenge.state = ChallengeState::Escalated;
        challenge.escalated_at = Some(now);
        Ok(())
    }

    /// The challenge, provided it is still open.
    pub fn open_challenge(&self, id: &ChallengeId) -> RollupResult<&Challenge> {
        let challenge = self.get(id)?;
        if !challenge.state.is_open() {
            return Err(RollupError::transition(
                "challenge",
                challenge.state,
                ChallengeState::Resolved,
            ));
        }
        Ok(challenge)
    }

    /// Open → `Resolved`, dropping it from the open index.
    pub fn resolve(
        &mut self,
        id: &ChallengeId,
        resolution: ChallengeResolution,
        now: Timestamp,
    ) -> RollupResult<Challenge> {
        self.open_challenge(id)?;
        let challenge = self.get_mut(id)?;
        challenge.state = ChallengeState::Resolved;
        challenge.resolution = Some(resolution);
        challenge.resolved_at = Some(now);
        let challenge = challenge.clone();

        if let Some(open) = self.open_by_batch.get_mut(&challenge.batch_id) {
            open.remove(id);
            if open.is_empty() {
                self.open_by_batch.remove(&challenge.batch_id);
            }
        }
        Ok(challenge)
    }

    /// True if any challenge against `batch_id` is Submitted or Escalated.
    pub fn has_open(&self, batch_id: &BatchId) -> bool {
        self.open_by_batch
            .get(batch_id)
            .is_some_and(|open| !open.is_empty())
    }

    /// Open challenge ids against `batch_id`, ordered.
    pub fn open_for(&self, batch_id: &BatchId) -> Vec<ChallengeId> {
        self.open_by_batch
            .get(batch_id)
            .map(|open| open.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Open challenges submitted at least `expiry_secs` before `now`.
    pub fn stale(&self, now: Timestamp, expiry_secs: u64) -> Vec<ChallengeId> {
        let mut stale: Vec<ChallengeId> = self
            .open_by_batch
            .values()
            .flatten()
            .filter_map(|id| self.challenges.get(id))
            .filter(|c| c.submitted_at.saturating_add(expiry_secs) <= now)
            .map(|c| c.id.clone())
            .collect();
        stale.sort();
        stale
    }

    /// Resolve every stale challenge as `Expired`.
    pub fn expire(
        &mut self,
        now: Timestamp,
        expiry_secs: u64,
    ) -> RollupResult<Vec<Challenge>> {
        self.stale(now, expiry_secs)
            .iter()
            .map(|id| {
                self.resolve(
                    id,
                    ChallengeResolution {
                        outcome: ChallengeOutcome::Expired,
                        evidence: None,
                        note: format!("no resolution within {}s", expiry_secs),
                    },
                    now,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn batch(n: u128) -> BatchId {
        BatchId::from_uuid(Uuid::from_u128(n))
    }

    fn rollup() -> RollupId {
        RollupId::from_uuid(Uuid::from_u128(100))
    }

    #[test]
    fn test_submit_opens_index() {
        let mut protocol = ChallengeProtocol::default();
        protocol.submit("c1".into(), batch(1), rollup(), 4, 10).unwrap();
        assert!(protocol.has_open(&batch(1)));
        assert!(!protocol.has_open(&batch(2)));
    }

    #[test]
    fn test_submit_duplicate_id() {
        let mut protocol = ChallengeProtocol::default();
        protocol.submit("c1".into(), batch(1), rollup(), 4, 10).unwrap();
        assert!(matches!(
            protocol.submit("c1".into(), batch(2), rollup(), 4, 10),
            Err(RollupError::DuplicateId { entity: "challenge", .. })
        ));
    }

    #[test]
    fn test_submit_respects_open_limit() {
        let mut protocol = ChallengeProtocol::default();
        protocol.submit("c1".into(), batch(1), rollup(), 1, 10).unwrap();
        assert!(matches!(
            protocol.submit("c2".into(), batch(1), rollup(), 1, 10),
            Err(RollupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_escalate_only_from_submitted() {
        let mut protocol = ChallengeProtocol::default();
        protocol.submit("c1".into(), batch(1), rollup(), 4, 10).unwrap();
        protocol.escalate(&"c1".into(), 11).unwrap();
        assert!(matches!(
            protocol.escalate(&"c1".into(), 12),
            Err(RollupError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_resolve_closes_and_is_terminal() {
        let mut protocol = ChallengeProtocol::default();
        protocol.submit("c1".into(), batch(1), rollup(), 4, 10).unwrap();
        protocol.escalate(&"c1".into(), 11).unwrap();
        let resolved = protocol
            .resolve(&"c1".into(), ChallengeResolution::rejected("ok"), 12)
            .unwrap();
        assert_eq!(resolved.state, ChallengeState::Resolved);
        assert!(!protocol.has_open(&batch(1)));
        assert!(protocol
            .resolve(&"c1".into(), ChallengeResolution::upheld(""), 13)
            .is_err());
        assert!(protocol.escalate(&"c1".into(), 13).is_err());
    }

    #[test]
    fn test_expire_stale() {
        let mut protocol = ChallengeProtocol::default();
        protocol.submit("old".into(), batch(1), rollup(), 4, 10).unwrap();
        protocol.submit("new".into(), batch(1), rollup(), 4, 90).unwrap();

        let expired = protocol.expire(100, 50).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, ChallengeId::from("old"));
        assert_eq!(
            expired[0].resolution.as_ref().map(|r| r.outcome),
            Some(ChallengeOutcome::Expired)
        );
        assert_eq!(protocol.open_for(&batch(1)), vec![ChallengeId::from("new")]);
    }
}
