//! Rollup registry table
//!
//! Owns rollups and inter-rollup transfers. Sole writer of rollup records.

use crate::domain::{
    BatchId, MemberKind, RebalanceRecord, Rollup, RollupId, RollupState, Transfer, TransferId,
    TransferKind,
};
use crate::error::{RollupError, RollupResult};
use serde::{Deserialize, Serialize};
use shared_types::{generate_unique_id, Timestamp};
use std::collections::HashMap;

/// Rollups keyed by identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupRegistry {
    rollups: HashMap<RollupId, Rollup>,
    transfers: HashMap<TransferId, Transfer>,
}

fn require_non_blank(value: &str, what: &str) -> RollupResult<()> {
    if value.trim().is_empty() {
        return Err(RollupError::InvalidInput(format!("{} must be non-empty", what)));
    }
    Ok(())
}

impl RollupRegistry {
    /// Number of registered rollups.
    pub fn len(&self) -> usize {
        self.rollups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rollups.is_empty()
    }

    pub fn get(&self, id: &RollupId) -> RollupResult<&Rollup> {
        self.rollups
            .get(id)
            .ok_or_else(|| RollupError::not_found("rollup", id))
    }

    fn get_mut(&mut self, id: &RollupId) -> RollupResult<&mut Rollup> {
        self.rollups
            .get_mut(id)
            .ok_or_else(|| RollupError::not_found("rollup", id))
    }

    /// All rollups, oldest first.
    pub fn list(&self) -> Vec<Rollup> {
        let mut rollups: Vec<Rollup> = self.rollups.values().cloned().collect();
        rollups.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        rollups
    }

    /// Insert a fresh active rollup.
    pub fn create(
        &mut self,
        validator: &str,
        attempts: u32,
        now: Timestamp,
    ) -> RollupResult<Rollup> {
        require_non_blank(validator, "validator")?;
        let id = generate_unique_id(attempts, |candidate| {
            self.rollups.contains_key(&RollupId::from_uuid(*candidate))
        })
        .map(RollupId::from_uuid)
        .ok_or(RollupError::IdExhausted {
            entity: "rollup",
            attempts,
        })?;

        let rollup = Rollup::new(id, validator.to_string(), now);
        self.rollups.insert(id, rollup.clone());
        Ok(rollup)
    }

    /// Add to a membership set. Returns false if already a member.
    pub fn register_member(
        &mut self,
        id: &RollupId,
        kind: MemberKind,
        member: &str,
    ) -> RollupResult<bool> {
        require_non_blank(member, kind.entity())?;
        let rollup = self.get_mut(id)?;
        Ok(rollup.members_mut(kind).insert(member.to_string()))
    }

    /// Remove from a membership set. A non-member is `NotFound`.
    pub fn remove_member(
        &mut self,
        id: &RollupId,
        kind: MemberKind,
        member: &str,
    ) -> RollupResult<()> {
        let rollup = self.get_mut(id)?;
        if rollup.members_mut(kind).remove(member) {
            Ok(())
        } else {
            Err(RollupError::not_found(kind.entity(), member))
        }
    }

    /// Record a finalized layer. Returns false if it was already final.
    pub fn finalize_layer(&mut self, id: &RollupId, layer: &str) -> RollupResult<bool> {
        require_non_blank(layer, "layer")?;
        Ok(self.get_mut(id)?.finalize_layer(layer))
    }

    pub fn rebalance(
        &mut self,
        id: &RollupId,
        details: &str,
        now: Timestamp,
    ) -> RollupResult<RebalanceRecord> {
        require_non_blank(details, "rebalance details")?;
        let record = RebalanceRecord {
            details: details.to_string(),
            recorded_at: now,
        };
        self.get_mut(id)?.rebalances.push(record.clone());
        Ok(record)
    }

    pub fn retire(&mut self, id: &RollupId) -> RollupResult<()> {
        let rollup = self.get_mut(id)?;
        if rollup.state != RollupState::Active {
            return Err(RollupError::transition(
                "rollup",
                rollup.state,
                RollupState::Retired,
            ));
        }
        rollup.state = RollupState::Retired;
        Ok(())
    }

    /// Returns the previous value for `key`, if any.
    pub fn update_governance(
        &mut self,
        id: &RollupId,
        key: &str,
        value: &str,
    ) -> RollupResult<Option<String>> {
        require_non_blank(key, "governance key")?;
        Ok(self
            .get_mut(id)?
            .governance
            .insert(key.to_string(), value.to_string()))
    }

    /// Fail unless the rollup exists and is accepting batches.
    pub fn ensure_accepts_batches(&self, id: &RollupId) -> RollupResult<()> {
        let rollup = self.get(id)?;
        if !rollup.accepts_batches() {
            return Err(RollupError::InvalidTransition {
                entity: "rollup",
                from: format!("{:?}", rollup.state),
                to: "CreateBatch".to_string(),
            });
        }
        Ok(())
    }

    pub fn attach_batch(&mut self, id: &RollupId, batch: BatchId) -> RollupResult<()> {
        self.get_mut(id)?.batches.push(batch);
        Ok(())
    }

    /// Hard delete. The caller checks the pending-batch guard first.
    pub fn remove(&mut self, id: &RollupId) -> RollupResult<Rollup> {
        self.rollups
            .remove(id)
            .ok_or_else(|| RollupError::not_found("rollup", id))
    }

    /// Record a transfer between two distinct existing rollups.
    pub fn record_transfer(
        &mut self,
        kind: TransferKind,
        source: &RollupId,
        target: &RollupId,
        attempts: u32,
        now: Timestamp,
    ) -> RollupResult<Transfer> {
        if source == target {
            return Err(RollupError::InvalidInput(format!(
                "{} source and target are both {}",
                kind.entity(),
                source
            )));
        }
        self.get(source)?;
        self.get(target)?;

        let id = generate_unique_id(attempts, |candidate| {
            self.transfers.contains_key(&TransferId::from_uuid(*candidate))
        })
        .map(TransferId::from_uuid)
        .ok_or(RollupError::IdExhausted {
            entity: kind.entity(),
            attempts,
        })?;

        let transfer = Transfer {
            id,
            kind,
            source: *source,
            target: *target,
            recorded_at: now,
            finalized_at: None,
        };
        self.transfers.insert(id, transfer.clone());
        Ok(transfer)
    }

    /// Look up a transfer of a given kind.
    pub fn transfer(&self, id: &TransferId, kind: TransferKind) -> RollupResult<&Transfer> {
        self.transfers
            .get(id)
            .filter(|t| t.kind == kind)
            .ok_or_else(|| RollupError::not_found(kind.entity(), id))
    }

    /// Set the bridge finalization marker. Exactly once.
    pub fn finalize_bridge(&mut self, id: &TransferId, now: Timestamp) -> RollupResult<Transfer> {
        let transfer = self
            .transfers
            .get_mut(id)
            .filter(|t| t.kind == TransferKind::Bridge)
            .ok_or_else(|| RollupError::not_found(TransferKind::Bridge.entity(), id))?;
        if transfer.is_finalized() {
            return Err(RollupError::InvalidTransition {
                entity: "bridge transaction",
                from: "Finalized".to_string(),
                to: "Finalized".to_string(),
            });
        }
        transfer.finalized_at = Some(now);
        Ok(transfer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_rollup() -> (RollupRegistry, RollupId) {
        let mut registry = RollupRegistry::default();
        let rollup = registry.create("validator-1", 8, 100).unwrap();
        (registry, rollup.id)
    }

    #[test]
    fn test_create_rollup() {
        let (registry, id) = registry_with_rollup();
        let rollup = registry.get(&id).unwrap();
        assert_eq!(rollup.state, RollupState::Active);
        assert_eq!(rollup.validator, "validator-1");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_create_rollup_blank_validator() {
        let mut registry = RollupRegistry::default();
        assert!(matches!(
            registry.create("", 8, 1),
            Err(RollupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_create_rollup_exhausted() {
        let mut registry = RollupRegistry::default();
        assert!(matches!(
            registry.create("v", 0, 1),
            Err(RollupError::IdExhausted { entity: "rollup", .. })
        ));
    }

    #[test]
    fn test_register_member_idempotent() {
        let (mut registry, id) = registry_with_rollup();
        assert!(registry.register_member(&id, MemberKind::Oracle, "oracle-1").unwrap());
        assert!(!registry.register_member(&id, MemberKind::Oracle, "oracle-1").unwrap());
        let oracles = &registry.get(&id).unwrap().oracles;
        assert_eq!(oracles.iter().filter(|o| *o == "oracle-1").count(), 1);
    }

    #[test]
    fn test_remove_non_member_not_found() {
        let (mut registry, id) = registry_with_rollup();
        let result = registry.remove_member(&id, MemberKind::DataSource, "feed");
        assert!(matches!(
            result,
            Err(RollupError::NotFound { entity: "data source", .. })
        ));
    }

    #[test]
    fn test_retire_twice_fails() {
        let (mut registry, id) = registry_with_rollup();
        registry.retire(&id).unwrap();
        assert!(registry.ensure_accepts_batches(&id).is_err());
        assert!(matches!(
            registry.retire(&id),
            Err(RollupError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_governance_key_required() {
        let (mut registry, id) = registry_with_rollup();
        assert!(registry.update_governance(&id, " ", "x").is_err());
        assert_eq!(registry.update_governance(&id, "quorum", "3").unwrap(), None);
        assert_eq!(
            registry.update_governance(&id, "quorum", "4").unwrap(),
            Some("3".to_string())
        );
    }

    #[test]
    fn test_transfer_requires_distinct_rollups() {
        let (mut registry, a) = registry_with_rollup();
        assert!(matches!(
            registry.record_transfer(TransferKind::CrossRollup, &a, &a, 8, 1),
            Err(RollupError::InvalidInput(_))
        ));
        let missing = RollupId::from_uuid(uuid::Uuid::from_u128(9));
        assert!(matches!(
            registry.record_transfer(TransferKind::Bridge, &a, &missing, 8, 1),
            Err(RollupError::NotFound { .. })
        ));
    }

    #[test]
    fn test_bridge_finalized_once() {
        let (mut registry, a) = registry_with_rollup();
        let b = registry.create("validator-2", 8, 101).unwrap().id;
        let bridge = registry
            .record_transfer(TransferKind::Bridge, &a, &b, 8, 5)
            .unwrap();

        let finalized = registry.finalize_bridge(&bridge.id, 6).unwrap();
        assert!(finalized.is_finalized());
        assert!(matches!(
            registry.finalize_bridge(&bridge.id, 7),
            Err(RollupError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_cross_rollup_transfer_not_a_bridge() {
        let (mut registry, a) = registry_with_rollup();
        let b = registry.create("validator-2", 8, 101).unwrap().id;
        let tx = registry
            .record_transfer(TransferKind::CrossRollup, &a, &b, 8, 5)
            .unwrap();
        assert!(registry.transfer(&tx.id, TransferKind::CrossRollup).is_ok());
        assert!(registry.transfer(&tx.id, TransferKind::Bridge).is_err());
        assert!(registry.finalize_bridge(&tx.id, 6).is_err());
    }
}
