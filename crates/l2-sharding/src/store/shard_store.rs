//! # Shard Store
//!
//! Owned shard table behind a single lock. Every operation is one
//! read-check-write under that lock; events and history records are emitted
//! after the lock is released.

use crate::domain::{
    invariant_distinct_pair, invariant_quota_within_limit, invariant_split_children,
    invariant_transaction_capacity, CrossShardMessage, Delegation, MergeRecord, NewShard, NodeId,
    Shard, ShardConfig, ShardError, ShardId, ShardResult, ShardStatus, SplitRecord,
    ValidationRecord,
};
use crate::ports::ShardingApi;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_bus::{LedgerEvent, LedgerObserver};
use shared_types::{current_timestamp, LedgerTransaction, Timestamp};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything the shard store owns. Serializable for snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardTable {
    shards: BTreeMap<ShardId, Shard>,
    delegations: Vec<Delegation>,
    merges: Vec<MergeRecord>,
    splits: Vec<SplitRecord>,
    inbox: HashMap<ShardId, VecDeque<CrossShardMessage>>,
}

impl ShardTable {
    /// Number of shards, open or closed.
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// True if no shard was ever created.
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Look up a shard.
    pub fn shard(&self, id: &ShardId) -> Option<&Shard> {
        self.shards.get(id)
    }

    fn get(&self, id: &ShardId) -> ShardResult<&Shard> {
        self.shards
            .get(id)
            .ok_or_else(|| ShardError::shard_not_found(id.as_str()))
    }

    fn open_mut(&mut self, id: &ShardId) -> ShardResult<&mut Shard> {
        let shard = self
            .shards
            .get_mut(id)
            .ok_or_else(|| ShardError::shard_not_found(id.as_str()))?;
        shard.ensure_open()?;
        Ok(shard)
    }

    fn ensure_open(&self, id: &ShardId) -> ShardResult<()> {
        self.get(id)?.ensure_open()
    }
}

/// Shard lifecycle store.
pub struct ShardStore {
    config: ShardConfig,
    table: RwLock<ShardTable>,
    observer: LedgerObserver,
}

impl ShardStore {
    /// Create an empty store.
    pub fn new(config: ShardConfig, observer: LedgerObserver) -> Self {
        Self::restore(config, ShardTable::default(), observer)
    }

    /// Rebuild a store from a snapshot.
    pub fn restore(config: ShardConfig, table: ShardTable, observer: LedgerObserver) -> Self {
        Self {
            config,
            table: RwLock::new(table),
            observer,
        }
    }

    /// Copy of the full table.
    pub fn snapshot(&self) -> ShardTable {
        self.table.read().clone()
    }

    /// Active configuration.
    pub fn config(&self) -> &ShardConfig {
        &self.config
    }

    /// Merge records, oldest first.
    pub fn merges(&self) -> Vec<MergeRecord> {
        self.table.read().merges.clone()
    }

    /// Split records, oldest first.
    pub fn splits(&self) -> Vec<SplitRecord> {
        self.table.read().splits.clone()
    }

    /// Run `apply` against an open shard under the write lock, then emit a
    /// `ShardUpdated` event describing `change`.
    fn update<T>(
        &self,
        id: &ShardId,
        change: &str,
        apply: impl FnOnce(&mut Shard) -> ShardResult<T>,
    ) -> ShardResult<T> {
        let result = {
            let mut table = self.table.write();
            let shard = table.open_mut(id)?;
            apply(shard)
        };

        match result {
            Ok(value) => {
                debug!("[l2-sharding] Shard {} updated: {}", id, change);
                self.observer.emit(
                    LedgerEvent::ShardUpdated {
                        shard_id: id.to_string(),
                        change: change.to_string(),
                    },
                    id.as_str(),
                    &format!("shard.{}", change),
                    String::new(),
                );
                Ok(value)
            }
            Err(e) => {
                warn!("[l2-sharding] Shard {} {} rejected: {}", id, change, e);
                Err(e)
            }
        }
    }

    fn close(&self, id: &ShardId) -> ShardResult<()> {
        {
            let mut table = self.table.write();
            let shard = table.open_mut(id)?;
            shard.transition_to(ShardStatus::Closed)?;
        }

        info!("[l2-sharding] Shard {} closed", id);
        self.observer.emit(
            LedgerEvent::ShardClosed {
                shard_id: id.to_string(),
            },
            id.as_str(),
            "shard.closed",
            String::new(),
        );
        Ok(())
    }
}

impl ShardingApi for ShardStore {
    fn create_shard(&self, params: NewShard) -> ShardResult<Shard> {
        if params.id.is_blank() || params.node_id.is_blank() {
            return Err(ShardError::InvalidInput(
                "shard and node ids must be non-empty".to_string(),
            ));
        }
        let quota = params
            .resource_quota
            .unwrap_or(self.config.default_resource_quota);
        invariant_quota_within_limit(quota, self.config.max_resource_quota)?;

        let shard = {
            let mut table = self.table.write();
            if table.shards.contains_key(&params.id) {
                warn!("[l2-sharding] Duplicate shard id {}", params.id);
                return Err(ShardError::DuplicateId {
                    entity: "shard",
                    id: params.id.to_string(),
                });
            }
            let shard = Shard::new(params, quota, current_timestamp());
            table.shards.insert(shard.id.clone(), shard.clone());
            shard
        };

        info!(
            shard_id = %shard.id,
            node_id = %shard.node_id,
            quota = shard.resource_quota,
            "[l2-sharding] Shard created"
        );
        self.observer.emit(
            LedgerEvent::ShardCreated {
                shard_id: shard.id.to_string(),
                node_id: shard.node_id.to_string(),
            },
            shard.id.as_str(),
            "shard.created",
            format!("node={}", shard.node_id),
        );
        Ok(shard)
    }

    fn update_shard_status(&self, id: &ShardId, status: ShardStatus) -> ShardResult<()> {
        match status {
            ShardStatus::Closed => self.close(id),
            ShardStatus::Active => {
                self.table.read().ensure_open(id)?;
                debug!("[l2-sharding] Shard {} already active", id);
                Ok(())
            }
        }
    }

    fn delegate_shard(
        &self,
        id: &ShardId,
        delegate: &str,
        details: &str,
    ) -> ShardResult<Delegation> {
        if delegate.trim().is_empty() {
            return Err(ShardError::InvalidInput("delegate must be non-empty".to_string()));
        }

        let delegation = {
            let mut table = self.table.write();
            table.ensure_open(id)?;
            let delegation = Delegation {
                shard_id: id.clone(),
                delegate: delegate.to_string(),
                details: details.to_string(),
                recorded_at: current_timestamp(),
            };
            table.delegations.push(delegation.clone());
            delegation
        };

        info!("[l2-sharding] Shard {} delegated to {}", id, delegate);
        self.observer.emit(
            LedgerEvent::ShardUpdated {
                shard_id: id.to_string(),
                change: "delegated".to_string(),
            },
            id.as_str(),
            "shard.delegated",
            format!("delegate={}", delegate),
        );
        Ok(delegation)
    }

    fn reallocate_shard(&self, id: &ShardId, node_id: NodeId) -> ShardResult<()> {
        if node_id.is_blank() {
            return Err(ShardError::InvalidInput("node id must be non-empty".to_string()));
        }
        self.update(id, "reallocated", |shard| {
            shard.node_id = node_id;
            Ok(())
        })
    }

    fn merge_shards(&self, target: &ShardId, source: &ShardId) -> ShardResult<MergeRecord> {
        invariant_distinct_pair(target, source)?;

        let record = {
            let mut table = self.table.write();
            table.ensure_open(target)?;
            table.ensure_open(source)?;
            let record = MergeRecord {
                id: Uuid::new_v4(),
                target: target.clone(),
                source: source.clone(),
                recorded_at: current_timestamp(),
            };
            table.merges.push(record.clone());
            record
        };

        info!(
            record_id = %record.id,
            "[l2-sharding] Merge of {} into {} recorded", source, target
        );
        self.observer.emit(
            LedgerEvent::ShardsMerged {
                record_id: record.id.to_string(),
                sources: vec![target.to_string(), source.to_string()],
            },
            &record.id.to_string(),
            "shard.merged",
            format!("{} <- {}", target, source),
        );
        Ok(record)
    }

    fn split_shard(&self, id: &ShardId, children: Vec<ShardId>) -> ShardResult<SplitRecord> {
        invariant_split_children(id, &children)?;

        let record = {
            let mut table = self.table.write();
            table.ensure_open(id)?;
            let record = SplitRecord {
                id: Uuid::new_v4(),
                source: id.clone(),
                children,
                recorded_at: current_timestamp(),
            };
            table.splits.push(record.clone());
            record
        };

        let children: Vec<String> = record.children.iter().map(ToString::to_string).collect();
        info!(
            record_id = %record.id,
            "[l2-sharding] Split of {} into {:?} recorded", id, children
        );
        self.observer.emit(
            LedgerEvent::ShardSplit {
                record_id: record.id.to_string(),
                source: id.to_string(),
                children: children.clone(),
            },
            &record.id.to_string(),
            "shard.split",
            children.join(","),
        );
        Ok(record)
    }

    fn set_shard_availability(&self, id: &ShardId, available: bool) -> ShardResult<()> {
        let change = if available { "available" } else { "unavailable" };
        self.update(id, change, |shard| {
            shard.available = available;
            Ok(())
        })
    }

    fn add_shard_transaction(&self, id: &ShardId, tx: LedgerTransaction) -> ShardResult<()> {
        if !tx.is_well_formed() {
            return Err(ShardError::InvalidInput(
                "transaction id must be non-empty".to_string(),
            ));
        }
        let limit = self.config.max_transactions_per_shard;
        self.update(id, "transaction_added", |shard| {
            invariant_transaction_capacity(&shard.id, shard.transactions.len(), limit)?;
            shard.transactions.push(tx);
            Ok(())
        })
    }

    fn close_shard(&self, id: &ShardId) -> ShardResult<()> {
        self.close(id)
    }

    fn sync_shard(&self, id: &ShardId) -> ShardResult<Timestamp> {
        self.update(id, "synced", |shard| {
            let now = current_timestamp();
            shard.last_synced_at = Some(now);
            Ok(now)
        })
    }

    fn rebalance_shard(&self, id: &ShardId, quota: u64) -> ShardResult<()> {
        invariant_quota_within_limit(quota, self.config.max_resource_quota)?;
        self.update(id, "rebalanced", |shard| {
            shard.resource_quota = quota;
            Ok(())
        })
    }

    fn validate_shard(&self, id: &ShardId, validator: &str) -> ShardResult<()> {
        if validator.trim().is_empty() {
            return Err(ShardError::InvalidInput("validator must be non-empty".to_string()));
        }
        self.update(id, "validated", |shard| {
            shard.last_validation = Some(ValidationRecord {
                validator: validator.to_string(),
                validated_at: current_timestamp(),
            });
            Ok(())
        })
    }

    fn attach_rollup(&self, id: &ShardId, rollup_id: &str) -> ShardResult<()> {
        if rollup_id.trim().is_empty() {
            return Err(ShardError::InvalidInput("rollup id must be non-empty".to_string()));
        }
        self.update(id, "rollup_attached", |shard| {
            if !shard.hosted_rollups.insert(rollup_id.to_string()) {
                debug!("[l2-sharding] Rollup {} already hosted on {}", rollup_id, shard.id);
            }
            Ok(())
        })
    }

    fn detach_rollup(&self, id: &ShardId, rollup_id: &str) -> ShardResult<()> {
        self.update(id, "rollup_detached", |shard| {
            if shard.hosted_rollups.remove(rollup_id) {
                Ok(())
            } else {
                Err(ShardError::NotFound {
                    entity: "hosted rollup",
                    id: rollup_id.to_string(),
                })
            }
        })
    }

    fn send_cross_shard_message(
        &self,
        from: &ShardId,
        to: &ShardId,
        payload: Vec<u8>,
    ) -> ShardResult<CrossShardMessage> {
        invariant_distinct_pair(from, to)?;

        let message = {
            let mut table = self.table.write();
            table.ensure_open(from)?;
            table.ensure_open(to)?;
            let message = CrossShardMessage {
                id: Uuid::new_v4(),
                from: from.clone(),
                to: to.clone(),
                payload,
                sent_at: current_timestamp(),
            };
            let inbox = table.inbox.entry(to.clone()).or_default();
            if inbox.len() >= self.config.max_inbox_messages {
                if let Some(dropped) = inbox.pop_front() {
                    debug!(
                        message_id = %dropped.id,
                        "[l2-sharding] Inbox of {} full, dropping oldest message", to
                    );
                }
            }
            inbox.push_back(message.clone());
            message
        };

        debug!(
            message_id = %message.id,
            bytes = message.payload.len(),
            "[l2-sharding] Cross-shard message {} -> {}", from, to
        );
        self.observer.emit(
            LedgerEvent::CrossShardMessageSent {
                message_id: message.id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            },
            &message.id.to_string(),
            "shard.message_sent",
            format!("{} -> {}", from, to),
        );
        Ok(message)
    }

    fn get_shard(&self, id: &ShardId) -> ShardResult<Shard> {
        self.table.read().get(id).cloned()
    }

    fn list_shards(&self) -> Vec<Shard> {
        self.table.read().shards.values().cloned().collect()
    }

    fn active_shards(&self) -> Vec<ShardId> {
        self.table
            .read()
            .shards
            .values()
            .filter(|shard| shard.is_serving())
            .map(|shard| shard.id.clone())
            .collect()
    }

    fn messages_for(&self, id: &ShardId) -> ShardResult<Vec<CrossShardMessage>> {
        let table = self.table.read();
        table.get(id)?;
        Ok(table
            .inbox
            .get(id)
            .map(|inbox| inbox.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn delegations(&self, id: &ShardId) -> ShardResult<Vec<Delegation>> {
        let table = self.table.read();
        table.get(id)?;
        Ok(table
            .delegations
            .iter()
            .filter(|d| &d.shard_id == id)
            .cloned()
            .collect())
    }
}
