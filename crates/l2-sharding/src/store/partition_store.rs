//! # Partition Store
//!
//! Logical partition views over shards. Operations only log intent; no data
//! moves between shards.

use crate::domain::{
    Partition, PartitionId, PartitionIntentKind, PartitionKind, ShardError, ShardId, ShardResult,
};
use crate::ports::PartitioningApi;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_bus::{LedgerEvent, LedgerObserver};
use shared_types::current_timestamp;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Everything the partition store owns. Serializable for snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTable {
    partitions: BTreeMap<PartitionId, Partition>,
}

impl PartitionTable {
    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// True if there are no partitions.
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

/// Partition lifecycle store.
pub struct PartitionStore {
    table: RwLock<PartitionTable>,
    observer: LedgerObserver,
}

impl PartitionStore {
    /// Create an empty store.
    pub fn new(observer: LedgerObserver) -> Self {
        Self::restore(PartitionTable::default(), observer)
    }

    /// Rebuild a store from a snapshot.
    pub fn restore(table: PartitionTable, observer: LedgerObserver) -> Self {
        Self {
            table: RwLock::new(table),
            observer,
        }
    }

    /// Copy of the full table.
    pub fn snapshot(&self) -> PartitionTable {
        self.table.read().clone()
    }

    fn record_intent(
        &self,
        id: &PartitionId,
        kind: PartitionIntentKind,
        details: String,
    ) -> ShardResult<()> {
        {
            let mut table = self.table.write();
            let partition = table
                .partitions
                .get_mut(id)
                .ok_or_else(|| ShardError::partition_not_found(id.as_str()))?;
            if let Err(e) = partition.log_intent(kind, details.clone(), current_timestamp()) {
                warn!("[l2-sharding] Partition {} rejected {:?}: {}", id, kind, e);
                return Err(e);
            }
        }

        info!("[l2-sharding] Partition {} logged {:?}", id, kind);
        self.observer.emit(
            LedgerEvent::PartitionIntentRecorded {
                partition_id: id.to_string(),
                intent: format!("{:?}", kind),
            },
            id.as_str(),
            "partition.intent",
            details,
        );
        Ok(())
    }
}

impl PartitioningApi for PartitionStore {
    fn create_partition(
        &self,
        id: PartitionId,
        kind: PartitionKind,
        config: String,
        shard_ids: Vec<ShardId>,
    ) -> ShardResult<Partition> {
        if id.is_blank() {
            return Err(ShardError::InvalidInput(
                "partition id must be non-empty".to_string(),
            ));
        }
        if shard_ids.is_empty() || shard_ids.iter().any(ShardId::is_blank) {
            return Err(ShardError::InvalidInput(
                "partition must cover at least one named shard".to_string(),
            ));
        }

        let partition = {
            let mut table = self.table.write();
            if table.partitions.contains_key(&id) {
                warn!("[l2-sharding] Duplicate partition id {}", id);
                return Err(ShardError::DuplicateId {
                    entity: "partition",
                    id: id.to_string(),
                });
            }
            let partition = Partition::new(id, kind, config, shard_ids, current_timestamp());
            table
                .partitions
                .insert(partition.id.clone(), partition.clone());
            partition
        };

        info!(
            partition_id = %partition.id,
            shards = partition.shard_ids.len(),
            "[l2-sharding] {:?} partition created", partition.kind
        );
        self.observer.emit(
            LedgerEvent::PartitionCreated {
                partition_id: partition.id.to_string(),
                kind: format!("{:?}", partition.kind),
            },
            partition.id.as_str(),
            "partition.created",
            partition.config.clone(),
        );
        Ok(partition)
    }

    fn rebalance_partition(&self, id: &PartitionId, config: String) -> ShardResult<()> {
        {
            let mut table = self.table.write();
            let partition = table
                .partitions
                .get_mut(id)
                .ok_or_else(|| ShardError::partition_not_found(id.as_str()))?;
            partition.log_intent(
                PartitionIntentKind::Rebalance,
                config.clone(),
                current_timestamp(),
            )?;
            partition.config = config.clone();
        }

        info!("[l2-sharding] Partition {} rebalanced", id);
        self.observer.emit(
            LedgerEvent::PartitionIntentRecorded {
                partition_id: id.to_string(),
                intent: format!("{:?}", PartitionIntentKind::Rebalance),
            },
            id.as_str(),
            "partition.rebalanced",
            config,
        );
        Ok(())
    }

    fn record_horizontal_partition(&self, id: &PartitionId, details: &str) -> ShardResult<()> {
        self.record_intent(id, PartitionIntentKind::HorizontalSplit, details.to_string())
    }

    fn record_vertical_partition(&self, id: &PartitionId, details: &str) -> ShardResult<()> {
        self.record_intent(id, PartitionIntentKind::VerticalSplit, details.to_string())
    }

    fn get_partition(&self, id: &PartitionId) -> ShardResult<Partition> {
        self.table
            .read()
            .partitions
            .get(id)
            .cloned()
            .ok_or_else(|| ShardError::partition_not_found(id.as_str()))
    }

    fn list_partitions(&self) -> Vec<Partition> {
        self.table.read().partitions.values().cloned().collect()
    }
}
