//! # Node Container
//!
//! Holds both subsystems over one event bus and one history sink.
//!
//! ```text
//!                ┌──────────────────────────────┐
//!                │             Node             │
//!                │                              │
//!   commands ──► │  RollupService   ShardStore  │
//!                │                PartitionStore│
//!                │         │            │       │
//!                │         ▼            ▼       │
//!                │    LedgerObserver (shared)   │
//!                └─────────┬────────────┬───────┘
//!                          ▼            ▼
//!                  InMemoryEventBus  InMemoryHistorySink
//! ```
//!
//! The subsystems never call each other. Cross-subsystem flows
//! (placement, partition creation) live here.

use crate::config::NodeConfig;
use crate::error::{NodeError, NodeResult};
use l2_rollup::{ProofVerifier, RollupApi, RollupId, RollupService, RollupSnapshot};
use l2_sharding::{
    place, Partition, PartitionId, PartitionKind, PartitionStore, PartitionTable,
    PartitioningApi, ShardError, ShardId, ShardStore, ShardTable, ShardingApi,
};
use serde::{Deserialize, Serialize};
use shared_bus::{InMemoryEventBus, LedgerObserver};
use shared_types::InMemoryHistorySink;
use std::sync::Arc;
use tracing::{info, warn};

/// Persisted state of every store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct NodeSnapshot {
    rollup: RollupSnapshot,
    shards: ShardTable,
    partitions: PartitionTable,
}

/// Body of the message a primary shard sends to each replica.
pub fn placement_announcement(rollup: &RollupId) -> Vec<u8> {
    format!("rollup-placed:{}", rollup).into_bytes()
}

/// The wired node.
pub struct Node<V: ProofVerifier> {
    config: NodeConfig,
    bus: Arc<InMemoryEventBus>,
    history: Arc<InMemoryHistorySink>,
    rollups: RollupService<V>,
    shards: ShardStore,
    partitions: PartitionStore,
}

impl<V: ProofVerifier> Node<V> {
    /// Create a node with empty stores.
    pub fn new(config: NodeConfig, verifier: Arc<V>) -> Self {
        Self::assemble(config, verifier, NodeSnapshot::default())
    }

    /// Rebuild a node from [`Node::snapshot`] output.
    pub fn restore(config: NodeConfig, verifier: Arc<V>, bytes: &[u8]) -> NodeResult<Self> {
        let snapshot: NodeSnapshot =
            bincode::deserialize(bytes).map_err(|e| NodeError::Snapshot(e.to_string()))?;
        info!(
            rollups = snapshot.rollup.registry.len(),
            shards = snapshot.shards.len(),
            partitions = snapshot.partitions.len(),
            "[l2-node] Restored from snapshot"
        );
        Ok(Self::assemble(config, verifier, snapshot))
    }

    fn assemble(config: NodeConfig, verifier: Arc<V>, snapshot: NodeSnapshot) -> Self {
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_channel_capacity));
        let history = Arc::new(InMemoryHistorySink::bounded(config.history_capacity));
        let observer = LedgerObserver::new(bus.clone(), history.clone());

        let rollups = RollupService::restore(
            config.rollup.clone(),
            snapshot.rollup,
            verifier,
            observer.clone(),
        );
        let shards = ShardStore::restore(config.sharding.clone(), snapshot.shards, observer.clone());
        let partitions = PartitionStore::restore(snapshot.partitions, observer);

        Self {
            config,
            bus,
            history,
            rollups,
            shards,
            partitions,
        }
    }

    /// Bincode encoding of every store.
    ///
    /// Each store is copied under its own locks; the snapshot is not atomic
    /// across subsystems.
    pub fn snapshot(&self) -> NodeResult<Vec<u8>> {
        let snapshot = NodeSnapshot {
            rollup: self.rollups.snapshot(),
            shards: self.shards.snapshot(),
            partitions: self.partitions.snapshot(),
        };
        bincode::serialize(&snapshot).map_err(|e| NodeError::Snapshot(e.to_string()))
    }

    /// Place a rollup on `placement_replicas` active shards.
    ///
    /// The first shard returned is the primary. Placing again converges the
    /// hosts onto the new placement: open shards outside it are detached.
    /// The primary announces itself to replicas that were not hosting yet,
    /// or to every replica when the primary moved. On failure the attach
    /// and detach steps are undone; announcements already sent stay queued.
    pub fn place_rollup(&self, rollup: &RollupId) -> NodeResult<Vec<ShardId>> {
        self.rollups.get_rollup(rollup)?;

        let key = rollup.to_string();
        let candidates = self.shards.active_shards();
        let placement = place(&key, &candidates, self.config.placement_replicas);
        let Some((primary, replicas)) = placement.split_first() else {
            warn!(rollup_id = %rollup, "[l2-node] No active shard for placement");
            return Err(NodeError::NoActiveShards(key));
        };

        let hosts = self.open_hosts(&key);
        let previous_primary = place(&key, &hosts, 1).into_iter().next();
        let primary_moved = previous_primary.as_ref() != Some(primary);

        let mut attached = Vec::new();
        let mut detached = Vec::new();
        let applied = self
            .converge(&key, &placement, &hosts, &mut attached, &mut detached)
            .and_then(|()| {
                for replica in replicas {
                    if primary_moved || attached.contains(replica) {
                        self.shards.send_cross_shard_message(
                            primary,
                            replica,
                            placement_announcement(rollup),
                        )?;
                    }
                }
                Ok(())
            });
        if let Err(e) = applied {
            warn!(rollup_id = %rollup, error = %e, "[l2-node] Placement failed, undoing");
            self.undo_placement(&key, &attached, &detached);
            return Err(e.into());
        }

        info!(
            rollup_id = %rollup,
            primary = %primary,
            replicas = replicas.len(),
            attached = attached.len(),
            detached = detached.len(),
            "[l2-node] Rollup placed"
        );
        Ok(placement)
    }

    /// Remove a rollup and detach it from every open shard hosting it.
    ///
    /// Returns the shards it was detached from. Closed shards keep their
    /// frozen record.
    pub fn remove_rollup(&self, rollup: &RollupId) -> NodeResult<Vec<ShardId>> {
        self.rollups.remove_rollup(rollup)?;

        let key = rollup.to_string();
        let mut detached = Vec::new();
        for shard in self.open_hosts(&key) {
            match self.shards.detach_rollup(&shard, &key) {
                Ok(()) => detached.push(shard),
                Err(e) => warn!(
                    rollup_id = %rollup,
                    shard_id = %shard,
                    error = %e,
                    "[l2-node] Could not detach removed rollup"
                ),
            }
        }
        info!(
            rollup_id = %rollup,
            shards = detached.len(),
            "[l2-node] Rollup removed from its shards"
        );
        Ok(detached)
    }

    /// Open shards currently hosting `key`.
    fn open_hosts(&self, key: &str) -> Vec<ShardId> {
        self.shards
            .list_shards()
            .into_iter()
            .filter(|shard| !shard.status.is_terminal() && shard.hosted_rollups.contains(key))
            .map(|shard| shard.id)
            .collect()
    }

    fn converge(
        &self,
        key: &str,
        placement: &[ShardId],
        hosts: &[ShardId],
        attached: &mut Vec<ShardId>,
        detached: &mut Vec<ShardId>,
    ) -> Result<(), ShardError> {
        for shard in placement.iter().filter(|s| !hosts.contains(s)) {
            self.shards.attach_rollup(shard, key)?;
            attached.push(shard.clone());
        }
        for shard in hosts.iter().filter(|s| !placement.contains(s)) {
            self.shards.detach_rollup(shard, key)?;
            detached.push(shard.clone());
        }
        Ok(())
    }

    fn undo_placement(&self, key: &str, attached: &[ShardId], detached: &[ShardId]) {
        for shard in attached {
            if let Err(e) = self.shards.detach_rollup(shard, key) {
                warn!(shard_id = %shard, error = %e, "[l2-node] Undo attach failed");
            }
        }
        for shard in detached {
            if let Err(e) = self.shards.attach_rollup(shard, key) {
                warn!(shard_id = %shard, error = %e, "[l2-node] Undo detach failed");
            }
        }
    }

    /// Create a partition after checking every referenced shard exists.
    pub fn create_partition(
        &self,
        id: PartitionId,
        kind: PartitionKind,
        config: String,
        shard_ids: Vec<ShardId>,
    ) -> NodeResult<Partition> {
        for shard in &shard_ids {
            self.shards.get_shard(shard)?;
        }
        Ok(self.partitions.create_partition(id, kind, config, shard_ids)?)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Rollup subsystem.
    pub fn rollups(&self) -> &RollupService<V> {
        &self.rollups
    }

    /// Shard store.
    pub fn shards(&self) -> &ShardStore {
        &self.shards
    }

    /// Partition store.
    pub fn partitions(&self) -> &PartitionStore {
        &self.partitions
    }

    /// Event bus every store publishes to.
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// History sink every store appends to.
    pub fn history(&self) -> &Arc<InMemoryHistorySink> {
        &self.history
    }
}
