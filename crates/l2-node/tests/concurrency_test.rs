//! # Concurrency Integration Tests
//!
//! Many threads driving one node. Each store serializes its own writes, so
//! no update may be lost and no identity may repeat.

use std::collections::HashSet;
use std::sync::Arc;

use l2_node::{CommitmentVerifier, Node, NodeConfig};
use l2_rollup::{BatchId, ProofKind, RollupApi};
use l2_sharding::{NewShard, ShardingApi};
use shared_types::LedgerTransaction;

const THREADS: usize = 8;
const PER_THREAD: usize = 25;

fn node() -> Node<CommitmentVerifier> {
    Node::new(NodeConfig::for_testing(), Arc::new(CommitmentVerifier))
}

#[test]
fn test_concurrent_create_batch_yields_distinct_ids() {
    let node = node();
    let rollup = node.rollups().create_rollup("validator-1").unwrap();

    let ids: Vec<BatchId> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    (0..PER_THREAD)
                        .map(|_| node.rollups().create_batch(&rollup).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let unique: HashSet<BatchId> = ids.iter().copied().collect();
    assert_eq!(ids.len(), THREADS * PER_THREAD);
    assert_eq!(unique.len(), ids.len());

    let recorded = node.rollups().get_rollup(&rollup).unwrap().batches;
    assert_eq!(recorded.len(), THREADS * PER_THREAD);
    assert_eq!(
        node.rollups().batches_for_rollup(&rollup).unwrap().len(),
        THREADS * PER_THREAD
    );
}

#[test]
fn test_concurrent_validation_and_challenges() {
    let node = node();
    let rollup = node.rollups().create_rollup("validator-1").unwrap();
    let batches: Vec<BatchId> = (0..THREADS)
        .map(|_| node.rollups().create_batch(&rollup).unwrap())
        .collect();

    std::thread::scope(|scope| {
        for (i, batch) in batches.iter().enumerate() {
            let node = &node;
            scope.spawn(move || {
                let rollups = node.rollups();
                let proof = rollups
                    .generate_proof(
                        ProofKind::ZkProof,
                        batch.subject(),
                        CommitmentVerifier::commit(format!("root-{}", i).as_bytes()),
                    )
                    .unwrap();
                rollups.validate_proof(&proof, "validator-1").unwrap();
                rollups.validate_batch(batch).unwrap();
                rollups.broadcast_batch(batch).unwrap();
                rollups.submit_batch(batch).unwrap();
                rollups
                    .submit_challenge(format!("c-{}", i).into(), batch)
                    .unwrap();
            });
        }
    });

    for batch in &batches {
        assert!(node.rollups().has_open_challenge(batch));
        assert!(node.rollups().finalize_batch(batch).is_err());
    }
}

#[test]
fn test_concurrent_shard_transactions_respect_capacity() {
    let node = node();
    node.shards().create_shard(NewShard::new("s1", "node-1")).unwrap();
    let limit = node.config().sharding.max_transactions_per_shard;

    let accepted: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let node = &node;
                scope.spawn(move || {
                    (0..PER_THREAD)
                        .filter(|n| {
                            node.shards()
                                .add_shard_transaction(
                                    &"s1".into(),
                                    LedgerTransaction::new(format!("tx-{}-{}", t, n), vec![]),
                                )
                                .is_ok()
                        })
                        .count()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(accepted, limit);
    assert_eq!(
        node.shards().get_shard(&"s1".into()).unwrap().transactions.len(),
        limit
    );
}
