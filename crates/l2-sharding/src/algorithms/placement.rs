//! # Rollup Placement
//!
//! Deterministic placement of a key (usually a rollup ID) onto shards using
//! rendezvous hashing, also known as "highest random weight" hashing.
//!
//! When a shard joins the candidate set only about 1/N keys move to it, so
//! placements stay stable as the shard set grows.

use crate::domain::ShardId;
use sha3::{Digest, Keccak256};

/// Weight of `shard` for `key`.
///
/// A zero byte separates the two so `("ab", "c")` and `("a", "bc")` differ.
pub fn rendezvous_weight(key: &str, shard: &ShardId) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(key.as_bytes());
    hasher.update([0u8]);
    hasher.update(shard.as_str().as_bytes());
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Highest-weight shard for `key`, or `None` if there are no candidates.
pub fn rendezvous_pick(key: &str, candidates: &[ShardId]) -> Option<ShardId> {
    candidates
        .iter()
        .max_by(|a, b| {
            rendezvous_weight(key, a)
                .cmp(&rendezvous_weight(key, b))
                .then_with(|| b.cmp(a))
        })
        .cloned()
}

/// The `replicas` highest-weight shards for `key`, primary first.
///
/// Duplicate candidates are considered once. Returns fewer than `replicas`
/// shards when there are not enough candidates.
pub fn place(key: &str, candidates: &[ShardId], replicas: usize) -> Vec<ShardId> {
    let mut weighted: Vec<([u8; 32], &ShardId)> = candidates
        .iter()
        .map(|shard| (rendezvous_weight(key, shard), shard))
        .collect();

    // Highest weight first; ties broken by shard id for determinism.
    weighted.sort_by(|(wa, a), (wb, b)| wb.cmp(wa).then_with(|| a.cmp(b)));
    weighted.dedup_by(|(_, a), (_, b)| a == b);

    weighted
        .into_iter()
        .take(replicas)
        .map(|(_, shard)| shard.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shards(n: usize) -> Vec<ShardId> {
        (0..n).map(|i| ShardId::new(format!("shard-{}", i))).collect()
    }

    #[test]
    fn test_rendezvous_pick_deterministic() {
        let candidates = shards(4);
        let first = rendezvous_pick("rollup-42", &candidates);
        let second = rendezvous_pick("rollup-42", &candidates);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rendezvous_pick_within_candidates() {
        let candidates = shards(4);
        let shard = rendezvous_pick("rollup-42", &candidates).unwrap();
        assert!(candidates.contains(&shard));
    }

    #[test]
    fn test_rendezvous_pick_empty() {
        assert_eq!(rendezvous_pick("rollup-1", &[]), None);
    }

    #[test]
    fn test_place_primary_matches_pick() {
        let candidates = shards(6);
        let placed = place("rollup-7", &candidates, 3);
        assert_eq!(placed.len(), 3);
        assert_eq!(Some(placed[0].clone()), rendezvous_pick("rollup-7", &candidates));
    }

    #[test]
    fn test_place_order_independent() {
        let candidates = shards(5);
        let mut reversed = candidates.clone();
        reversed.reverse();
        assert_eq!(place("k", &candidates, 2), place("k", &reversed, 2));
    }

    #[test]
    fn test_place_caps_at_candidate_count() {
        let mut candidates = shards(2);
        candidates.push(candidates[0].clone());
        let placed = place("rollup-1", &candidates, 5);
        assert_eq!(placed.len(), 2);
        assert_ne!(placed[0], placed[1]);
    }

    #[test]
    fn test_rendezvous_minimal_reassignment() {
        // When adding a shard, roughly 1/n keys should move.
        let four = shards(4);
        let five = shards(5);

        let mut moved = 0;
        for i in 0..100 {
            let key = format!("rollup-{}", i);
            if rendezvous_pick(&key, &four) != rendezvous_pick(&key, &five) {
                moved += 1;
            }
        }

        assert!((5..=45).contains(&moved), "Moved {} keys", moved);
    }
}
