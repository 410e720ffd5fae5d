//! # Domain Invariants
//!
//! Business rules that must always hold true for shards and partitions.

use super::errors::{ShardError, ShardResult};
use super::value_objects::ShardId;
use std::collections::HashSet;

/// Minimum children a split must produce.
pub const MIN_SPLIT_CHILDREN: usize = 2;

/// Invariant: resource quota is positive and within the configured maximum.
pub fn invariant_quota_within_limit(requested: u64, max: u64) -> ShardResult<()> {
    if requested == 0 {
        return Err(ShardError::InvalidInput(
            "resource quota must be positive".to_string(),
        ));
    }
    if requested > max {
        return Err(ShardError::QuotaExceeded { requested, max });
    }
    Ok(())
}

/// Invariant: a shard's transaction log never exceeds its limit.
pub fn invariant_transaction_capacity(
    shard: &ShardId,
    current: usize,
    limit: usize,
) -> ShardResult<()> {
    if current >= limit {
        return Err(ShardError::CapacityExceeded {
            shard: shard.to_string(),
            limit,
        });
    }
    Ok(())
}

/// Invariant: split children are non-blank, distinct, and not the source.
pub fn invariant_split_children(source: &ShardId, children: &[ShardId]) -> ShardResult<()> {
    if children.len() < MIN_SPLIT_CHILDREN {
        return Err(ShardError::InvalidInput(format!(
            "split needs at least {} children, got {}",
            MIN_SPLIT_CHILDREN,
            children.len()
        )));
    }

    let mut seen = HashSet::with_capacity(children.len());
    for child in children {
        if child.is_blank() {
            return Err(ShardError::InvalidInput("blank child shard id".to_string()));
        }
        if child == source {
            return Err(ShardError::InvalidInput(format!(
                "shard {} cannot be its own child",
                source
            )));
        }
        if !seen.insert(child) {
            return Err(ShardError::InvalidInput(format!(
                "duplicate child shard id {}",
                child
            )));
        }
    }
    Ok(())
}

/// Invariant: the two sides of a pairwise operation are distinct shards.
pub fn invariant_distinct_pair(a: &ShardId, b: &ShardId) -> ShardResult<()> {
    if a == b {
        return Err(ShardError::InvalidInput(format!(
            "shard {} paired with itself",
            a
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<ShardId> {
        raw.iter().map(|s| ShardId::from(*s)).collect()
    }

    #[test]
    fn test_invariant_quota_pass() {
        assert!(invariant_quota_within_limit(100, 100).is_ok());
    }

    #[test]
    fn test_invariant_quota_zero_fails() {
        assert!(matches!(
            invariant_quota_within_limit(0, 100),
            Err(ShardError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invariant_quota_above_max_fails() {
        assert!(matches!(
            invariant_quota_within_limit(101, 100),
            Err(ShardError::QuotaExceeded { requested: 101, max: 100 })
        ));
    }

    #[test]
    fn test_invariant_transaction_capacity() {
        let shard = ShardId::from("s1");
        assert!(invariant_transaction_capacity(&shard, 7, 8).is_ok());
        assert!(invariant_transaction_capacity(&shard, 8, 8).is_err());
    }

    #[test]
    fn test_invariant_split_children_pass() {
        let source = ShardId::from("s1");
        assert!(invariant_split_children(&source, &ids(&["s1a", "s1b"])).is_ok());
    }

    #[test]
    fn test_invariant_split_children_too_few() {
        let source = ShardId::from("s1");
        assert!(invariant_split_children(&source, &ids(&["s1a"])).is_err());
    }

    #[test]
    fn test_invariant_split_children_duplicate() {
        let source = ShardId::from("s1");
        assert!(invariant_split_children(&source, &ids(&["s1a", "s1a"])).is_err());
    }

    #[test]
    fn test_invariant_split_children_self_reference() {
        let source = ShardId::from("s1");
        assert!(invariant_split_children(&source, &ids(&["s1", "s2"])).is_err());
    }

    #[test]
    fn test_invariant_distinct_pair() {
        let a = ShardId::from("a");
        assert!(invariant_distinct_pair(&a, &ShardId::from("b")).is_ok());
        assert!(invariant_distinct_pair(&a, &a).is_err());
    }
}
