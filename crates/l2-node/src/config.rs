//! # Node Configuration
//!
//! Unified configuration for both subsystems and the runtime.
//!
//! Defaults can be overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `L2_MAX_BATCH_TXS` | `rollup.max_batch_transactions` |
//! | `L2_CHALLENGE_EXPIRY_SECS` | `rollup.challenge_expiry_secs` |
//! | `L2_SHARD_QUOTA` | `sharding.default_resource_quota` |
//! | `L2_MAX_SHARD_QUOTA` | `sharding.max_resource_quota` |
//! | `L2_EVENT_CAPACITY` | `event_channel_capacity` |
//! | `L2_PLACEMENT_REPLICAS` | `placement_replicas` |
//! | `L2_INBOX_CAPACITY` | `sharding.max_inbox_messages` |
//! | `L2_HISTORY_CAPACITY` | `history_capacity` |
//!
//! Unparsable values are ignored with a warning.

use crate::error::{NodeError, NodeResult};
use l2_rollup::RollupConfig;
use l2_sharding::ShardConfig;
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use std::str::FromStr;
use tracing::{info, warn};

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Rollup subsystem limits.
    pub rollup: RollupConfig,
    /// Sharding subsystem limits.
    pub sharding: ShardConfig,
    /// Events buffered per subscriber.
    pub event_channel_capacity: usize,
    /// Shards each rollup is placed on.
    pub placement_replicas: usize,
    /// History records retained in memory.
    pub history_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rollup: RollupConfig::default(),
            sharding: ShardConfig::default(),
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            placement_replicas: 2,
            history_capacity: 100_000,
        }
    }
}

impl NodeConfig {
    /// Small limits for tests.
    pub fn for_testing() -> Self {
        Self {
            rollup: RollupConfig::for_testing(),
            sharding: ShardConfig::for_testing(),
            event_channel_capacity: 64,
            placement_replicas: 2,
            history_capacity: 1_024,
        }
    }

    /// Defaults overridden from `L2_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        override_from(&lookup, "L2_MAX_BATCH_TXS", &mut config.rollup.max_batch_transactions);
        override_from(
            &lookup,
            "L2_CHALLENGE_EXPIRY_SECS",
            &mut config.rollup.challenge_expiry_secs,
        );
        override_from(&lookup, "L2_SHARD_QUOTA", &mut config.sharding.default_resource_quota);
        override_from(&lookup, "L2_MAX_SHARD_QUOTA", &mut config.sharding.max_resource_quota);
        override_from(&lookup, "L2_EVENT_CAPACITY", &mut config.event_channel_capacity);
        override_from(&lookup, "L2_PLACEMENT_REPLICAS", &mut config.placement_replicas);
        override_from(&lookup, "L2_INBOX_CAPACITY", &mut config.sharding.max_inbox_messages);
        override_from(&lookup, "L2_HISTORY_CAPACITY", &mut config.history_capacity);
        config
    }

    /// Reject zero limits and a default quota above the maximum.
    pub fn validate(&self) -> NodeResult<()> {
        self.rollup.validate()?;
        self.sharding.validate()?;
        if self.event_channel_capacity == 0 {
            return Err(NodeError::Config(
                "event_channel_capacity must be non-zero".to_string(),
            ));
        }
        if self.placement_replicas == 0 {
            return Err(NodeError::Config(
                "placement_replicas must be non-zero".to_string(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(NodeError::Config(
                "history_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn override_from<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => {
            info!(key, value = %raw.trim(), "[l2-node] Config override");
            *target = value;
        }
        Err(_) => warn!(key, value = %raw, "[l2-node] Ignoring unparsable config value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.event_channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert!(NodeConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_overrides_applied() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("L2_MAX_BATCH_TXS", "50"),
            ("L2_SHARD_QUOTA", " 20 "),
            ("L2_PLACEMENT_REPLICAS", "3"),
            ("L2_HISTORY_CAPACITY", "500"),
        ]));
        assert_eq!(config.history_capacity, 500);
        assert_eq!(config.rollup.max_batch_transactions, 50);
        assert_eq!(config.sharding.default_resource_quota, 20);
        assert_eq!(config.placement_replicas, 3);
        assert_eq!(config.rollup.challenge_expiry_secs, 604_800);
    }

    #[test]
    fn test_unparsable_override_ignored() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("L2_EVENT_CAPACITY", "lots"),
            ("L2_CHALLENGE_EXPIRY_SECS", "-1"),
        ]));
        assert_eq!(config.event_channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.rollup.challenge_expiry_secs, 604_800);
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let config = NodeConfig::from_lookup(lookup(&[("L2_PLACEMENT_REPLICAS", "0")]));
        assert!(matches!(config.validate(), Err(NodeError::Config(_))));

        let config = NodeConfig::from_lookup(lookup(&[
            ("L2_SHARD_QUOTA", "500"),
            ("L2_MAX_SHARD_QUOTA", "100"),
        ]));
        assert!(matches!(config.validate(), Err(NodeError::Sharding(_))));

        let config = NodeConfig::from_lookup(lookup(&[("L2_MAX_BATCH_TXS", "0")]));
        assert!(matches!(config.validate(), Err(NodeError::Rollup(_))));

        let config = NodeConfig::from_lookup(lookup(&[("L2_HISTORY_CAPACITY", "0")]));
        assert!(matches!(config.validate(), Err(NodeError::Config(_))));

        let config = NodeConfig::from_lookup(lookup(&[("L2_INBOX_CAPACITY", "0")]));
        assert!(matches!(config.validate(), Err(NodeError::Sharding(_))));
    }
}
