//! # Core Domain Entities
//!
//! Records that cross subsystem boundaries.
//!
//! ## Clusters
//!
//! - **Transactions**: `LedgerTransaction`, carried by batches and shards
//! - **History**: `HistoryRecord`, appended to the consensus-coin history sink

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Current unix time in seconds.
///
/// Falls back to zero if the system clock is before the epoch.
pub fn current_timestamp() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// A transaction as carried by a rollup batch or a shard.
///
/// The payload is opaque to the ledger core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Caller-assigned transaction identifier.
    pub tx_id: String,
    /// Opaque transaction body.
    pub payload: Vec<u8>,
}

impl LedgerTransaction {
    /// Create a transaction record.
    pub fn new(tx_id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            tx_id: tx_id.into(),
            payload,
        }
    }

    /// A transaction is well-formed when it carries a non-empty identifier.
    pub fn is_well_formed(&self) -> bool {
        !self.tx_id.trim().is_empty()
    }
}

/// An append-only event record for the consensus-coin transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Identifier of the entity the action applies to.
    pub id: String,
    /// Action name, e.g. `batch.finalized`.
    pub action: String,
    /// Free-form details.
    pub details: String,
    /// When the action happened.
    pub timestamp: Timestamp,
}

impl HistoryRecord {
    /// Create a record stamped with the current time.
    pub fn now(id: impl Into<String>, action: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            details: details.into(),
            timestamp: current_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_well_formed() {
        assert!(LedgerTransaction::new("tx-1", vec![1, 2]).is_well_formed());
        assert!(!LedgerTransaction::new("  ", vec![]).is_well_formed());
    }

    #[test]
    fn test_history_record_timestamped() {
        let record = HistoryRecord::now("s1", "shard.created", "node=n1");
        assert_eq!(record.action, "shard.created");
        assert!(record.timestamp > 0);
    }

    #[test]
    fn test_transaction_serde() {
        let tx = LedgerTransaction::new("tx-9", vec![9; 4]);
        let json = serde_json::to_string(&tx).unwrap();
        let back: LedgerTransaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }
}
