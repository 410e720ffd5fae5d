//! # Transaction History Sink
//!
//! Outbound port to the consensus-coin transaction history.
//!
//! The ledger core calls the sink as a fire-and-forget observer: records are
//! appended and never read back by the core.

use crate::entities::HistoryRecord;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::trace;

/// Append-only history collaborator.
pub trait HistorySink: Send + Sync {
    /// Append a record. Must not fail the caller.
    fn append(&self, record: HistoryRecord);
}

/// Sink that discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHistorySink;

impl HistorySink for NullHistorySink {
    fn append(&self, record: HistoryRecord) {
        trace!(id = %record.id, action = %record.action, "history record discarded");
    }
}

/// In-memory sink, used by the node runtime and tests.
///
/// A bounded sink keeps only the newest `capacity` records.
#[derive(Debug, Default)]
pub struct InMemoryHistorySink {
    records: Mutex<VecDeque<HistoryRecord>>,
    capacity: Option<usize>,
}

impl InMemoryHistorySink {
    /// Create an empty, unbounded sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that evicts the oldest record past `capacity`.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1_024))),
            capacity: Some(capacity.max(1)),
        }
    }

    /// Copy of every retained record, oldest first.
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Records whose action matches exactly.
    pub fn records_for_action(&self, action: &str) -> Vec<HistoryRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.action == action)
            .cloned()
            .collect()
    }

    /// Number of records retained.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True if nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl HistorySink for InMemoryHistorySink {
    fn append(&self, record: HistoryRecord) {
        let mut records = self.records.lock();
        if let Some(capacity) = self.capacity {
            while records.len() >= capacity {
                records.pop_front();
            }
        }
        records.push_back(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_sink_keeps_order() {
        let sink = InMemoryHistorySink::new();
        sink.append(HistoryRecord::now("a", "rollup.created", ""));
        sink.append(HistoryRecord::now("b", "batch.created", ""));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[1].id, "b");
    }

    #[test]
    fn test_records_for_action() {
        let sink = InMemoryHistorySink::new();
        sink.append(HistoryRecord::now("a", "rollup.created", ""));
        sink.append(HistoryRecord::now("b", "rollup.created", ""));
        sink.append(HistoryRecord::now("c", "batch.created", ""));

        assert_eq!(sink.records_for_action("rollup.created").len(), 2);
        assert!(sink.records_for_action("proof.validated").is_empty());
    }

    #[test]
    fn test_bounded_sink_evicts_oldest() {
        let sink = InMemoryHistorySink::bounded(2);
        for id in ["a", "b", "c"] {
            sink.append(HistoryRecord::now(id, "rollup.created", ""));
        }

        let ids: Vec<String> = sink.records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(sink.capacity(), Some(2));
    }

    #[test]
    fn test_null_sink_accepts_records() {
        let sink = NullHistorySink;
        sink.append(HistoryRecord::now("x", "noop", ""));
    }
}
