//! # Ledger Observer
//!
//! Pairs the event bus with the transaction-history sink so that a store
//! emits both from one call after a command commits.

use crate::events::LedgerEvent;
use crate::publisher::{EventPublisher, NullEventPublisher};
use shared_types::{HistoryRecord, HistorySink, NullHistorySink};
use std::sync::Arc;

/// Fire-and-forget observer handed to every store.
#[derive(Clone)]
pub struct LedgerObserver {
    publisher: Arc<dyn EventPublisher>,
    history: Arc<dyn HistorySink>,
}

impl LedgerObserver {
    /// Create an observer over a publisher and a history sink.
    pub fn new(publisher: Arc<dyn EventPublisher>, history: Arc<dyn HistorySink>) -> Self {
        Self { publisher, history }
    }

    /// Observer that discards everything.
    pub fn detached() -> Self {
        Self::new(
            Arc::new(NullEventPublisher::default()),
            Arc::new(NullHistorySink),
        )
    }

    /// Publish `event` and append a history record for `id`.
    pub fn emit(&self, event: LedgerEvent, id: &str, action: &str, details: String) {
        self.publisher.publish(event);
        self.history.append(HistoryRecord::now(id, action, details));
    }

    /// Events published through this observer's publisher.
    pub fn events_published(&self) -> u64 {
        self.publisher.events_published()
    }
}

impl Default for LedgerObserver {
    fn default() -> Self {
        Self::detached()
    }
}

impl std::fmt::Debug for LedgerObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerObserver")
            .field("events_published", &self.events_published())
            .finish()
    }
}
