//! # Event Subscriber
//!
//! Receiving side of the ledger bus. Filtering happens here, after the
//! broadcast, so one channel serves every topic.

use crate::events::{EventFilter, LedgerEvent};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,
}

/// Anything that can hand out filtered subscriptions.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to events matching a filter.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// A filtered view over the bus.
///
/// A slow subscriber loses the oldest events once the channel fills; the
/// loss is counted in [`Subscription::missed`].
pub struct Subscription {
    receiver: broadcast::Receiver<LedgerEvent>,
    filter: EventFilter,
    missed: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<LedgerEvent>, filter: EventFilter) -> Self {
        Self {
            receiver,
            filter,
            missed: 0,
        }
    }

    fn note_lag(&mut self, count: u64) {
        self.missed = self.missed.saturating_add(count);
        warn!(lagged = count, total = self.missed, "subscriber fell behind, events lost");
    }

    /// Wait for the next matching event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<LedgerEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(count)) => self.note_lag(count),
                Err(RecvError::Closed) => {
                    debug!(topics = ?self.filter.topics, "bus closed");
                    return None;
                }
            }
        }
    }

    /// Non-blocking receive; `Ok(None)` means nothing is buffered.
    pub fn try_recv(&mut self) -> Result<Option<LedgerEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(count)) => self.note_lag(count),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    /// Everything matching that is buffered right now, oldest first.
    pub fn drain(&mut self) -> Vec<LedgerEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Events this subscription lost to channel overflow.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventTopic;
    use crate::publisher::InMemoryEventBus;
    use crate::EventPublisher;
    use std::time::Duration;
    use tokio::time::timeout;

    fn shard_created() -> LedgerEvent {
        LedgerEvent::ShardCreated {
            shard_id: "s1".into(),
            node_id: "n1".into(),
        }
    }

    fn proof_generated() -> LedgerEvent {
        LedgerEvent::ProofGenerated {
            proof_id: "p1".into(),
            kind: "ZkProof".into(),
            subject: "b1".into(),
        }
    }

    #[tokio::test]
    async fn test_subscription_recv() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        bus.publish(shard_created());

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");

        assert!(matches!(received, LedgerEvent::ShardCreated { .. }));
    }

    #[tokio::test]
    async fn test_subscription_filter() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Proof]));

        bus.publish(shard_created());
        bus.publish(proof_generated());

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");

        assert!(matches!(received, LedgerEvent::ProofGenerated { .. }));
    }

    #[tokio::test]
    async fn test_subscription_drop_cleanup() {
        let bus = InMemoryEventBus::new();

        {
            let _sub1 = bus.subscribe(EventFilter::all());
            let _sub2 = bus.subscribe(EventFilter::all());
            assert_eq!(bus.subscriber_count(), 2);
        }

        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_try_recv_empty() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[test]
    fn test_drain_in_order() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        bus.publish(shard_created());
        bus.publish(proof_generated());

        let events = sub.drain();
        assert_eq!(events, vec![shard_created(), proof_generated()]);
    }

    #[test]
    fn test_overflow_counts_missed_events() {
        let bus = InMemoryEventBus::with_capacity(2);
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Shard]));

        for _ in 0..5 {
            bus.publish(shard_created());
        }

        assert_eq!(sub.drain().len(), 2);
        assert_eq!(sub.missed(), 3);
        assert_eq!(sub.filter().topics, vec![EventTopic::Shard]);
    }
}
