//! # Shared Bus - Structured Ledger Events
//!
//! Observability for the ledger core is layered outside the stores: every
//! successful command publishes a [`LedgerEvent`] and forgets about it.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ RollupService│                    │  Subscriber  │
//! │  ShardStore  │    publish()       │ (audit, UI,  │
//! │     ...      │ ──────┐            │  indexers)   │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Publishing never fails the caller: an event with no receivers is dropped
//! and logged.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod observer;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, LedgerEvent, Subsystem};
pub use observer::LedgerObserver;
pub use publisher::{EventPublisher, InMemoryEventBus, NullEventPublisher};
pub use subscriber::{EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
