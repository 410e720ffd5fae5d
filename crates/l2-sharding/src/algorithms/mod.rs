//! # Algorithms Module
//!
//! Placement of rollups onto shards.

pub mod placement;

pub use placement::{place, rendezvous_pick, rendezvous_weight};
