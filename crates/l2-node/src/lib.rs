//! # L2 Node
//!
//! Runtime wiring for the layer-2 ledger. The binary in `main.rs` builds a
//! [`Node`] from environment configuration; this library exposes the same
//! pieces for tests and embedding.
//!
//! - `config/` - [`NodeConfig`] with `L2_*` environment overrides
//! - `container/` - [`Node`]: stores, bus, history sink, placement, snapshots
//! - `adapters/` - [`CommitmentVerifier`] for the rollup `ProofVerifier` port

#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod container;
pub mod error;

pub use adapters::CommitmentVerifier;
pub use config::NodeConfig;
pub use container::{placement_announcement, Node};
pub use error::{NodeError, NodeResult};
