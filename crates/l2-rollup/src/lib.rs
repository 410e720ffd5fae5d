//! # L2 Rollup
//!
//! Rollups, the batches they post, the proofs attached to those batches and
//! the fraud-challenge protocol that can push a batch back.
//!
//! ## Batch Lifecycle
//!
//! ```text
//! Created ─► Validated ─► Broadcast ─► Submitted ─► Finalized
//!    ▲            │            │            │
//!    └────────────┴────────────┴────────────┘   upheld challenge
//!
//! Created | Validated | Broadcast | Submitted ─► Removed
//! ```
//!
//! - `Validated` needs a `Validated` proof filed under the batch
//! - `Finalized` needs no open challenge against the batch
//! - `Finalized` and `Removed` are terminal
//!
//! ## Module Structure
//!
//! ```text
//! l2-rollup/
//! ├── domain/     # Rollup, Batch, Proof, Challenge and their state machines
//! ├── store/      # RollupRegistry, BatchPipeline, ProofLedger, ChallengeProtocol
//! ├── ports/      # RollupApi (inbound), ProofVerifier (outbound)
//! ├── service.rs  # RollupService: locking, events, history
//! └── metrics.rs  # Prometheus counters (feature = "metrics")
//! ```

#![warn(clippy::all)]

pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod store;

// Re-exports
pub use domain::{
    Batch, BatchId, BatchState, Challenge, ChallengeId, ChallengeOutcome, ChallengeResolution,
    ChallengeState, FraudResolution, MemberKind, Proof, ProofAuditEntry, ProofId, ProofKind,
    ProofStatus, RebalanceRecord, Rollup, RollupId, RollupState, SubjectId, Transfer, TransferId,
    TransferKind,
};
pub use error::{RollupError, RollupResult};
pub use ports::{MockProofVerifier, MockVerdict, ProofVerifier, RollupApi, VerifierError};
pub use service::{RollupConfig, RollupService, RollupSnapshot};
pub use store::{BatchPipeline, ChallengeProtocol, ProofLedger, RollupRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
