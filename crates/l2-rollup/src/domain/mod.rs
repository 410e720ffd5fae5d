//! Core domain types for the rollup subsystem.

pub mod batch;
pub mod challenge;
pub mod ids;
pub mod proof;
pub mod rollup;

pub use batch::{Batch, BatchState};
pub use challenge::{Challenge, ChallengeOutcome, ChallengeResolution, ChallengeState};
pub use ids::{BatchId, ChallengeId, ProofId, RollupId, SubjectId, TransferId};
pub use proof::{FraudResolution, Proof, ProofAuditEntry, ProofKind, ProofStatus};
pub use rollup::{MemberKind, RebalanceRecord, Rollup, RollupState, Transfer, TransferKind};
