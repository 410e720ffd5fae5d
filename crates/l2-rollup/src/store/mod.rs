//! Rollup-side tables.
//!
//! Each table is plain data plus its transition rules; `RollupService` owns
//! one lock per table and decides the acquisition order.

pub mod batches;
pub mod challenges;
pub mod proofs;
pub mod registry;

pub use batches::BatchPipeline;
pub use challenges::ChallengeProtocol;
pub use proofs::ProofLedger;
pub use registry::RollupRegistry;
