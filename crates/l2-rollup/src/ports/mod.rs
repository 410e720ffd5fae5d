//! Ports: the command surface and the verifier dependency.

pub mod inbound;
pub mod outbound;

pub use inbound::RollupApi;
pub use outbound::{MockProofVerifier, MockVerdict, ProofVerifier, VerifierError};
