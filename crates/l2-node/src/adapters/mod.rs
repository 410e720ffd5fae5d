//! Adapters implementing the subsystems' outbound ports.

pub mod verifier;

pub use verifier::{CommitmentVerifier, DIGEST_LEN};
