//! # Commitment Verifier
//!
//! `ProofVerifier` adapter for self-committing payloads:
//!
//! ```text
//! payload = keccak256(body) || body
//! ```
//!
//! The proof kind does not change the check.

use l2_rollup::{ProofKind, ProofVerifier, VerifierError};
use sha3::{Digest, Keccak256};
use tracing::trace;

/// Length of the leading digest.
pub const DIGEST_LEN: usize = 32;

/// Verifies a payload by recomputing its Keccak256 commitment.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommitmentVerifier;

impl CommitmentVerifier {
    /// Build a payload that verifies for `body`.
    pub fn commit(body: &[u8]) -> Vec<u8> {
        let mut payload = Vec::with_capacity(DIGEST_LEN + body.len());
        payload.extend_from_slice(&digest(body));
        payload.extend_from_slice(body);
        payload
    }
}

fn digest(body: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Keccak256::new();
    hasher.update(body);
    hasher.finalize().into()
}

impl ProofVerifier for CommitmentVerifier {
    fn verify(&self, kind: ProofKind, payload: &[u8]) -> Result<bool, VerifierError> {
        if payload.len() <= DIGEST_LEN {
            return Err(VerifierError::Malformed(format!(
                "{} payload of {} bytes has no body",
                kind.label(),
                payload.len()
            )));
        }
        let (claimed, body) = payload.split_at(DIGEST_LEN);
        let matches = claimed == digest(body).as_slice();
        trace!(kind = kind.label(), matches, "commitment checked");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_verifies() {
        let payload = CommitmentVerifier::commit(b"state root");
        assert_eq!(payload.len(), DIGEST_LEN + 10);
        assert_eq!(
            CommitmentVerifier.verify(ProofKind::ZkProof, &payload),
            Ok(true)
        );
    }

    #[test]
    fn test_tampered_body_rejected() {
        let mut payload = CommitmentVerifier::commit(b"state root");
        let last = payload.len() - 1;
        payload[last] ^= 0xff;
        assert_eq!(
            CommitmentVerifier.verify(ProofKind::FraudProof, &payload),
            Ok(false)
        );
    }

    #[test]
    fn test_empty_body_malformed() {
        let payload = CommitmentVerifier::commit(b"");
        assert!(matches!(
            CommitmentVerifier.verify(ProofKind::SpaceTimeProof, &payload),
            Err(VerifierError::Malformed(_))
        ));
        assert!(CommitmentVerifier.verify(ProofKind::ZkProof, &[]).is_err());
    }
}
