//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::ProofKind;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Why a verifier could not give a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifierError {
    /// The verifier did not answer in time.
    #[error("verifier timed out")]
    Timeout,

    /// The payload could not be interpreted for this proof kind.
    #[error("malformed proof payload: {0}")]
    Malformed(String),

    /// Backend unavailable.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// Proof verification capability.
///
/// Called with no ledger lock held. A remote-backed implementation is
/// responsible for its own deadline and must report expiry as
/// [`VerifierError::Timeout`].
pub trait ProofVerifier: Send + Sync {
    /// `Ok(true)` if the payload is a valid proof of `kind`.
    fn verify(&self, kind: ProofKind, payload: &[u8]) -> Result<bool, VerifierError>;
}

/// Canned verdict for [`MockProofVerifier`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockVerdict {
    Accept,
    Reject,
    Fail(VerifierError),
}

/// In-memory verifier for testing.
pub struct MockProofVerifier {
    verdict: RwLock<MockVerdict>,
    calls: AtomicUsize,
}

impl MockProofVerifier {
    /// Verifier that accepts everything.
    pub fn accepting() -> Self {
        Self::with_verdict(MockVerdict::Accept)
    }

    /// Verifier that rejects everything.
    pub fn rejecting() -> Self {
        Self::with_verdict(MockVerdict::Reject)
    }

    /// Verifier that always times out.
    pub fn timing_out() -> Self {
        Self::with_verdict(MockVerdict::Fail(VerifierError::Timeout))
    }

    pub fn with_verdict(verdict: MockVerdict) -> Self {
        Self {
            verdict: RwLock::new(verdict),
            calls: AtomicUsize::new(0),
        }
    }

    /// Change the verdict for subsequent calls.
    pub fn set_verdict(&self, verdict: MockVerdict) {
        *self.verdict.write() = verdict;
    }

    /// Number of `verify` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Default for MockProofVerifier {
    fn default() -> Self {
        Self::accepting()
    }
}

impl ProofVerifier for MockProofVerifier {
    fn verify(&self, _kind: ProofKind, _payload: &[u8]) -> Result<bool, VerifierError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &*self.verdict.read() {
            MockVerdict::Accept => Ok(true),
            MockVerdict::Reject => Ok(false),
            MockVerdict::Fail(e) => Err(e.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_verdicts() {
        assert_eq!(
            MockProofVerifier::accepting().verify(ProofKind::ZkProof, b"p"),
            Ok(true)
        );
        assert_eq!(
            MockProofVerifier::rejecting().verify(ProofKind::ZkProof, b"p"),
            Ok(false)
        );
        assert_eq!(
            MockProofVerifier::timing_out().verify(ProofKind::FraudProof, b"p"),
            Err(VerifierError::Timeout)
        );
    }

    #[test]
    fn test_mock_counts_calls_and_switches() {
        let verifier = MockProofVerifier::default();
        verifier.verify(ProofKind::SpaceTimeProof, b"x").unwrap();
        verifier.set_verdict(MockVerdict::Reject);
        assert_eq!(verifier.verify(ProofKind::SpaceTimeProof, b"x"), Ok(false));
        assert_eq!(verifier.calls(), 2);
    }
}
