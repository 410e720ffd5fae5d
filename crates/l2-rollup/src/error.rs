//! Error types for the rollup subsystem

use thiserror::Error;

/// Rollup subsystem errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollupError {
    /// Referenced entity is absent
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Identity already in use on create
    #[error("Duplicate {entity} id: {id}")]
    DuplicateId { entity: &'static str, id: String },

    /// State machine violation
    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Finalization blocked by an open challenge
    #[error("Batch {0} has an open challenge")]
    ChallengePending(String),

    /// Rollup removal blocked by non-terminal batches
    #[error("Rollup {rollup} has {pending} pending batches")]
    BatchesPending { rollup: String, pending: usize },

    /// Validation gate unmet: no validated proof for the batch
    #[error("Batch {0} has no validated proof")]
    ProofRequired(String),

    /// The verifier judged the proof invalid
    #[error("Proof {0} rejected by verifier")]
    ProofRejected(String),

    /// The verifier did not respond in time
    #[error("Verification of proof {0} timed out")]
    VerificationTimeout(String),

    /// Empty, negative or malformed argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every generated identity collided.
    ///
    /// Creates take no caller-supplied id, so a collision on a generated id
    /// is retried and only this variant reaches the caller. `DuplicateId`
    /// stays reserved for ids the caller names, such as challenge ids.
    #[error("Could not allocate a {entity} id after {attempts} attempts")]
    IdExhausted { entity: &'static str, attempts: u32 },
}

impl RollupError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn transition(
        entity: &'static str,
        from: impl std::fmt::Debug,
        to: impl std::fmt::Debug,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: format!("{:?}", from),
            to: format!("{:?}", to),
        }
    }
}

/// Result type for rollup operations
pub type RollupResult<T> = Result<T, RollupError>;
