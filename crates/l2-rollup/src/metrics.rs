//! # Rollup Metrics
//!
//! Prometheus metrics for batch, proof and challenge throughput.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! l2-rollup = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `rollup_batches_created_total` - Counter of batches created
//! - `rollup_batches_finalized_total` - Counter of batches finalized
//! - `rollup_batches_rolled_back_total` - Counter of batches sent back by upheld challenges
//! - `rollup_proofs_generated_total` - Counter of proofs generated (by kind)
//! - `rollup_proofs_rejected_total` - Counter of verifier rejections (by reason)
//! - `rollup_challenges_opened_total` - Counter of challenges submitted
//! - `rollup_challenges_resolved_total` - Counter of challenges resolved (by outcome)
//!
//! A metric that fails to register stays `None` and is skipped.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total batches created
    pub static ref BATCHES_CREATED: Option<IntCounter> = register_int_counter!(
        "rollup_batches_created_total",
        "Total number of batches created"
    )
    .ok();

    /// Total batches finalized
    pub static ref BATCHES_FINALIZED: Option<IntCounter> = register_int_counter!(
        "rollup_batches_finalized_total",
        "Total number of batches finalized"
    )
    .ok();

    /// Total batches rolled back
    pub static ref BATCHES_ROLLED_BACK: Option<IntCounter> = register_int_counter!(
        "rollup_batches_rolled_back_total",
        "Total number of batches rolled back by upheld challenges"
    )
    .ok();

    /// Total proofs generated, labeled by kind
    pub static ref PROOFS_GENERATED: Option<IntCounterVec> = register_int_counter_vec!(
        "rollup_proofs_generated_total",
        "Total number of proofs generated",
        &["kind"]
    )
    .ok();

    /// Total proofs the verifier did not accept, labeled by reason
    pub static ref PROOFS_REJECTED: Option<IntCounterVec> = register_int_counter_vec!(
        "rollup_proofs_rejected_total",
        "Total number of proofs rejected during validation",
        &["reason"]
    )
    .ok();

    /// Total challenges opened
    pub static ref CHALLENGES_OPENED: Option<IntCounter> = register_int_counter!(
        "rollup_challenges_opened_total",
        "Total number of challenges submitted"
    )
    .ok();

    /// Total challenges resolved, labeled by outcome
    pub static ref CHALLENGES_RESOLVED: Option<IntCounterVec> = register_int_counter_vec!(
        "rollup_challenges_resolved_total",
        "Total number of challenges resolved",
        &["outcome"]
    )
    .ok();
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a batch created
#[cfg(feature = "metrics")]
pub fn record_batch_created() {
    if let Some(counter) = BATCHES_CREATED.as_ref() {
        counter.inc();
    }
}

/// Record a batch finalized
#[cfg(feature = "metrics")]
pub fn record_batch_finalized() {
    if let Some(counter) = BATCHES_FINALIZED.as_ref() {
        counter.inc();
    }
}

/// Record a batch rolled back
#[cfg(feature = "metrics")]
pub fn record_batch_rolled_back() {
    if let Some(counter) = BATCHES_ROLLED_BACK.as_ref() {
        counter.inc();
    }
}

/// Record a proof generated
#[cfg(feature = "metrics")]
pub fn record_proof_generated(kind: &str) {
    if let Some(counter) = PROOFS_GENERATED.as_ref() {
        counter.with_label_values(&[kind]).inc();
    }
}

/// Record a proof rejected during validation
#[cfg(feature = "metrics")]
pub fn record_proof_rejected(reason: &str) {
    if let Some(counter) = PROOFS_REJECTED.as_ref() {
        counter.with_label_values(&[reason]).inc();
    }
}

/// Record a challenge opened
#[cfg(feature = "metrics")]
pub fn record_challenge_opened() {
    if let Some(counter) = CHALLENGES_OPENED.as_ref() {
        counter.inc();
    }
}

/// Record a challenge resolved
#[cfg(feature = "metrics")]
pub fn record_challenge_resolved(outcome: &str) {
    if let Some(counter) = CHALLENGES_RESOLVED.as_ref() {
        counter.with_label_values(&[outcome]).inc();
    }
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_batch_created() {}

#[cfg(not(feature = "metrics"))]
pub fn record_batch_finalized() {}

#[cfg(not(feature = "metrics"))]
pub fn record_batch_rolled_back() {}

#[cfg(not(feature = "metrics"))]
pub fn record_proof_generated(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_proof_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_challenge_opened() {}

#[cfg(not(feature = "metrics"))]
pub fn record_challenge_resolved(_outcome: &str) {}
