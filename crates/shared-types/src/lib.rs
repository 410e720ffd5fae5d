//! # Shared Types Crate
//!
//! Types shared by the rollup and sharding subsystems.
//!
//! ## Design Principles
//!
//! - **Weak references only**: Entities in different stores refer to each
//!   other by identifier, never by shared ownership.
//! - **Append-only history**: The transaction-history collaborator accepts
//!   records and is never read back by the core.

pub mod entities;
pub mod history;
pub mod ids;

pub use entities::*;
pub use history::{HistorySink, InMemoryHistorySink, NullHistorySink};
pub use ids::{generate_unique_id, DEFAULT_ID_ATTEMPTS};
