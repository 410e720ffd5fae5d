//! # L2 Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Install the tracing subscriber (`RUST_LOG`, default `info`)
//! 2. Load configuration from `L2_*` environment variables
//! 3. Validate limits
//! 4. Build the node and start the event log task
//! 5. Wait for Ctrl+C, then log the size of a final snapshot

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use l2_node::{CommitmentVerifier, Node, NodeConfig};
use shared_bus::{EventFilter, EventSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let config = NodeConfig::from_env();
    config.validate().context("invalid node configuration")?;

    let node = Node::new(config, Arc::new(CommitmentVerifier));

    let mut events = node.bus().subscribe(EventFilter::all());
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(topic = ?event.topic(), ?event, "[l2-node] event");
        }
        debug!(missed = events.missed(), "[l2-node] event log stopped");
    });

    info!("===========================================");
    info!("  L2 Node v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "  Max batch transactions: {}",
        node.config().rollup.max_batch_transactions
    );
    info!("  Placement replicas: {}", node.config().placement_replicas);
    info!("  Event subscribers: {}", node.bus().subscriber_count());
    info!("===========================================");
    info!("Node is running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;

    let snapshot = node.snapshot().context("failed to encode final snapshot")?;
    info!(bytes = snapshot.len(), "[l2-node] Final snapshot encoded");
    info!("Shutdown complete");
    Ok(())
}
