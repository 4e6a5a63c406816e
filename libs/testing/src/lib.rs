//! Test helpers shared by convoy crates.
//!
//! - [`mock`]: builders for nodes and allocations with sensible defaults
//! - [`init_tracing`]: installs a subscriber so `RUST_LOG=trace` shows
//!   classifier decisions in test output

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub mod mock;

static TRACING: Once = Once::new();

/// Install a test subscriber once per process. Filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        // another harness may already have installed one
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
