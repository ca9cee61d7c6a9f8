//! Tracing/logging initialization.
//!
//! Allocations and reports log structured fields (student, period, totals),
//! so the subscriber emits JSON and keeps targets on for per-crate filtering.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// The filter comes from `RUST_LOG` when set, otherwise everything at `info`.
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with("info");
}

/// Initialize with an explicit fallback directive. `RUST_LOG` still wins.
pub fn init_with(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init();
}
