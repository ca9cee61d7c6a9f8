//! Process-wide tracing setup shared by binaries and integration tests.

/// Initialize structured logging for the process.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, output format).
pub mod tracing;
