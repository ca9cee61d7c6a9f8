//! `bursar-allocation` — FIFO payment allocation against student receivables.
//!
//! The [`resolver::ReceivableResolver`] derives per-period outstanding
//! obligations from the journal, and the [`engine::AllocationEngine`] walks
//! them oldest-first to turn an incoming payment into settlement entries plus
//! an advance-payment entry for any remainder.

pub mod engine;
pub mod error;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use engine::{
    AllocationEngine, AllocationLine, AllocationLineKind, AllocationRequest, AllocationResult,
};
pub use error::AllocationError;
pub use resolver::{OutstandingObligation, ReceivableResolver, ResolvedReceivables};
