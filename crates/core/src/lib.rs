//! `bursar-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod period;

pub use error::{DomainError, DomainResult};
pub use id::{EntryId, ResidenceId, StudentId};
pub use period::Period;
