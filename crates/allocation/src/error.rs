use thiserror::Error;

use bursar_core::{DomainError, EntryId, StudentId};
use bursar_ledger::{CatalogError, StoreError};

/// Errors surfaced by payment allocation.
///
/// Validation failures (`InvalidAmount`, `UnknownStudent`,
/// `NoOutstandingBalance`) are reported before any ledger write.
/// `CommitFailed` means the atomic settlement commit was rolled back; the
/// ledger is unchanged and the caller may retry.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("payment amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("unknown student: {0}")]
    UnknownStudent(StudentId),

    #[error("student {0} has no outstanding balance")]
    NoOutstandingBalance(StudentId),

    #[error(
        "allocation of {requested} exceeds outstanding {outstanding} on accrual entry {entry}"
    )]
    OverAllocation {
        entry: EntryId,
        outstanding: i64,
        requested: i64,
    },

    #[error("allocation commit failed: {0}")]
    CommitFailed(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("allocation backend error: {0}")]
    Backend(String),
}

impl AllocationError {
    /// Whether the caller may safely retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CommitFailed(_))
    }
}
