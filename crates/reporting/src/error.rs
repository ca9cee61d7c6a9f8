use thiserror::Error;

use bursar_core::DomainError;
use bursar_ledger::{CatalogError, StoreError};

/// Errors surfaced by balance sheet generation.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid report year {0}: supported range is 1970..=2100")]
    InvalidYear(i32),

    #[error("aggregated amount exceeds the representable range")]
    AmountOverflow,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
