//! Ledger domain: accounts, journal entries, and the storage boundary.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! aggregation and allocation engines consume the traits defined here;
//! `bursar-infra` provides in-memory implementations for tests and dev.

pub mod account;
pub mod entry;
pub mod query;
pub mod store;
pub mod warning;

pub use account::{Account, AccountCategory, AccountScope, AccountType};
pub use entry::{AllocationAudit, EntrySource, EntryStatus, JournalEntry, LineItem, meta};
pub use query::EntryFilter;
pub use store::{
    AccountCatalog, AccrualAdjustment, CatalogError, JournalStore, StoreError, StudentDirectory,
};
pub use warning::LedgerWarning;
