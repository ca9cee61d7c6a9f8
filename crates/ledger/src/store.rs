use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use bursar_core::{EntryId, Period, StudentId};

use crate::account::Account;
use crate::entry::{AllocationAudit, JournalEntry};
use crate::query::EntryFilter;

/// Journal store operation error.
///
/// These are **infrastructure errors** (storage, locking, atomicity) as
/// opposed to domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("duplicate entry id: {0}")]
    DuplicateEntry(EntryId),

    /// Write-time outstanding re-check failed: the obligation shrank between
    /// the read that planned an allocation and the write applying it.
    #[error("stale allocation on entry {entry}: outstanding {outstanding}, requested {requested}")]
    StaleAllocation {
        entry: EntryId,
        outstanding: i64,
        requested: i64,
    },

    #[error("invalid write: {0}")]
    InvalidWrite(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Account catalog operation error.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("catalog backend failure: {0}")]
    Backend(String),
}

/// Instruction to reduce an accrual's receivable outstanding figure,
/// applied atomically with its paired settlement entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualAdjustment {
    /// The accrual entry whose receivable is being paid down.
    pub accrual_entry: EntryId,
    /// Receivable account the accrual posted to.
    pub account_code: String,
    /// Amount applied, in minor units.
    pub amount: i64,
    /// Allocation this adjustment belongs to (audit key).
    pub allocation_id: Uuid,
    pub payment_date: NaiveDate,
    /// Obligation period being settled.
    pub period: Period,
}

/// Append-oriented journal entry store.
///
/// ## Design Principles
///
/// - **No storage assumptions**: works with the in-memory implementation
///   (tests/dev) and database-backed implementations (production).
/// - **Append-only**: posted entries are never replaced. The single sanctioned
///   mutation is `apply_settlement`, which reduces an accrual's receivable
///   outstanding figure in the same unit that inserts the settlement.
/// - **Deterministic reads**: `query` returns entries ordered by
///   `(date, entry id)` so repeated scans over an unchanged journal produce
///   identical output.
///
/// ## Atomicity
///
/// `apply_settlement` is the one multi-write operation. Implementations must
/// commit the settlement insert and the accrual adjustment together or not at
/// all; a settlement without its adjustment (or the reverse) corrupts the
/// double-entry guarantee and must be structurally impossible.
pub trait JournalStore: Send + Sync {
    /// Insert a posted entry. Entry ids are unique.
    fn insert(&self, entry: JournalEntry) -> Result<(), StoreError>;

    /// Fetch one entry by id.
    fn get(&self, id: EntryId) -> Result<Option<JournalEntry>, StoreError>;

    /// All entries matching the filter, ordered by `(date, entry id)`.
    fn query(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>, StoreError>;

    /// Atomically insert `settlement` and apply `adjustment` to its accrual.
    ///
    /// Implementations must re-check the accrual's outstanding figure inside
    /// the same critical section / transaction and fail with
    /// [`StoreError::StaleAllocation`] rather than write a negative balance.
    /// Returns the audit record as written to the accrual's metadata.
    fn apply_settlement(
        &self,
        settlement: JournalEntry,
        adjustment: AccrualAdjustment,
    ) -> Result<AllocationAudit, StoreError>;
}

impl<S> JournalStore for Arc<S>
where
    S: JournalStore + ?Sized,
{
    fn insert(&self, entry: JournalEntry) -> Result<(), StoreError> {
        (**self).insert(entry)
    }

    fn get(&self, id: EntryId) -> Result<Option<JournalEntry>, StoreError> {
        (**self).get(id)
    }

    fn query(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>, StoreError> {
        (**self).query(filter)
    }

    fn apply_settlement(
        &self,
        settlement: JournalEntry,
        adjustment: AccrualAdjustment,
    ) -> Result<AllocationAudit, StoreError> {
        (**self).apply_settlement(settlement, adjustment)
    }
}

/// Chart-of-accounts lookup.
pub trait AccountCatalog: Send + Sync {
    /// Fetch one account by code.
    fn get(&self, code: &str) -> Result<Option<Account>, CatalogError>;

    /// Every account in the catalog, active or not.
    fn all(&self) -> Result<Vec<Account>, CatalogError>;

    /// The cash/bank account settlements debit.
    fn cash_account(&self) -> Result<Account, CatalogError>;

    /// Per-student advance-payment liability account, provisioned on demand.
    fn advance_payment_account(&self, student: StudentId) -> Result<Account, CatalogError>;
}

impl<C> AccountCatalog for Arc<C>
where
    C: AccountCatalog + ?Sized,
{
    fn get(&self, code: &str) -> Result<Option<Account>, CatalogError> {
        (**self).get(code)
    }

    fn all(&self) -> Result<Vec<Account>, CatalogError> {
        (**self).all()
    }

    fn cash_account(&self) -> Result<Account, CatalogError> {
        (**self).cash_account()
    }

    fn advance_payment_account(&self, student: StudentId) -> Result<Account, CatalogError> {
        (**self).advance_payment_account(student)
    }
}

/// Debtor identity boundary.
///
/// Allocation fails fast on unknown students before any ledger read.
pub trait StudentDirectory: Send + Sync {
    fn is_known(&self, student: StudentId) -> Result<bool, CatalogError>;
}

impl<D> StudentDirectory for Arc<D>
where
    D: StudentDirectory + ?Sized,
{
    fn is_known(&self, student: StudentId) -> Result<bool, CatalogError> {
        (**self).is_known(student)
    }
}
