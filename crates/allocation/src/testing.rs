//! Shared test doubles for resolver and engine tests.

use std::sync::RwLock;

use chrono::NaiveDate;

use bursar_core::{EntryId, Period, StudentId};
use bursar_ledger::{
    Account, AccountCatalog, AccountCategory, AccountType, AccrualAdjustment, AllocationAudit,
    CatalogError, EntryFilter, EntrySource, JournalEntry, JournalStore, LineItem, StoreError,
    StudentDirectory,
};

#[derive(Debug, Default)]
pub(crate) struct FakeJournal {
    entries: RwLock<Vec<JournalEntry>>,
}

impl FakeJournal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn seed(&self, entry: JournalEntry) {
        self.entries.write().unwrap().push(entry);
    }

    pub(crate) fn entry(&self, id: EntryId) -> Option<JournalEntry> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .find(|e| e.id_typed() == id)
            .cloned()
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}

impl JournalStore for FakeJournal {
    fn insert(&self, entry: JournalEntry) -> Result<(), StoreError> {
        self.entries.write().unwrap().push(entry);
        Ok(())
    }

    fn get(&self, id: EntryId) -> Result<Option<JournalEntry>, StoreError> {
        Ok(self.entry(id))
    }

    fn query(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>, StoreError> {
        let mut matched: Vec<JournalEntry> = self
            .entries
            .read()
            .unwrap()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matched.sort_by_key(|e| (e.date(), *e.id_typed().as_uuid()));
        Ok(matched)
    }

    fn apply_settlement(
        &self,
        settlement: JournalEntry,
        adjustment: AccrualAdjustment,
    ) -> Result<AllocationAudit, StoreError> {
        let mut entries = self.entries.write().unwrap();
        let pos = entries
            .iter()
            .position(|e| e.id_typed() == adjustment.accrual_entry)
            .ok_or(StoreError::EntryNotFound(adjustment.accrual_entry))?;
        let outstanding = entries[pos]
            .outstanding_on(&adjustment.account_code)
            .ok_or_else(|| {
                StoreError::InvalidWrite("accrual has no tracked receivable line".to_string())
            })?;
        if outstanding < adjustment.amount {
            return Err(StoreError::StaleAllocation {
                entry: adjustment.accrual_entry,
                outstanding,
                requested: adjustment.amount,
            });
        }
        let (prior, new) = entries[pos]
            .reduce_outstanding(&adjustment.account_code, adjustment.amount)
            .map_err(|e| StoreError::InvalidWrite(e.to_string()))?;
        let audit = AllocationAudit {
            allocation_id: adjustment.allocation_id,
            payment_date: adjustment.payment_date,
            amount: adjustment.amount,
            period: adjustment.period,
            prior_outstanding: prior,
            new_outstanding: new,
        };
        entries[pos]
            .push_allocation_audit(&audit)
            .map_err(|e| StoreError::InvalidWrite(e.to_string()))?;
        entries.push(settlement);
        Ok(audit)
    }
}

/// Catalog with a fixed cash account and per-student advance accounts.
pub(crate) struct FakeCatalog;

impl AccountCatalog for FakeCatalog {
    fn get(&self, _code: &str) -> Result<Option<Account>, CatalogError> {
        Ok(None)
    }

    fn all(&self) -> Result<Vec<Account>, CatalogError> {
        Ok(Vec::new())
    }

    fn cash_account(&self) -> Result<Account, CatalogError> {
        let account = Account::new("1010", "Cash", AccountType::Asset)
            .map_err(|e| CatalogError::Backend(e.to_string()))?;
        Ok(account.with_category(AccountCategory::CurrentAsset))
    }

    fn advance_payment_account(&self, student: StudentId) -> Result<Account, CatalogError> {
        let account = Account::new(
            format!("2310-{student}"),
            "Advance Payments",
            AccountType::Liability,
        )
        .map_err(|e| CatalogError::Backend(e.to_string()))?;
        Ok(account.with_category(AccountCategory::CurrentLiability))
    }
}

/// Directory that knows every student.
pub(crate) struct OpenDirectory;

impl StudentDirectory for OpenDirectory {
    fn is_known(&self, _student: StudentId) -> Result<bool, CatalogError> {
        Ok(true)
    }
}

/// Directory that knows nobody.
pub(crate) struct EmptyDirectory;

impl StudentDirectory for EmptyDirectory {
    fn is_known(&self, _student: StudentId) -> Result<bool, CatalogError> {
        Ok(false)
    }
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub(crate) fn period(year: i32, month: u32) -> Period {
    Period::new(year, month).unwrap()
}

/// Rent accrual dated the first of its period, tagged with student and
/// period.
pub(crate) fn accrual(student: StudentId, period: Period, amount: i64) -> JournalEntry {
    let lines = vec![
        LineItem::receivable("1110", "Rent Receivable", amount),
        LineItem::credit("4000", "Rent Income", AccountType::Income, amount),
    ];
    JournalEntry::new(
        EntryId::new(),
        date(period.year(), period.month(), 1),
        EntrySource::Accrual,
        "Monthly rent",
        None,
        lines,
    )
    .unwrap()
    .with_student(student)
    .with_period(period)
}
