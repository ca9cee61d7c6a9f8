//! Shared fixtures for aggregation tests.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;

use bursar_core::{EntryId, ResidenceId, StudentId};
use bursar_ledger::{
    Account, AccountCatalog, AccountCategory, AccountScope, AccountType, AccrualAdjustment,
    AllocationAudit, CatalogError, EntryFilter, EntrySource, JournalEntry, JournalStore, LineItem,
    StoreError,
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
}

impl JournalStore for FakeJournal {
    fn insert(&self, entry: JournalEntry) -> Result<(), StoreError> {
        self.entries.write().unwrap().push(entry);
        Ok(())
    }

    fn get(&self, id: EntryId) -> Result<Option<JournalEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .unwrap()
            .iter()
            .find(|e| e.id_typed() == id)
            .cloned())
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
        _settlement: JournalEntry,
        _adjustment: AccrualAdjustment,
    ) -> Result<AllocationAudit, StoreError> {
        Err(StoreError::Backend(
            "settlements not supported by this fixture".to_string(),
        ))
    }
}

pub(crate) struct FakeCatalog {
    accounts: HashMap<String, Account>,
}

impl FakeCatalog {
    pub(crate) fn with(accounts: Vec<Account>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|account| (account.code.clone(), account))
                .collect(),
        }
    }
}

impl AccountCatalog for FakeCatalog {
    fn get(&self, code: &str) -> Result<Option<Account>, CatalogError> {
        Ok(self.accounts.get(code).cloned())
    }

    fn all(&self) -> Result<Vec<Account>, CatalogError> {
        let mut all: Vec<Account> = self.accounts.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(all)
    }

    fn cash_account(&self) -> Result<Account, CatalogError> {
        self.get("1010")?
            .ok_or_else(|| CatalogError::AccountNotFound("1010".to_string()))
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

/// Chart used across aggregation tests: receivable children under a summary
/// parent, two company-scope accounts, stored equity accounts, and one
/// income/expense pair.
pub(crate) fn chart() -> Vec<Account> {
    vec![
        Account::new("1010", "Cash", AccountType::Asset)
            .unwrap()
            .with_category(AccountCategory::CurrentAsset),
        Account::new("1100", "Accounts Receivable", AccountType::Asset)
            .unwrap()
            .with_category(AccountCategory::CurrentAsset)
            .as_summary(),
        Account::new("1110", "Rent Receivable", AccountType::Asset)
            .unwrap()
            .with_category(AccountCategory::CurrentAsset)
            .with_parent("1100"),
        Account::new("1120", "Utilities Receivable", AccountType::Asset)
            .unwrap()
            .with_category(AccountCategory::CurrentAsset)
            .with_parent("1100"),
        Account::new("1500", "Property", AccountType::Asset)
            .unwrap()
            .with_category(AccountCategory::NonCurrentAsset)
            .with_scope(AccountScope::Company),
        Account::new("2100", "Accrued Expenses", AccountType::Liability)
            .unwrap()
            .with_category(AccountCategory::CurrentLiability),
        Account::new("2500", "Long-Term Loan", AccountType::Liability)
            .unwrap()
            .with_category(AccountCategory::NonCurrentLiability)
            .with_scope(AccountScope::Company),
        Account::new("3000", "Owner Capital", AccountType::Equity)
            .unwrap()
            .with_category(AccountCategory::Capital),
        Account::new("3100", "Retained Earnings", AccountType::Equity)
            .unwrap()
            .with_category(AccountCategory::RetainedEarnings),
        Account::new("4000", "Rent Income", AccountType::Income)
            .unwrap()
            .with_category(AccountCategory::OperatingIncome),
        Account::new("5000", "Maintenance Expense", AccountType::Expense)
            .unwrap()
            .with_category(AccountCategory::OperatingExpense),
    ]
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub(crate) fn posted(on: NaiveDate, lines: Vec<LineItem>) -> JournalEntry {
    posted_in(on, None, lines)
}

pub(crate) fn posted_in(
    on: NaiveDate,
    residence: Option<ResidenceId>,
    lines: Vec<LineItem>,
) -> JournalEntry {
    JournalEntry::new(
        EntryId::new(),
        on,
        EntrySource::Manual,
        "Journal entry",
        residence,
        lines,
    )
    .unwrap()
}
