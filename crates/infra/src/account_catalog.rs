use std::collections::HashMap;
use std::sync::RwLock;

use bursar_core::{DomainResult, StudentId};
use bursar_ledger::{
    Account, AccountCatalog, AccountCategory, AccountScope, AccountType, CatalogError,
};

/// Standard chart of accounts for a student-residence operator.
///
/// Receivables and payables sit under summary parents so consolidated lines
/// fold their children; property accounts are company-wide and ignore
/// residence filters.
pub fn standard_chart() -> DomainResult<Vec<Account>> {
    Ok(vec![
        Account::new("1010", "Cash", AccountType::Asset)?
            .with_category(AccountCategory::CurrentAsset),
        Account::new("1020", "Bank", AccountType::Asset)?
            .with_category(AccountCategory::CurrentAsset),
        Account::new("1100", "Accounts Receivable", AccountType::Asset)?
            .with_category(AccountCategory::CurrentAsset)
            .as_summary(),
        Account::new("1110", "Rent Receivable", AccountType::Asset)?
            .with_category(AccountCategory::CurrentAsset)
            .with_parent("1100"),
        Account::new("1120", "Utilities Receivable", AccountType::Asset)?
            .with_category(AccountCategory::CurrentAsset)
            .with_parent("1100"),
        Account::new("1300", "Prepaid Expenses", AccountType::Asset)?
            .with_category(AccountCategory::CurrentAsset),
        Account::new("1500", "Property", AccountType::Asset)?
            .with_category(AccountCategory::NonCurrentAsset)
            .with_scope(AccountScope::Company),
        Account::new("1510", "Vehicles", AccountType::Asset)?
            .with_category(AccountCategory::NonCurrentAsset)
            .with_scope(AccountScope::Company),
        Account::new("2000", "Accounts Payable", AccountType::Liability)?
            .with_category(AccountCategory::CurrentLiability)
            .as_summary(),
        Account::new("2010", "Suppliers Payable", AccountType::Liability)?
            .with_category(AccountCategory::CurrentLiability)
            .with_parent("2000"),
        Account::new("2100", "Accrued Expenses", AccountType::Liability)?
            .with_category(AccountCategory::CurrentLiability),
        Account::new("2200", "Security Deposits", AccountType::Liability)?
            .with_category(AccountCategory::CurrentLiability),
        Account::new("2310", "Advance Payments", AccountType::Liability)?
            .with_category(AccountCategory::CurrentLiability)
            .as_summary(),
        Account::new("2500", "Long-Term Loan", AccountType::Liability)?
            .with_category(AccountCategory::NonCurrentLiability),
        Account::new("3000", "Owner Capital", AccountType::Equity)?
            .with_category(AccountCategory::Capital),
        Account::new("3100", "Retained Earnings", AccountType::Equity)?
            .with_category(AccountCategory::RetainedEarnings),
        Account::new("4000", "Rent Income", AccountType::Income)?
            .with_category(AccountCategory::OperatingIncome),
        Account::new("4100", "Utilities Income", AccountType::Income)?
            .with_category(AccountCategory::OperatingIncome),
        Account::new("5000", "Maintenance Expense", AccountType::Expense)?
            .with_category(AccountCategory::OperatingExpense),
        Account::new("5100", "Utilities Expense", AccountType::Expense)?
            .with_category(AccountCategory::OperatingExpense),
    ])
}

/// In-memory chart-of-accounts catalog.
///
/// Intended for tests/dev. Advance-payment accounts are provisioned lazily,
/// one per student, under the configured advance parent.
#[derive(Debug)]
pub struct InMemoryAccountCatalog {
    accounts: RwLock<HashMap<String, Account>>,
    cash_code: String,
    advance_parent_code: String,
}

impl InMemoryAccountCatalog {
    /// Empty catalog with the given well-known codes.
    pub fn new(cash_code: impl Into<String>, advance_parent_code: impl Into<String>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            cash_code: cash_code.into(),
            advance_parent_code: advance_parent_code.into(),
        }
    }

    /// Catalog seeded with [`standard_chart`].
    pub fn with_standard_chart() -> DomainResult<Self> {
        let accounts: HashMap<String, Account> = standard_chart()?
            .into_iter()
            .map(|account| (account.code.clone(), account))
            .collect();
        Ok(Self {
            accounts: RwLock::new(accounts),
            cash_code: "1010".to_string(),
            advance_parent_code: "2310".to_string(),
        })
    }

    /// Insert or replace an account.
    pub fn upsert(&self, account: Account) -> Result<(), CatalogError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| CatalogError::Backend("lock poisoned".to_string()))?;
        accounts.insert(account.code.clone(), account);
        Ok(())
    }
}

impl AccountCatalog for InMemoryAccountCatalog {
    fn get(&self, code: &str) -> Result<Option<Account>, CatalogError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| CatalogError::Backend("lock poisoned".to_string()))?;
        Ok(accounts.get(code).cloned())
    }

    fn all(&self) -> Result<Vec<Account>, CatalogError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| CatalogError::Backend("lock poisoned".to_string()))?;
        let mut all: Vec<Account> = accounts.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(all)
    }

    fn cash_account(&self) -> Result<Account, CatalogError> {
        self.get(&self.cash_code)?
            .ok_or_else(|| CatalogError::AccountNotFound(self.cash_code.clone()))
    }

    fn advance_payment_account(&self, student: StudentId) -> Result<Account, CatalogError> {
        let code = format!("{}-{}", self.advance_parent_code, student);

        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| CatalogError::Backend("lock poisoned".to_string()))?;
        if let Some(existing) = accounts.get(&code) {
            return Ok(existing.clone());
        }

        let account = Account::new(
            code.clone(),
            format!("Advance Payments - {student}"),
            AccountType::Liability,
        )
        .map_err(|e| CatalogError::Backend(e.to_string()))?
        .with_category(AccountCategory::CurrentLiability)
        .with_parent(self.advance_parent_code.clone());

        accounts.insert(code, account.clone());
        Ok(account)
    }
}
