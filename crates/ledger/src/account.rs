use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bursar_core::{DomainError, DomainResult};

/// High-level account type (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    /// Whether balances on this type grow on the debit side.
    pub fn is_debit_normal(self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }

    /// Signed balance from accumulated debit/credit totals.
    ///
    /// Asset/Expense balances are debit minus credit; Liability/Equity/Income
    /// balances are credit minus debit.
    pub fn balance(self, debit: i128, credit: i128) -> i128 {
        if self.is_debit_normal() {
            debit - credit
        } else {
            credit - debit
        }
    }
}

/// Explicit balance-sheet placement, set at catalog-provisioning time.
///
/// Accounts without a category fall back to code ranges and name keywords
/// during classification, and the fallback is flagged on the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    CurrentAsset,
    NonCurrentAsset,
    CurrentLiability,
    NonCurrentLiability,
    Capital,
    RetainedEarnings,
    OtherEquity,
    OperatingIncome,
    OperatingExpense,
}

/// Reporting scope of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountScope {
    /// Activity attributable to a single residence unit.
    Unit,
    /// Company-wide account (property, vehicles). Included in full on every
    /// balance sheet, residence filter or not.
    Company,
}

/// Catalog account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub code: String, // e.g. "1110"
    pub name: String, // e.g. "Rent Receivable"
    pub account_type: AccountType,
    pub category: Option<AccountCategory>,
    /// Aggregation parent, referenced by code. Parent/child relationships are
    /// explicit; nothing is ever inferred from code prefixes.
    pub parent_code: Option<String>,
    /// Consolidation parent (e.g. consolidated AR). Its reported balance
    /// folds in the accounts whose `parent_code` names it.
    pub summary: bool,
    pub scope: AccountScope,
    /// Carried-forward balance in minor units, signed per the account type.
    pub opening_balance: i64,
    pub opening_balance_date: Option<NaiveDate>,
    pub active: bool,
}

impl Account {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> DomainResult<Self> {
        let code = code.into();
        let name = name.into();
        if code.trim().is_empty() {
            return Err(DomainError::validation("account code cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("account name cannot be empty"));
        }
        Ok(Self {
            code,
            name,
            account_type,
            category: None,
            parent_code: None,
            summary: false,
            scope: AccountScope::Unit,
            opening_balance: 0,
            opening_balance_date: None,
            active: true,
        })
    }

    pub fn with_category(mut self, category: AccountCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }

    pub fn as_summary(mut self) -> Self {
        self.summary = true;
        self
    }

    pub fn with_scope(mut self, scope: AccountScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_opening_balance(mut self, amount: i64, date: NaiveDate) -> Self {
        self.opening_balance = amount;
        self.opening_balance_date = Some(date);
        self
    }
}
