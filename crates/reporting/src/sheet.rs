use chrono::NaiveDate;
use serde::Serialize;

use bursar_core::ResidenceId;
use bursar_ledger::{AccountType, LedgerWarning};

/// One account line in a balance sheet section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionLine {
    pub account_code: String,
    pub account_name: String,
    pub amount: i64,
    /// True when child balances were folded into this line.
    pub summary: bool,
}

/// Current / non-current split of one side of the sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionGroup {
    pub current: Vec<SectionLine>,
    pub non_current: Vec<SectionLine>,
    pub current_total: i64,
    pub non_current_total: i64,
    pub total: i64,
}

/// Equity side. Retained earnings is always derived from income and expense
/// activity, never read from a stored account balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EquitySection {
    pub capital: Vec<SectionLine>,
    pub other: Vec<SectionLine>,
    pub capital_total: i64,
    pub other_total: i64,
    pub retained_earnings: i64,
    pub income_to_date: i64,
    pub expenses_to_date: i64,
    pub total: i64,
}

/// Liquidity and leverage figures computed from the section totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ratios {
    pub working_capital: i64,
    /// `None` when current liabilities are zero.
    pub current_ratio: Option<f64>,
    /// `None` when total equity is zero.
    pub debt_to_equity: Option<f64>,
}

/// Accounting equation check. `difference` is always the raw figure; a
/// cosmetic correction never replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquationReport {
    pub balanced: bool,
    /// Assets minus liabilities-plus-equity, before any correction.
    pub difference: i64,
    /// Retained-earnings nudge applied for display, when enabled.
    pub correction: Option<i64>,
}

impl Default for EquationReport {
    fn default() -> Self {
        Self {
            balanced: true,
            difference: 0,
            correction: None,
        }
    }
}

/// Point-in-time balance sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub residence: Option<ResidenceId>,
    pub assets: SectionGroup,
    pub liabilities: SectionGroup,
    pub equity: EquitySection,
    pub ratios: Ratios,
    pub equation: EquationReport,
    pub warnings: Vec<LedgerWarning>,
}

impl BalanceSheet {
    /// All-zero placeholder, used for months that failed to compute.
    pub fn zeroed(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            residence: None,
            assets: SectionGroup::default(),
            liabilities: SectionGroup::default(),
            equity: EquitySection::default(),
            ratios: Ratios::default(),
            equation: EquationReport::default(),
            warnings: Vec::new(),
        }
    }
}

/// One line of the flat account-balance listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub amount: i64,
}
