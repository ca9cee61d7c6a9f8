//! `bursar-reporting` — balance sheet aggregation and annual rollups.
//!
//! The [`aggregator::BalanceSheetAggregator`] folds posted journal entries
//! into a classified balance sheet at a point in time; the
//! [`monthly::MonthlyBalanceSheetBuilder`] runs twelve of those in parallel
//! and averages them into an annual summary. Both re-derive everything from
//! the ledger on every call.

pub mod aggregator;
pub mod classification;
pub mod error;
pub mod monthly;
pub mod options;
pub mod sheet;

#[cfg(test)]
mod testing;

pub use aggregator::BalanceSheetAggregator;
pub use classification::{classify, ClassificationBasis, Classified};
pub use error::ReportError;
pub use monthly::{
    AnnualBalanceReport, AnnualSummary, MonthlyBalanceSheet, MonthlyBalanceSheetBuilder,
};
pub use options::ReportOptions;
pub use sheet::{
    AccountBalance, BalanceSheet, EquationReport, EquitySection, Ratios, SectionGroup, SectionLine,
};
