use std::ops::RangeInclusive;
use std::thread;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use bursar_core::{Period, ResidenceId};

use crate::aggregator::BalanceSheetAggregator;
use crate::error::ReportError;
use crate::sheet::BalanceSheet;

const SUPPORTED_YEARS: RangeInclusive<i32> = 1970..=2100;

/// One month-end balance sheet, or a zeroed placeholder when that month
/// failed to compute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBalanceSheet {
    pub period: Period,
    pub sheet: BalanceSheet,
    pub error: Option<String>,
}

/// Arithmetic mean of the twelve monthly totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnualSummary {
    pub year: i32,
    pub average_assets: i64,
    pub average_liabilities: i64,
    pub average_equity: i64,
    pub average_working_capital: i64,
}

/// Twelve monthly sheets plus their annual summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualBalanceReport {
    pub year: i32,
    pub monthly: Vec<MonthlyBalanceSheet>,
    pub summary: AnnualSummary,
}

/// Generates a year of month-end balance sheets.
pub struct MonthlyBalanceSheetBuilder {
    aggregator: BalanceSheetAggregator,
}

impl MonthlyBalanceSheetBuilder {
    pub fn new(aggregator: BalanceSheetAggregator) -> Self {
        Self { aggregator }
    }

    /// Twelve independent month-end sheets, computed in parallel, plus the
    /// annual mean of their totals.
    ///
    /// One month failing never aborts the others: the failed month comes
    /// back zeroed with its error attached.
    pub fn generate_year(
        &self,
        year: i32,
        residence: Option<ResidenceId>,
    ) -> Result<AnnualBalanceReport, ReportError> {
        if !SUPPORTED_YEARS.contains(&year) {
            return Err(ReportError::InvalidYear(year));
        }
        let periods: Vec<Period> = (1..=12)
            .map(|month| Period::new(year, month))
            .collect::<Result<_, _>>()?;

        let mut monthly = Vec::with_capacity(12);
        thread::scope(|scope| {
            let handles: Vec<_> = periods
                .into_iter()
                .map(|period| {
                    let handle = scope.spawn(move || self.compute_month(period, residence));
                    (period, handle)
                })
                .collect();
            for (period, handle) in handles {
                let result = handle.join().unwrap_or_else(|_| {
                    warn!(%period, "month computation panicked");
                    failed_month(period, "month computation panicked")
                });
                monthly.push(result);
            }
        });

        let summary = AnnualSummary {
            year,
            average_assets: mean_of(&monthly, |m| m.sheet.assets.total),
            average_liabilities: mean_of(&monthly, |m| m.sheet.liabilities.total),
            average_equity: mean_of(&monthly, |m| m.sheet.equity.total),
            average_working_capital: mean_of(&monthly, |m| m.sheet.ratios.working_capital),
        };

        info!(
            year,
            residence = ?residence,
            failed = monthly.iter().filter(|m| m.error.is_some()).count(),
            "annual balance report generated"
        );

        Ok(AnnualBalanceReport {
            year,
            monthly,
            summary,
        })
    }

    fn compute_month(&self, period: Period, residence: Option<ResidenceId>) -> MonthlyBalanceSheet {
        let as_of = match period.end_of_month() {
            Ok(as_of) => as_of,
            Err(e) => return failed_month(period, e.to_string()),
        };
        match self.aggregator.balance_sheet(as_of, residence) {
            Ok(sheet) => MonthlyBalanceSheet {
                period,
                sheet,
                error: None,
            },
            Err(e) => {
                warn!(%period, error = %e, "month computation failed");
                MonthlyBalanceSheet {
                    period,
                    sheet: BalanceSheet::zeroed(as_of),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn failed_month(period: Period, message: impl Into<String>) -> MonthlyBalanceSheet {
    let as_of =
        NaiveDate::from_ymd_opt(period.year(), period.month(), 1).unwrap_or(NaiveDate::MIN);
    MonthlyBalanceSheet {
        period,
        sheet: BalanceSheet::zeroed(as_of),
        error: Some(message.into()),
    }
}

/// Mean of the twelve monthly figures, truncated toward zero.
fn mean_of(monthly: &[MonthlyBalanceSheet], figure: fn(&MonthlyBalanceSheet) -> i64) -> i64 {
    let sum: i128 = monthly.iter().map(|m| i128::from(figure(m))).sum();
    // A mean of twelve i64 values always fits back into i64.
    (sum / 12) as i64
}
