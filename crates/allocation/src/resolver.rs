use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use bursar_core::{EntryId, Period, ResidenceId, StudentId};
use bursar_ledger::{
    AccountType, EntryFilter, EntrySource, EntryStatus, JournalEntry, JournalStore, LedgerWarning,
    LineItem, StoreError,
};

/// One accrual's unpaid obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutstandingObligation {
    pub student: StudentId,
    pub period: Period,
    pub accrual_entry: EntryId,
    pub accrual_date: NaiveDate,
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub residence: Option<ResidenceId>,
    /// Amount the accrual originally established.
    pub owed: i64,
    /// Amount settled against it so far.
    pub settled: i64,
    /// `owed - settled`, clamped at zero.
    pub outstanding: i64,
}

/// Outcome of a receivable resolution: obligations oldest first, plus any
/// anomalies found along the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedReceivables {
    pub student: StudentId,
    pub obligations: Vec<OutstandingObligation>,
    pub warnings: Vec<LedgerWarning>,
}

impl ResolvedReceivables {
    pub fn total_outstanding(&self) -> i128 {
        self.obligations
            .iter()
            .map(|o| i128::from(o.outstanding))
            .sum()
    }

    pub fn open_obligations(&self) -> impl Iterator<Item = &OutstandingObligation> + '_ {
        self.obligations.iter().filter(|o| o.outstanding > 0)
    }

    pub fn oldest_open(&self) -> Option<&OutstandingObligation> {
        self.open_obligations().next()
    }
}

/// Derives per-period outstanding receivables for one student from the
/// journal.
///
/// Accrual entries establish the amount owed. Posted payment entries reduce
/// whichever obligation they are tagged against, regardless of their own
/// posting date. Deposits and voided entries never participate.
#[derive(Clone)]
pub struct ReceivableResolver {
    store: Arc<dyn JournalStore>,
}

impl ReceivableResolver {
    pub fn new(store: Arc<dyn JournalStore>) -> Self {
        Self { store }
    }

    /// Outstanding obligations for `student`, oldest accrual first.
    pub fn outstanding_balances(
        &self,
        student: StudentId,
    ) -> Result<ResolvedReceivables, StoreError> {
        let filter = EntryFilter {
            status: Some(EntryStatus::Posted),
            student: Some(student),
            ..Default::default()
        };
        // `query` returns (date, id) order, so obligations come out oldest
        // first.
        let entries = self.store.query(&filter)?;

        let mut warnings = Vec::new();
        let mut obligations = Vec::new();

        for entry in &entries {
            if entry.source() != EntrySource::Accrual {
                continue;
            }
            let Some(line) = receivable_line(entry) else {
                continue;
            };
            let period = entry
                .period_tag()
                .unwrap_or_else(|| Period::from_date(entry.date()));
            obligations.push(OutstandingObligation {
                student,
                period,
                accrual_entry: entry.id_typed(),
                accrual_date: entry.date(),
                account_code: line.account_code.clone(),
                account_name: line.account_name.clone(),
                account_type: line.account_type,
                residence: entry.residence(),
                owed: line.debit,
                settled: 0,
                outstanding: 0,
            });
        }

        for entry in &entries {
            if entry.source() != EntrySource::Payment {
                continue;
            }
            apply_payment(entry, &mut obligations, &mut warnings);
        }

        for obligation in &mut obligations {
            if obligation.settled > obligation.owed {
                warnings.push(LedgerWarning::NegativeOutstanding {
                    student,
                    period: obligation.period,
                    owed: obligation.owed,
                    settled: obligation.settled,
                });
                obligation.outstanding = 0;
            } else {
                obligation.outstanding = obligation.owed - obligation.settled;
            }
        }

        debug!(
            %student,
            obligations = obligations.len(),
            warnings = warnings.len(),
            "resolved outstanding receivables"
        );

        Ok(ResolvedReceivables {
            student,
            obligations,
            warnings,
        })
    }
}

/// The line an accrual tracks its receivable on. Falls back to the first
/// asset debit for entries recorded without outstanding tracking.
fn receivable_line(entry: &JournalEntry) -> Option<&LineItem> {
    entry
        .lines()
        .iter()
        .find(|line| line.outstanding.is_some() && line.debit > 0)
        .or_else(|| {
            entry
                .lines()
                .iter()
                .find(|line| line.debit > 0 && line.account_type == AccountType::Asset)
        })
}

/// Applies one payment entry's receivable credits to the obligations.
///
/// Attribution order: the exact accrual named in the entry metadata, then the
/// tagged period, then the entry's own posting month (with a warning).
fn apply_payment(
    entry: &JournalEntry,
    obligations: &mut [OutstandingObligation],
    warnings: &mut Vec<LedgerWarning>,
) {
    let target = entry.accrual_ref();
    let mut untagged = false;

    for line in entry.lines() {
        if line.credit <= 0 || line.account_type != AccountType::Asset {
            continue;
        }

        if let Some(accrual) = target {
            if let Some(pos) = obligations.iter().position(|o| o.accrual_entry == accrual) {
                obligations[pos].settled += line.credit;
                continue;
            }
        }

        let period = match entry.period_tag() {
            Some(period) => period,
            None => {
                untagged = true;
                Period::from_date(entry.date())
            }
        };
        let pos = obligations
            .iter()
            .position(|o| o.period == period && o.account_code == line.account_code)
            .or_else(|| obligations.iter().position(|o| o.period == period));
        if let Some(pos) = pos {
            obligations[pos].settled += line.credit;
        }
    }

    if untagged {
        warnings.push(LedgerWarning::UntaggedSettlement {
            entry: entry.id_typed(),
        });
    }
}
