use core::fmt;

use serde::{Deserialize, Serialize};

use bursar_core::{EntryId, Period, StudentId};

/// Structured ledger anomaly, attached to a computation's result.
///
/// Warnings never abort a computation: a reporting caller still gets a
/// best-effort result with the issues flagged alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerWarning {
    /// An internally unbalanced entry was folded during a scan.
    UnbalancedEntry {
        entry: EntryId,
        debit_total: i64,
        credit_total: i64,
    },

    /// Settlements tagged to a period exceed what was owed; outstanding was
    /// clamped at zero.
    NegativeOutstanding {
        student: StudentId,
        period: Period,
        owed: i64,
        settled: i64,
    },

    /// Account classified by name keywords because it carries no category.
    HeuristicClassification {
        account_code: String,
        account_name: String,
    },

    /// Non-zero opening balance without an opening date; excluded from
    /// aggregation.
    UndatedOpeningBalance { account_code: String },

    /// Settlement without a period tag or accrual reference; attributed to
    /// its posting-date period.
    UntaggedSettlement { entry: EntryId },
}

impl fmt::Display for LedgerWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerWarning::UnbalancedEntry {
                entry,
                debit_total,
                credit_total,
            } => write!(
                f,
                "entry {entry} is unbalanced (debits {debit_total}, credits {credit_total})"
            ),
            LedgerWarning::NegativeOutstanding {
                student,
                period,
                owed,
                settled,
            } => write!(
                f,
                "student {student} period {period}: settled {settled} exceeds owed {owed}"
            ),
            LedgerWarning::HeuristicClassification {
                account_code,
                account_name,
            } => write!(
                f,
                "account {account_code} '{account_name}' classified by name keywords"
            ),
            LedgerWarning::UndatedOpeningBalance { account_code } => write!(
                f,
                "account {account_code} has an opening balance without an opening date"
            ),
            LedgerWarning::UntaggedSettlement { entry } => write!(
                f,
                "settlement {entry} carries no period tag; attributed to its posting date"
            ),
        }
    }
}
