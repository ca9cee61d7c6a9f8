use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use bursar_core::{DomainError, DomainResult, EntryId, Period, ResidenceId, StudentId};

use crate::account::AccountType;

/// Metadata keys with engine-level meaning.
///
/// Entry metadata is free-form JSON; these are the keys the AR resolver and
/// the allocation engine read back.
pub mod meta {
    /// Student the entry bills or settles (UUID string).
    pub const STUDENT_ID: &str = "student_id";
    /// Billing period the entry is tagged against (`YYYY-MM`).
    pub const PERIOD: &str = "period";
    /// On settlements: the accrual entry being paid down (UUID string).
    pub const ACCRUAL_ENTRY_ID: &str = "accrual_entry_id";
    /// On accruals: append-only allocation audit trail.
    pub const ALLOCATIONS: &str = "allocations";
}

/// Posting status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Posted,
    Voided,
}

/// Workflow that produced the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// Obligation recognized before cash moves (rent/fee billing).
    Accrual,
    /// Cash realized against a prior accrual.
    Payment,
    /// Cash received beyond all known obligations, held as a liability.
    Advance,
    /// Security deposit. Never an outstanding receivable.
    Deposit,
    Manual,
}

/// One side of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    /// Amount in minor units (cents); zero when the line credits.
    pub debit: i64,
    /// Amount in minor units (cents); zero when the line debits.
    pub credit: i64,
    /// Unsettled remainder on accrual receivable lines, reduced in place by
    /// the allocation engine. `None` on every other kind of line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outstanding: Option<i64>,
}

impl LineItem {
    pub fn debit(
        account_code: impl Into<String>,
        account_name: impl Into<String>,
        account_type: AccountType,
        amount: i64,
    ) -> Self {
        Self {
            account_code: account_code.into(),
            account_name: account_name.into(),
            account_type,
            debit: amount,
            credit: 0,
            outstanding: None,
        }
    }

    pub fn credit(
        account_code: impl Into<String>,
        account_name: impl Into<String>,
        account_type: AccountType,
        amount: i64,
    ) -> Self {
        Self {
            account_code: account_code.into(),
            account_name: account_name.into(),
            account_type,
            debit: 0,
            credit: amount,
            outstanding: None,
        }
    }

    /// Receivable debit line carrying its own outstanding figure.
    pub fn receivable(
        account_code: impl Into<String>,
        account_name: impl Into<String>,
        amount: i64,
    ) -> Self {
        Self {
            account_code: account_code.into(),
            account_name: account_name.into(),
            account_type: AccountType::Asset,
            debit: amount,
            credit: 0,
            outstanding: Some(amount),
        }
    }
}

/// Append-only audit record attached to an accrual whenever a settlement
/// reduces its receivable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationAudit {
    pub allocation_id: Uuid,
    pub payment_date: NaiveDate,
    /// Amount applied, in minor units.
    pub amount: i64,
    pub period: Period,
    pub prior_outstanding: i64,
    pub new_outstanding: i64,
}

/// A double-entry journal record.
///
/// Immutable once posted, with one exception: the allocation engine reduces
/// an accrual's receivable `outstanding` figure in place, inside the same
/// atomic store operation that writes the offsetting settlement entry. The
/// posted debit/credit amounts themselves never change, so an entry stays
/// internally balanced for its whole life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    id: EntryId,
    date: NaiveDate,
    status: EntryStatus,
    source: EntrySource,
    description: String,
    residence: Option<ResidenceId>,
    lines: Vec<LineItem>,
    metadata: Map<String, Value>,
}

impl JournalEntry {
    /// Build a posted entry, enforcing the double-entry invariant.
    pub fn new(
        id: EntryId,
        date: NaiveDate,
        source: EntrySource,
        description: impl Into<String>,
        residence: Option<ResidenceId>,
        lines: Vec<LineItem>,
    ) -> DomainResult<Self> {
        Self::validate_lines(&lines)?;
        Ok(Self {
            id,
            date,
            status: EntryStatus::Posted,
            source,
            description: description.into(),
            residence,
            lines,
            metadata: Map::new(),
        })
    }

    fn validate_lines(lines: &[LineItem]) -> DomainResult<()> {
        if lines.is_empty() {
            return Err(DomainError::validation("journal entry must have lines"));
        }

        let mut debit_total: i128 = 0;
        let mut credit_total: i128 = 0;

        for line in lines {
            if line.debit < 0 || line.credit < 0 {
                return Err(DomainError::validation("amounts must not be negative"));
            }
            if line.debit > 0 && line.credit > 0 {
                return Err(DomainError::validation(
                    "a line must debit or credit, not both",
                ));
            }
            if line.debit == 0 && line.credit == 0 {
                return Err(DomainError::validation("a line must carry an amount"));
            }
            debit_total += line.debit as i128;
            credit_total += line.credit as i128;
        }

        if debit_total != credit_total {
            return Err(DomainError::invariant("debits must equal credits"));
        }

        Ok(())
    }

    pub fn id_typed(&self) -> EntryId {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn is_posted(&self) -> bool {
        self.status == EntryStatus::Posted
    }

    pub fn source(&self) -> EntrySource {
        self.source
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn residence(&self) -> Option<ResidenceId> {
        self.residence
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Mark the entry voided. Voided entries are invisible to aggregation
    /// and AR resolution.
    pub fn void(&mut self) {
        self.status = EntryStatus::Voided;
    }

    /// Whether any line posts to the given account.
    pub fn touches_account(&self, code: &str) -> bool {
        self.lines.iter().any(|l| l.account_code == code)
    }

    pub fn with_student(mut self, student: StudentId) -> Self {
        self.metadata.insert(
            meta::STUDENT_ID.to_string(),
            Value::String(student.to_string()),
        );
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.metadata
            .insert(meta::PERIOD.to_string(), Value::String(period.to_string()));
        self
    }

    pub fn with_accrual_ref(mut self, accrual: EntryId) -> Self {
        self.metadata.insert(
            meta::ACCRUAL_ENTRY_ID.to_string(),
            Value::String(accrual.to_string()),
        );
        self
    }

    pub fn student_tag(&self) -> Option<StudentId> {
        self.metadata.get(meta::STUDENT_ID)?.as_str()?.parse().ok()
    }

    pub fn period_tag(&self) -> Option<Period> {
        self.metadata.get(meta::PERIOD)?.as_str()?.parse().ok()
    }

    pub fn accrual_ref(&self) -> Option<EntryId> {
        self.metadata
            .get(meta::ACCRUAL_ENTRY_ID)?
            .as_str()?
            .parse()
            .ok()
    }

    /// Outstanding figure on the receivable line posting to `account_code`,
    /// if that line carries one.
    pub fn outstanding_on(&self, account_code: &str) -> Option<i64> {
        self.lines
            .iter()
            .find(|l| l.account_code == account_code)
            .and_then(|l| l.outstanding)
    }

    /// Reduce the receivable line's outstanding figure in place.
    ///
    /// Returns the prior and new figures. Only the store's atomic settlement
    /// operation calls this; the posted debit/credit amounts are untouched.
    pub fn reduce_outstanding(
        &mut self,
        account_code: &str,
        amount: i64,
    ) -> DomainResult<(i64, i64)> {
        if amount <= 0 {
            return Err(DomainError::validation("reduction must be positive"));
        }

        for line in &mut self.lines {
            if line.account_code != account_code {
                continue;
            }
            let Some(prior) = line.outstanding else {
                continue;
            };
            if prior < amount {
                return Err(DomainError::conflict(format!(
                    "outstanding {prior} on account {account_code} is less than reduction {amount}"
                )));
            }
            let new = prior - amount;
            line.outstanding = Some(new);
            return Ok((prior, new));
        }

        Err(DomainError::not_found(format!(
            "receivable line on account {account_code}"
        )))
    }

    /// Append an allocation audit record to the entry metadata.
    pub fn push_allocation_audit(&mut self, audit: &AllocationAudit) -> DomainResult<()> {
        let value = serde_json::to_value(audit)
            .map_err(|e| DomainError::validation(format!("audit serialization failed: {e}")))?;

        match self.metadata.get_mut(meta::ALLOCATIONS) {
            Some(Value::Array(items)) => items.push(value),
            _ => {
                self.metadata
                    .insert(meta::ALLOCATIONS.to_string(), Value::Array(vec![value]));
            }
        }
        Ok(())
    }

    /// Allocation audit trail recorded on this entry, oldest first.
    pub fn allocation_audits(&self) -> Vec<AllocationAudit> {
        let Some(Value::Array(items)) = self.metadata.get(meta::ALLOCATIONS) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect()
    }
}
