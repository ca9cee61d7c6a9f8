use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use bursar_core::{EntryId, Period, ResidenceId, StudentId};
use bursar_ledger::{
    Account, AccountCatalog, AccrualAdjustment, EntrySource, JournalEntry, JournalStore, LineItem,
    StoreError, StudentDirectory,
};

use crate::error::AllocationError;
use crate::resolver::{OutstandingObligation, ReceivableResolver};

/// A payment to allocate across a student's outstanding obligations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    pub student: StudentId,
    pub amount: i64,
    pub payment_date: NaiveDate,
    /// Period the payer claims to be paying for. Advisory: FIFO order wins.
    pub declared_period: Option<Period>,
    pub residence: Option<ResidenceId>,
}

/// How one slice of the payment was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationLineKind {
    Settlement,
    Advance,
}

/// One slice of the payment: a settlement against a specific accrual, or the
/// advance remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationLine {
    pub kind: AllocationLineKind,
    pub amount: i64,
    pub period: Option<Period>,
    pub accrual_entry: Option<EntryId>,
    /// The journal entry this slice produced.
    pub entry: EntryId,
}

/// Outcome of a successful allocation.
///
/// `total_allocated + advance_amount` always equals `payment_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationResult {
    pub allocation_id: Uuid,
    pub student: StudentId,
    pub payment_amount: i64,
    pub payment_date: NaiveDate,
    pub lines: Vec<AllocationLine>,
    pub total_allocated: i64,
    pub advance_amount: i64,
    pub declared_period: Option<Period>,
    /// Period the oldest settlement actually went to.
    pub effective_period: Option<Period>,
}

/// FIFO payment allocation over a student's receivables.
///
/// Allocations for the same student are serialized through a per-student
/// lock held from balance read to final write, so two payments can never
/// settle the same dollar of an obligation. Each settlement commits through
/// [`JournalStore::apply_settlement`], which re-checks the outstanding
/// figure under the store's write lock.
pub struct AllocationEngine {
    store: Arc<dyn JournalStore>,
    catalog: Arc<dyn AccountCatalog>,
    directory: Arc<dyn StudentDirectory>,
    resolver: ReceivableResolver,
    locks: Mutex<HashMap<StudentId, Arc<Mutex<()>>>>,
}

impl AllocationEngine {
    pub fn new(
        store: Arc<dyn JournalStore>,
        catalog: Arc<dyn AccountCatalog>,
        directory: Arc<dyn StudentDirectory>,
    ) -> Self {
        let resolver = ReceivableResolver::new(Arc::clone(&store));
        Self {
            store,
            catalog,
            directory,
            resolver,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate `request.amount` across the student's obligations, oldest
    /// first. Any remainder becomes an advance-payment liability.
    pub fn allocate(
        &self,
        request: AllocationRequest,
    ) -> Result<AllocationResult, AllocationError> {
        if request.amount <= 0 {
            return Err(AllocationError::InvalidAmount(request.amount));
        }
        if !self.directory.is_known(request.student)? {
            return Err(AllocationError::UnknownStudent(request.student));
        }

        let lock = self.student_lock(request.student)?;
        let _guard = lock
            .lock()
            .map_err(|_| AllocationError::Backend("student lock poisoned".to_string()))?;

        let allocation_id = Uuid::now_v7();
        let resolved = self.resolver.outstanding_balances(request.student)?;
        let open: Vec<&OutstandingObligation> = resolved.open_obligations().collect();
        if open.is_empty() {
            return Err(AllocationError::NoOutstandingBalance(request.student));
        }

        let effective_period = open.first().map(|o| o.period);
        if let (Some(declared), Some(effective)) = (request.declared_period, effective_period) {
            if declared != effective {
                warn!(
                    %allocation_id,
                    student = %request.student,
                    %declared,
                    %effective,
                    "declared period overridden by oldest outstanding period"
                );
            }
        }

        let cash = self.catalog.cash_account()?;
        let mut lines = Vec::new();
        let mut remaining = request.amount;
        let mut total_allocated = 0i64;

        for obligation in open {
            if remaining == 0 {
                break;
            }
            let amount = remaining.min(obligation.outstanding);
            let entry = self.settle(&request, obligation, &cash, amount, allocation_id)?;
            debug!(
                %allocation_id,
                period = %obligation.period,
                amount,
                "settled against accrual"
            );
            lines.push(AllocationLine {
                kind: AllocationLineKind::Settlement,
                amount,
                period: Some(obligation.period),
                accrual_entry: Some(obligation.accrual_entry),
                entry,
            });
            remaining -= amount;
            total_allocated += amount;
        }

        let advance_amount = remaining;
        if advance_amount > 0 {
            let entry = self.record_advance(&request, &cash, advance_amount)?;
            lines.push(AllocationLine {
                kind: AllocationLineKind::Advance,
                amount: advance_amount,
                period: None,
                accrual_entry: None,
                entry,
            });
        }

        info!(
            %allocation_id,
            student = %request.student,
            amount = request.amount,
            total_allocated,
            advance_amount,
            "payment allocated"
        );

        Ok(AllocationResult {
            allocation_id,
            student: request.student,
            payment_amount: request.amount,
            payment_date: request.payment_date,
            lines,
            total_allocated,
            advance_amount,
            declared_period: request.declared_period,
            effective_period,
        })
    }

    fn student_lock(&self, student: StudentId) -> Result<Arc<Mutex<()>>, AllocationError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| AllocationError::Backend("lock registry poisoned".to_string()))?;
        Ok(Arc::clone(locks.entry(student).or_default()))
    }

    /// One settlement entry plus the matching accrual decrement, committed
    /// as a unit.
    fn settle(
        &self,
        request: &AllocationRequest,
        obligation: &OutstandingObligation,
        cash: &Account,
        amount: i64,
        allocation_id: Uuid,
    ) -> Result<EntryId, AllocationError> {
        let entry_id = EntryId::new();
        let lines = vec![
            LineItem::debit(
                cash.code.clone(),
                cash.name.clone(),
                cash.account_type,
                amount,
            ),
            LineItem::credit(
                obligation.account_code.clone(),
                obligation.account_name.clone(),
                obligation.account_type,
                amount,
            ),
        ];
        let settlement = JournalEntry::new(
            entry_id,
            request.payment_date,
            EntrySource::Payment,
            format!("Payment settlement for {}", obligation.period),
            obligation.residence,
            lines,
        )?
        .with_student(request.student)
        .with_period(obligation.period)
        .with_accrual_ref(obligation.accrual_entry);

        let adjustment = AccrualAdjustment {
            accrual_entry: obligation.accrual_entry,
            account_code: obligation.account_code.clone(),
            amount,
            allocation_id,
            payment_date: request.payment_date,
            period: obligation.period,
        };

        match self.store.apply_settlement(settlement, adjustment) {
            Ok(_) => Ok(entry_id),
            Err(StoreError::StaleAllocation {
                entry,
                outstanding,
                requested,
            }) => Err(AllocationError::OverAllocation {
                entry,
                outstanding,
                requested,
            }),
            Err(other) => Err(AllocationError::CommitFailed(other)),
        }
    }

    fn record_advance(
        &self,
        request: &AllocationRequest,
        cash: &Account,
        amount: i64,
    ) -> Result<EntryId, AllocationError> {
        let advance = self.catalog.advance_payment_account(request.student)?;
        let entry_id = EntryId::new();
        let lines = vec![
            LineItem::debit(
                cash.code.clone(),
                cash.name.clone(),
                cash.account_type,
                amount,
            ),
            LineItem::credit(
                advance.code.clone(),
                advance.name.clone(),
                advance.account_type,
                amount,
            ),
        ];
        let entry = JournalEntry::new(
            entry_id,
            request.payment_date,
            EntrySource::Advance,
            "Advance payment received",
            request.residence,
            lines,
        )?
        .with_student(request.student);

        self.store
            .insert(entry)
            .map_err(AllocationError::CommitFailed)?;
        Ok(entry_id)
    }
}
