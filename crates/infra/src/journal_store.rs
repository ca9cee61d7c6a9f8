use std::collections::HashMap;
use std::sync::RwLock;

use bursar_core::EntryId;
use bursar_ledger::{
    AccrualAdjustment, AllocationAudit, EntryFilter, JournalEntry, JournalStore, StoreError,
};

/// In-memory journal entry store.
///
/// Intended for tests/dev. Not optimized for performance: `query` scans and
/// sorts on every call. `apply_settlement` runs both writes under one write
/// lock, validating everything before mutating anything, so a failure leaves
/// no partial state.
#[derive(Debug, Default)]
pub struct InMemoryJournalStore {
    entries: RwLock<HashMap<EntryId, JournalEntry>>,
}

impl InMemoryJournalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JournalStore for InMemoryJournalStore {
    fn insert(&self, entry: JournalEntry) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let id = entry.id_typed();
        if entries.contains_key(&id) {
            return Err(StoreError::DuplicateEntry(id));
        }
        entries.insert(id, entry);
        Ok(())
    }

    fn get(&self, id: EntryId) -> Result<Option<JournalEntry>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(entries.get(&id).cloned())
    }

    fn query(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let mut matched: Vec<JournalEntry> = entries
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();

        // Deterministic scan order: (date, id), with v7 ids as the tiebreak.
        matched.sort_by_key(|e| (e.date(), *e.id_typed().as_uuid()));
        Ok(matched)
    }

    fn apply_settlement(
        &self,
        settlement: JournalEntry,
        adjustment: AccrualAdjustment,
    ) -> Result<AllocationAudit, StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let settlement_id = settlement.id_typed();
        if entries.contains_key(&settlement_id) {
            return Err(StoreError::DuplicateEntry(settlement_id));
        }

        // Validate the whole unit before mutating any of it.
        let accrual = entries
            .get(&adjustment.accrual_entry)
            .ok_or(StoreError::EntryNotFound(adjustment.accrual_entry))?;
        let outstanding = accrual
            .outstanding_on(&adjustment.account_code)
            .ok_or_else(|| {
                StoreError::InvalidWrite(format!(
                    "entry {} has no receivable line on account {}",
                    adjustment.accrual_entry, adjustment.account_code
                ))
            })?;
        if outstanding < adjustment.amount {
            return Err(StoreError::StaleAllocation {
                entry: adjustment.accrual_entry,
                outstanding,
                requested: adjustment.amount,
            });
        }

        let audit = AllocationAudit {
            allocation_id: adjustment.allocation_id,
            payment_date: adjustment.payment_date,
            amount: adjustment.amount,
            period: adjustment.period,
            prior_outstanding: outstanding,
            new_outstanding: outstanding - adjustment.amount,
        };
        // Pre-flight the metadata write so the append below cannot fail.
        serde_json::to_value(&audit)
            .map_err(|e| StoreError::InvalidWrite(format!("audit serialization failed: {e}")))?;

        let accrual = entries
            .get_mut(&adjustment.accrual_entry)
            .ok_or(StoreError::EntryNotFound(adjustment.accrual_entry))?;
        accrual
            .reduce_outstanding(&adjustment.account_code, adjustment.amount)
            .map_err(|e| StoreError::InvalidWrite(e.to_string()))?;
        accrual
            .push_allocation_audit(&audit)
            .map_err(|e| StoreError::InvalidWrite(e.to_string()))?;

        entries.insert(settlement_id, settlement);
        Ok(audit)
    }
}
