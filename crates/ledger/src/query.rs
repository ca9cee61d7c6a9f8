//! Entry query interface for range scans over the journal.
//!
//! Aggregation and AR resolution are both driven by filtered range queries;
//! this keeps store implementations free of engine-specific logic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bursar_core::{ResidenceId, StudentId};

use crate::entry::{EntrySource, EntryStatus, JournalEntry};

/// Filter criteria for journal entry queries.
///
/// All criteria are optional; an empty filter matches every entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Inclusive lower bound on the entry date (optional).
    pub from_date: Option<NaiveDate>,
    /// Inclusive upper bound on the entry date (optional).
    pub to_date: Option<NaiveDate>,
    /// Filter by posting status (optional).
    pub status: Option<EntryStatus>,
    /// Filter by source workflow (optional).
    pub source: Option<EntrySource>,
    /// Filter by residence partition (optional).
    pub residence: Option<ResidenceId>,
    /// Filter by the student tagged in metadata (optional).
    pub student: Option<StudentId>,
    /// Entries posting at least one line to one of these accounts (optional).
    pub account_codes: Option<Vec<String>>,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            from_date: None,
            to_date: None,
            status: None,
            source: None,
            residence: None,
            student: None,
            account_codes: None,
        }
    }
}

impl EntryFilter {
    /// Whether the entry satisfies every set criterion.
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if let Some(from) = self.from_date {
            if entry.date() < from {
                return false;
            }
        }
        if let Some(to) = self.to_date {
            if entry.date() > to {
                return false;
            }
        }
        if let Some(status) = self.status {
            if entry.status() != status {
                return false;
            }
        }
        if let Some(source) = self.source {
            if entry.source() != source {
                return false;
            }
        }
        if let Some(residence) = self.residence {
            if entry.residence() != Some(residence) {
                return false;
            }
        }
        if let Some(student) = self.student {
            if entry.student_tag() != Some(student) {
                return false;
            }
        }
        if let Some(codes) = &self.account_codes {
            if !codes.iter().any(|c| entry.touches_account(c)) {
                return false;
            }
        }
        true
    }
}
