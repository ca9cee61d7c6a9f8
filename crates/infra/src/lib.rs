//! Infrastructure layer: ledger storage backends.
//!
//! In-memory implementations of the `bursar-ledger` traits, intended for
//! tests and dev. Database-backed implementations live with the surrounding
//! system; everything here honors the same contracts (ordered queries,
//! atomic settlement application).

pub mod account_catalog;
pub mod journal_store;
pub mod student_directory;

pub use account_catalog::{InMemoryAccountCatalog, standard_chart};
pub use journal_store::InMemoryJournalStore;
pub use student_directory::InMemoryStudentDirectory;
