//! Employee records and the contracts other modules consume them through.
//!
//! The directory owns employee lifecycle inside one tenant; the history
//! recorder keeps an append-only ledger of organizational events. Both are
//! consumed as traits so storage stays swappable.

pub mod directory;
pub mod employee;
pub mod history;

pub use directory::{DirectoryError, EmployeeDirectory};
pub use employee::{Employee, EmployeeId, EmployeeStatus, EmploymentType};
pub use history::{HistoryChangeType, HistoryEntry, HistoryError, HistoryRecorder};
