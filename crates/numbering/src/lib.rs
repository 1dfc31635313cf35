//! Employee number rules and the generator contract.
//!
//! A tenant configures at most one active numbering rule; the allocator
//! advances it under a per-tenant exclusive lock. "No rule configured" is a
//! valid state with a degenerate fallback format, not an error.

pub mod generator;
pub mod rule;

pub use generator::{
    ArchivedNumberResolver, EmployeeNumberGenerator, NoArchivedNumbers, NumberingError,
};
pub use rule::{fallback_number, EmployeeNumberRule, SequenceResetPolicy, YearFormat};
