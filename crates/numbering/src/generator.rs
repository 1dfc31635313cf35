use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use peopleforge_core::TenantId;

/// Allocation failure. "No rule configured" is not an error; the allocator
/// falls back to the degenerate scheme instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NumberingError {
    #[error("number allocation unavailable: {0}")]
    Unavailable(String),
}

/// Issues unique, human-readable employee identifiers under concurrent
/// callers.
///
/// Implementations must serialize allocations per tenant (two concurrent
/// `generate` calls for the same tenant never return the same number) while
/// keeping tenants free of contention with each other. Gaps are acceptable on
/// failed attempts; duplicates are not.
pub trait EmployeeNumberGenerator: Send + Sync {
    fn generate(
        &self,
        tenant_id: TenantId,
        effective_date: NaiveDate,
    ) -> Result<String, NumberingError>;

    /// Look up a former employee's archived number for re-hire.
    ///
    /// Only meaningful when the tenant's rule has `allow_reuse` set; otherwise
    /// returns `None` immediately without touching any state.
    fn find_existing_number(
        &self,
        tenant_id: TenantId,
        name: &str,
        birth_date: NaiveDate,
    ) -> Result<Option<String>, NumberingError>;
}

impl<G> EmployeeNumberGenerator for Arc<G>
where
    G: EmployeeNumberGenerator + ?Sized,
{
    fn generate(
        &self,
        tenant_id: TenantId,
        effective_date: NaiveDate,
    ) -> Result<String, NumberingError> {
        (**self).generate(tenant_id, effective_date)
    }

    fn find_existing_number(
        &self,
        tenant_id: TenantId,
        name: &str,
        birth_date: NaiveDate,
    ) -> Result<Option<String>, NumberingError> {
        (**self).find_existing_number(tenant_id, name, birth_date)
    }
}

/// Resolves an archived employee number for a returning hire.
///
/// How (and whether) archived numbers are looked up is deployment-specific,
/// so the capability is pluggable rather than baked into the allocator.
pub trait ArchivedNumberResolver: Send + Sync {
    fn resolve(&self, tenant_id: TenantId, name: &str, birth_date: NaiveDate) -> Option<String>;
}

/// Default resolver: no archive wired up, nothing ever resolves.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoArchivedNumbers;

impl ArchivedNumberResolver for NoArchivedNumbers {
    fn resolve(&self, _tenant_id: TenantId, _name: &str, _birth_date: NaiveDate) -> Option<String> {
        None
    }
}
