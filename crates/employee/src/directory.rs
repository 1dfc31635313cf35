use std::sync::Arc;

use thiserror::Error;

use peopleforge_core::TenantId;

use crate::employee::{Employee, EmployeeId};

/// Directory operation error.
///
/// `Unavailable` is transient infrastructure trouble; callers may retry reads
/// with bounded backoff. `NotFound` is a definitive answer and is never
/// retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("employee not found")]
    NotFound,

    #[error("employee directory unavailable: {0}")]
    Unavailable(String),
}

/// Tenant-partitioned employee directory.
///
/// Every call names its tenant explicitly; there is no ambient "current
/// tenant" to set or restore, so concurrent cross-tenant work cannot leak
/// scope into each other.
pub trait EmployeeDirectory: Send + Sync {
    fn find_by_id(&self, tenant_id: TenantId, id: EmployeeId) -> Result<Employee, DirectoryError>;

    /// Insert or update an employee record.
    fn save(&self, tenant_id: TenantId, employee: Employee) -> Result<(), DirectoryError>;

    /// Remove an employee record. Idempotent: removing a missing record is a
    /// no-op, so compensation paths can call this blindly.
    fn remove(&self, tenant_id: TenantId, id: EmployeeId) -> Result<(), DirectoryError>;

    /// Head-count for the tenant (all statuses).
    fn count(&self, tenant_id: TenantId) -> Result<u64, DirectoryError>;
}

impl<D> EmployeeDirectory for Arc<D>
where
    D: EmployeeDirectory + ?Sized,
{
    fn find_by_id(&self, tenant_id: TenantId, id: EmployeeId) -> Result<Employee, DirectoryError> {
        (**self).find_by_id(tenant_id, id)
    }

    fn save(&self, tenant_id: TenantId, employee: Employee) -> Result<(), DirectoryError> {
        (**self).save(tenant_id, employee)
    }

    fn remove(&self, tenant_id: TenantId, id: EmployeeId) -> Result<(), DirectoryError> {
        (**self).remove(tenant_id, id)
    }

    fn count(&self, tenant_id: TenantId) -> Result<u64, DirectoryError> {
        (**self).count(tenant_id)
    }
}
