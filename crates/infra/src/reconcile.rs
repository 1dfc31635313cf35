//! Reconciliation sweep for in-flight transfer completions.
//!
//! A completion that died mid-flight leaves a claimed request behind. The
//! auditor inspects both tenants' directories and classifies what actually
//! landed, so operations can alarm on the one state that must never persist:
//! a person active in two tenants at once.

use peopleforge_core::TenantId;
use peopleforge_employee::{DirectoryError, EmployeeDirectory, EmployeeId};
use peopleforge_transfer::{TransferRequest, TransferRequestId, TransferStatus};

/// Outcome of auditing one transfer request against the directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAudit {
    /// Nothing cross-tenant is outstanding for this request.
    Consistent,
    /// Completion is claimed but unfinished; records what has landed so far.
    CompletionInFlight {
        mirror_present: bool,
        source_resigned: bool,
    },
    /// The mirror is active in the target tenant while the source record is
    /// still active. Alarm condition.
    SplitBrain,
}

/// Audits transfer requests against both tenants' employee directories.
pub struct TransferAuditor<D> {
    directory: D,
}

impl<D> TransferAuditor<D>
where
    D: EmployeeDirectory,
{
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Classify one request. Statuses without cross-tenant side effects are
    /// consistent by construction.
    pub fn audit(&self, request: &TransferRequest) -> Result<TransferAudit, DirectoryError> {
        let (Some(employee_id), Some(source_tenant), Some(target_tenant)) = (
            request.employee_id(),
            request.source_tenant_id(),
            request.target_tenant_id(),
        ) else {
            return Ok(TransferAudit::Consistent);
        };

        match request.status() {
            TransferStatus::Completing => {
                let mirror = self.mirror_status(target_tenant, request.id_typed())?;
                let source_active = self.is_active(source_tenant, employee_id)?;

                if mirror.active && source_active {
                    self.alarm(request.id_typed());
                    return Ok(TransferAudit::SplitBrain);
                }

                Ok(TransferAudit::CompletionInFlight {
                    mirror_present: mirror.present,
                    source_resigned: !source_active,
                })
            }
            TransferStatus::Completed => {
                if self.is_active(source_tenant, employee_id)? {
                    self.alarm(request.id_typed());
                    return Ok(TransferAudit::SplitBrain);
                }
                Ok(TransferAudit::Consistent)
            }
            _ => Ok(TransferAudit::Consistent),
        }
    }

    /// Audit a batch, returning only the requests that need attention.
    pub fn sweep(
        &self,
        requests: &[TransferRequest],
    ) -> Vec<(TransferRequestId, TransferAudit)> {
        let mut findings = Vec::new();
        for request in requests {
            match self.audit(request) {
                Ok(TransferAudit::Consistent) => {}
                Ok(audit) => findings.push((request.id_typed(), audit)),
                Err(e) => tracing::warn!(
                    request_id = %request.id_typed(),
                    error = %e,
                    "transfer audit skipped, directory unavailable"
                ),
            }
        }
        findings
    }

    fn mirror_status(
        &self,
        target_tenant: TenantId,
        request_id: TransferRequestId,
    ) -> Result<MirrorStatus, DirectoryError> {
        match self
            .directory
            .find_by_id(target_tenant, EmployeeId::new(request_id.0))
        {
            Ok(employee) => Ok(MirrorStatus {
                present: true,
                active: employee.is_active(),
            }),
            Err(DirectoryError::NotFound) => Ok(MirrorStatus {
                present: false,
                active: false,
            }),
            Err(e) => Err(e),
        }
    }

    fn is_active(
        &self,
        tenant_id: TenantId,
        employee_id: EmployeeId,
    ) -> Result<bool, DirectoryError> {
        match self.directory.find_by_id(tenant_id, employee_id) {
            Ok(employee) => Ok(employee.is_active()),
            Err(DirectoryError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn alarm(&self, request_id: TransferRequestId) {
        tracing::error!(
            request_id = %request_id,
            "employee active in both tenants for one transfer request"
        );
    }
}

struct MirrorStatus {
    present: bool,
    active: bool,
}
