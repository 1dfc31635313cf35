use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use peopleforge_core::TenantId;
use peopleforge_employee::EmployeeId;
use peopleforge_events::{Event, TenantScoped};

use crate::request::TransferRequestId;

/// Integration fact published when a transfer has fully completed.
///
/// Consumed by downstream systems (payroll, access provisioning). Publication
/// is best-effort: a failed publish never rolls back the completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCompletedFact {
    pub transfer_request_id: TransferRequestId,
    pub source_employee_id: EmployeeId,
    pub target_employee_id: EmployeeId,
    pub source_tenant_id: TenantId,
    pub target_tenant_id: TenantId,
    pub occurred_at: DateTime<Utc>,
}

impl Event for TransferCompletedFact {
    fn event_type(&self) -> &'static str {
        "transfer.completed"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl TenantScoped for TransferCompletedFact {
    /// The owning scope is the source tenant (where the request lives).
    fn tenant_id(&self) -> TenantId {
        self.source_tenant_id
    }
}
