use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use peopleforge_core::{
    Aggregate, AggregateId, AggregateRoot, DepartmentId, DomainError, DomainResult, GradeId,
    PositionId, TenantId, UserId,
};
use peopleforge_employee::EmployeeId;
use peopleforge_events::Event;

/// Transfer request identifier (stream owned by the source tenant).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferRequestId(pub AggregateId);

impl TransferRequestId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TransferRequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Transfer request lifecycle.
///
/// `Completing` marks the cross-tenant unit of work as in flight; nothing
/// user-facing may interrupt it. `Completed`, `Rejected` and `Cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Draft,
    Pending,
    SourceApproved,
    Approved,
    Completing,
    Completed,
    Rejected,
    Cancelled,
}

/// An approval signature from one side of the transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub approver_id: UserId,
    pub approver_name: String,
    pub approved_at: DateTime<Utc>,
}

/// Everything the completion protocol needs from an approved request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionContext {
    pub employee_id: EmployeeId,
    pub source_tenant_id: TenantId,
    pub target_tenant_id: TenantId,
    pub target_department_id: Option<DepartmentId>,
    pub target_position_id: Option<PositionId>,
    pub target_grade_id: Option<GradeId>,
    pub transfer_date: NaiveDate,
}

/// Aggregate root: a request to move one employee from a source tenant to a
/// target tenant.
///
/// Owned by the source tenant; the target tenant only contributes its
/// approval signature, never direct mutation of workflow fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    id: TransferRequestId,
    employee_id: Option<EmployeeId>,
    source_tenant_id: Option<TenantId>,
    target_tenant_id: Option<TenantId>,
    target_department_id: Option<DepartmentId>,
    target_position_id: Option<PositionId>,
    target_grade_id: Option<GradeId>,
    transfer_date: Option<NaiveDate>,
    reason: Option<String>,
    status: TransferStatus,
    source_approval: Option<Approval>,
    target_approval: Option<Approval>,
    reject_reason: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    target_employee_id: Option<EmployeeId>,
    target_employee_number: Option<String>,
    version: u64,
    created: bool,
}

impl TransferRequest {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: TransferRequestId) -> Self {
        Self {
            id,
            employee_id: None,
            source_tenant_id: None,
            target_tenant_id: None,
            target_department_id: None,
            target_position_id: None,
            target_grade_id: None,
            transfer_date: None,
            reason: None,
            status: TransferStatus::Draft,
            source_approval: None,
            target_approval: None,
            reject_reason: None,
            completed_at: None,
            target_employee_id: None,
            target_employee_number: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> TransferRequestId {
        self.id
    }

    pub fn employee_id(&self) -> Option<EmployeeId> {
        self.employee_id
    }

    pub fn source_tenant_id(&self) -> Option<TenantId> {
        self.source_tenant_id
    }

    pub fn target_tenant_id(&self) -> Option<TenantId> {
        self.target_tenant_id
    }

    pub fn target_department_id(&self) -> Option<DepartmentId> {
        self.target_department_id
    }

    pub fn target_position_id(&self) -> Option<PositionId> {
        self.target_position_id
    }

    pub fn target_grade_id(&self) -> Option<GradeId> {
        self.target_grade_id
    }

    pub fn transfer_date(&self) -> Option<NaiveDate> {
        self.transfer_date
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn source_approval(&self) -> Option<&Approval> {
        self.source_approval.as_ref()
    }

    pub fn target_approval(&self) -> Option<&Approval> {
        self.target_approval.as_ref()
    }

    pub fn reject_reason(&self) -> Option<&str> {
        self.reject_reason.as_deref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn target_employee_id(&self) -> Option<EmployeeId> {
        self.target_employee_id
    }

    pub fn target_employee_number(&self) -> Option<&str> {
        self.target_employee_number.as_deref()
    }

    pub fn is_draft(&self) -> bool {
        self.status == TransferStatus::Draft
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransferStatus::Pending
    }

    pub fn is_source_approved(&self) -> bool {
        self.status == TransferStatus::SourceApproved
    }

    pub fn is_approved(&self) -> bool {
        self.status == TransferStatus::Approved
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            TransferStatus::Completed | TransferStatus::Rejected | TransferStatus::Cancelled
        )
    }

    pub fn can_be_modified(&self) -> bool {
        self.is_draft()
    }

    pub fn can_be_submitted(&self) -> bool {
        self.is_draft()
    }

    /// A request that has collected any approval signature can never be
    /// physically deleted, only rejected or cancelled.
    pub fn can_be_deleted(&self) -> bool {
        self.is_draft()
    }

    pub fn completion_context(&self) -> DomainResult<CompletionContext> {
        match (
            self.employee_id,
            self.source_tenant_id,
            self.target_tenant_id,
            self.transfer_date,
        ) {
            (Some(employee_id), Some(source_tenant_id), Some(target_tenant_id), Some(date)) => {
                Ok(CompletionContext {
                    employee_id,
                    source_tenant_id,
                    target_tenant_id,
                    target_department_id: self.target_department_id,
                    target_position_id: self.target_position_id,
                    target_grade_id: self.target_grade_id,
                    transfer_date: date,
                })
            }
            _ => Err(DomainError::invalid_state("transfer request does not exist")),
        }
    }
}

impl AggregateRoot for TransferRequest {
    type Id = TransferRequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateTransferRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransferRequest {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub employee_id: EmployeeId,
    pub target_tenant_id: TenantId,
    pub target_department_id: Option<DepartmentId>,
    pub target_position_id: Option<PositionId>,
    pub target_grade_id: Option<GradeId>,
    pub transfer_date: NaiveDate,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateTransferRequest. `None` fields keep their current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTransferRequest {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub target_department_id: Option<DepartmentId>,
    pub target_position_id: Option<PositionId>,
    pub target_grade_id: Option<GradeId>,
    pub transfer_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitTransferRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTransferRequest {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveSource (the releasing tenant signs off).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveSource {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub approver_id: UserId,
    pub approver_name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveTarget (the receiving tenant signs off).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveTarget {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    /// Tenant on whose behalf the approval is made; must be the request's
    /// target tenant.
    pub approving_tenant_id: TenantId,
    pub approver_id: UserId,
    pub approver_name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectTransfer (counterparty-initiated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectTransfer {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelTransfer (self-initiated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelTransfer {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: BeginCompletion. Claims an approved request for the cross-tenant
/// unit of work; the single linearization point against late rejections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginCompletion {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AbortCompletion. Returns a claimed request to `Approved` after a
/// cleanly compensated failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortCompletion {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: FinishCompletion. Records the mirrored employee and closes the
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishCompletion {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub target_employee_id: EmployeeId,
    pub target_employee_number: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferCommand {
    CreateTransferRequest(CreateTransferRequest),
    UpdateTransferRequest(UpdateTransferRequest),
    SubmitTransferRequest(SubmitTransferRequest),
    ApproveSource(ApproveSource),
    ApproveTarget(ApproveTarget),
    RejectTransfer(RejectTransfer),
    CancelTransfer(CancelTransfer),
    BeginCompletion(BeginCompletion),
    AbortCompletion(AbortCompletion),
    FinishCompletion(FinishCompletion),
}

/// Event: TransferRequestCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequestCreated {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub employee_id: EmployeeId,
    pub target_tenant_id: TenantId,
    pub target_department_id: Option<DepartmentId>,
    pub target_position_id: Option<PositionId>,
    pub target_grade_id: Option<GradeId>,
    pub transfer_date: NaiveDate,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferRequestUpdated (carries the resolved new values).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequestUpdated {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub target_department_id: Option<DepartmentId>,
    pub target_position_id: Option<PositionId>,
    pub target_grade_id: Option<GradeId>,
    pub transfer_date: NaiveDate,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferRequestSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequestSubmitted {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferSourceApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSourceApproved {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub approver_id: UserId,
    pub approver_name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferTargetApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTargetApproved {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub approver_id: UserId,
    pub approver_name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRejected {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCancelled {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferCompletionStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCompletionStarted {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferCompletionAborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCompletionAborted {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCompleted {
    pub tenant_id: TenantId,
    pub request_id: TransferRequestId,
    pub target_employee_id: EmployeeId,
    pub target_employee_number: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferEvent {
    TransferRequestCreated(TransferRequestCreated),
    TransferRequestUpdated(TransferRequestUpdated),
    TransferRequestSubmitted(TransferRequestSubmitted),
    TransferSourceApproved(TransferSourceApproved),
    TransferTargetApproved(TransferTargetApproved),
    TransferRejected(TransferRejected),
    TransferCancelled(TransferCancelled),
    TransferCompletionStarted(TransferCompletionStarted),
    TransferCompletionAborted(TransferCompletionAborted),
    TransferCompleted(TransferCompleted),
}

impl Event for TransferEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TransferEvent::TransferRequestCreated(_) => "transfer.request.created",
            TransferEvent::TransferRequestUpdated(_) => "transfer.request.updated",
            TransferEvent::TransferRequestSubmitted(_) => "transfer.request.submitted",
            TransferEvent::TransferSourceApproved(_) => "transfer.request.source_approved",
            TransferEvent::TransferTargetApproved(_) => "transfer.request.target_approved",
            TransferEvent::TransferRejected(_) => "transfer.request.rejected",
            TransferEvent::TransferCancelled(_) => "transfer.request.cancelled",
            TransferEvent::TransferCompletionStarted(_) => "transfer.request.completion_started",
            TransferEvent::TransferCompletionAborted(_) => "transfer.request.completion_aborted",
            TransferEvent::TransferCompleted(_) => "transfer.request.completed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TransferEvent::TransferRequestCreated(e) => e.occurred_at,
            TransferEvent::TransferRequestUpdated(e) => e.occurred_at,
            TransferEvent::TransferRequestSubmitted(e) => e.occurred_at,
            TransferEvent::TransferSourceApproved(e) => e.occurred_at,
            TransferEvent::TransferTargetApproved(e) => e.occurred_at,
            TransferEvent::TransferRejected(e) => e.occurred_at,
            TransferEvent::TransferCancelled(e) => e.occurred_at,
            TransferEvent::TransferCompletionStarted(e) => e.occurred_at,
            TransferEvent::TransferCompletionAborted(e) => e.occurred_at,
            TransferEvent::TransferCompleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for TransferRequest {
    type Command = TransferCommand;
    type Event = TransferEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            TransferEvent::TransferRequestCreated(e) => {
                self.id = e.request_id;
                self.employee_id = Some(e.employee_id);
                self.source_tenant_id = Some(e.tenant_id);
                self.target_tenant_id = Some(e.target_tenant_id);
                self.target_department_id = e.target_department_id;
                self.target_position_id = e.target_position_id;
                self.target_grade_id = e.target_grade_id;
                self.transfer_date = Some(e.transfer_date);
                self.reason = e.reason.clone();
                self.status = TransferStatus::Draft;
                self.created = true;
            }
            TransferEvent::TransferRequestUpdated(e) => {
                self.target_department_id = e.target_department_id;
                self.target_position_id = e.target_position_id;
                self.target_grade_id = e.target_grade_id;
                self.transfer_date = Some(e.transfer_date);
                self.reason = e.reason.clone();
            }
            TransferEvent::TransferRequestSubmitted(_) => {
                self.status = TransferStatus::Pending;
            }
            TransferEvent::TransferSourceApproved(e) => {
                self.source_approval = Some(Approval {
                    approver_id: e.approver_id,
                    approver_name: e.approver_name.clone(),
                    approved_at: e.occurred_at,
                });
                self.status = TransferStatus::SourceApproved;
            }
            TransferEvent::TransferTargetApproved(e) => {
                self.target_approval = Some(Approval {
                    approver_id: e.approver_id,
                    approver_name: e.approver_name.clone(),
                    approved_at: e.occurred_at,
                });
                self.status = TransferStatus::Approved;
            }
            TransferEvent::TransferRejected(e) => {
                self.reject_reason = Some(e.reason.clone());
                self.status = TransferStatus::Rejected;
            }
            TransferEvent::TransferCancelled(_) => {
                self.status = TransferStatus::Cancelled;
            }
            TransferEvent::TransferCompletionStarted(_) => {
                self.status = TransferStatus::Completing;
            }
            TransferEvent::TransferCompletionAborted(_) => {
                self.status = TransferStatus::Approved;
            }
            TransferEvent::TransferCompleted(e) => {
                self.target_employee_id = Some(e.target_employee_id);
                self.target_employee_number = Some(e.target_employee_number.clone());
                self.completed_at = Some(e.occurred_at);
                self.status = TransferStatus::Completed;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            TransferCommand::CreateTransferRequest(cmd) => self.handle_create(cmd),
            TransferCommand::UpdateTransferRequest(cmd) => self.handle_update(cmd),
            TransferCommand::SubmitTransferRequest(cmd) => self.handle_submit(cmd),
            TransferCommand::ApproveSource(cmd) => self.handle_approve_source(cmd),
            TransferCommand::ApproveTarget(cmd) => self.handle_approve_target(cmd),
            TransferCommand::RejectTransfer(cmd) => self.handle_reject(cmd),
            TransferCommand::CancelTransfer(cmd) => self.handle_cancel(cmd),
            TransferCommand::BeginCompletion(cmd) => self.handle_begin_completion(cmd),
            TransferCommand::AbortCompletion(cmd) => self.handle_abort_completion(cmd),
            TransferCommand::FinishCompletion(cmd) => self.handle_finish_completion(cmd),
        }
    }
}

impl TransferRequest {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.source_tenant_id != Some(tenant_id) {
            return Err(DomainError::validation("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_request_id(&self, request_id: TransferRequestId) -> Result<(), DomainError> {
        if self.id != request_id {
            return Err(DomainError::validation("request_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(
        &self,
        cmd: &CreateTransferRequest,
    ) -> Result<Vec<TransferEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("transfer request already exists"));
        }

        // Deliberately no cross-entity validation here (target org unit
        // existence is the caller's responsibility): creation must never fail
        // because a dependency is momentarily unavailable.
        if cmd.target_tenant_id == cmd.tenant_id {
            return Err(DomainError::validation(
                "source and target tenant must differ",
            ));
        }

        Ok(vec![TransferEvent::TransferRequestCreated(
            TransferRequestCreated {
                tenant_id: cmd.tenant_id,
                request_id: cmd.request_id,
                employee_id: cmd.employee_id,
                target_tenant_id: cmd.target_tenant_id,
                target_department_id: cmd.target_department_id,
                target_position_id: cmd.target_position_id,
                target_grade_id: cmd.target_grade_id,
                transfer_date: cmd.transfer_date,
                reason: cmd.reason.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_update(
        &self,
        cmd: &UpdateTransferRequest,
    ) -> Result<Vec<TransferEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_request_id(cmd.request_id)?;

        if !self.can_be_modified() {
            return Err(DomainError::invalid_state(
                "only draft requests can be modified",
            ));
        }

        let transfer_date = match (cmd.transfer_date, self.transfer_date) {
            (Some(date), _) => date,
            (None, Some(date)) => date,
            (None, None) => {
                return Err(DomainError::invalid_state("transfer request does not exist"))
            }
        };

        Ok(vec![TransferEvent::TransferRequestUpdated(
            TransferRequestUpdated {
                tenant_id: cmd.tenant_id,
                request_id: cmd.request_id,
                target_department_id: cmd.target_department_id.or(self.target_department_id),
                target_position_id: cmd.target_position_id.or(self.target_position_id),
                target_grade_id: cmd.target_grade_id.or(self.target_grade_id),
                transfer_date,
                reason: cmd.reason.clone().or_else(|| self.reason.clone()),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_submit(
        &self,
        cmd: &SubmitTransferRequest,
    ) -> Result<Vec<TransferEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_request_id(cmd.request_id)?;

        if !self.can_be_submitted() {
            return Err(DomainError::invalid_state(
                "only draft requests can be submitted",
            ));
        }

        Ok(vec![TransferEvent::TransferRequestSubmitted(
            TransferRequestSubmitted {
                tenant_id: cmd.tenant_id,
                request_id: cmd.request_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_approve_source(
        &self,
        cmd: &ApproveSource,
    ) -> Result<Vec<TransferEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_request_id(cmd.request_id)?;

        if !self.is_pending() {
            return Err(DomainError::invalid_state(
                "only pending requests can be approved by the releasing tenant",
            ));
        }

        Ok(vec![TransferEvent::TransferSourceApproved(
            TransferSourceApproved {
                tenant_id: cmd.tenant_id,
                request_id: cmd.request_id,
                approver_id: cmd.approver_id,
                approver_name: cmd.approver_name.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_approve_target(
        &self,
        cmd: &ApproveTarget,
    ) -> Result<Vec<TransferEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_request_id(cmd.request_id)?;

        // Strict two-party hand-off: the receiving tenant may not approve
        // before the releasing tenant has.
        if !self.is_source_approved() {
            return Err(DomainError::invalid_state(
                "target approval requires source approval first",
            ));
        }

        if self.target_tenant_id != Some(cmd.approving_tenant_id) {
            return Err(DomainError::validation(
                "target approval must come from the target tenant",
            ));
        }

        Ok(vec![TransferEvent::TransferTargetApproved(
            TransferTargetApproved {
                tenant_id: cmd.tenant_id,
                request_id: cmd.request_id,
                approver_id: cmd.approver_id,
                approver_name: cmd.approver_name.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_reject(&self, cmd: &RejectTransfer) -> Result<Vec<TransferEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_request_id(cmd.request_id)?;

        if self.is_terminal() {
            return Err(DomainError::invalid_state(
                "request can no longer be rejected",
            ));
        }
        if self.status == TransferStatus::Completing {
            return Err(DomainError::invalid_state("completion is in progress"));
        }

        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("rejection reason cannot be empty"));
        }

        Ok(vec![TransferEvent::TransferRejected(TransferRejected {
            tenant_id: cmd.tenant_id,
            request_id: cmd.request_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelTransfer) -> Result<Vec<TransferEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_request_id(cmd.request_id)?;

        if self.status == TransferStatus::Completed {
            return Err(DomainError::invalid_state(
                "completed requests cannot be cancelled",
            ));
        }
        if self.status == TransferStatus::Completing {
            return Err(DomainError::invalid_state("completion is in progress"));
        }

        Ok(vec![TransferEvent::TransferCancelled(TransferCancelled {
            tenant_id: cmd.tenant_id,
            request_id: cmd.request_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_begin_completion(
        &self,
        cmd: &BeginCompletion,
    ) -> Result<Vec<TransferEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_request_id(cmd.request_id)?;

        if !self.is_approved() {
            return Err(DomainError::invalid_state(
                "only approved requests can be completed",
            ));
        }

        Ok(vec![TransferEvent::TransferCompletionStarted(
            TransferCompletionStarted {
                tenant_id: cmd.tenant_id,
                request_id: cmd.request_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_abort_completion(
        &self,
        cmd: &AbortCompletion,
    ) -> Result<Vec<TransferEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_request_id(cmd.request_id)?;

        if self.status != TransferStatus::Completing {
            return Err(DomainError::invalid_state("no completion in progress"));
        }

        Ok(vec![TransferEvent::TransferCompletionAborted(
            TransferCompletionAborted {
                tenant_id: cmd.tenant_id,
                request_id: cmd.request_id,
                reason: cmd.reason.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_finish_completion(
        &self,
        cmd: &FinishCompletion,
    ) -> Result<Vec<TransferEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_request_id(cmd.request_id)?;

        if self.status != TransferStatus::Completing {
            return Err(DomainError::invalid_state("no completion in progress"));
        }

        Ok(vec![TransferEvent::TransferCompleted(TransferCompleted {
            tenant_id: cmd.tenant_id,
            request_id: cmd.request_id,
            target_employee_id: cmd.target_employee_id,
            target_employee_number: cmd.target_employee_number.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peopleforge_events::Event as _;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn test_request_id() -> TransferRequestId {
        TransferRequestId::new(AggregateId::new())
    }

    fn test_employee_id() -> EmployeeId {
        EmployeeId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()
    }

    fn create_cmd(
        source: TenantId,
        target: TenantId,
        request_id: TransferRequestId,
    ) -> CreateTransferRequest {
        CreateTransferRequest {
            tenant_id: source,
            request_id,
            employee_id: test_employee_id(),
            target_tenant_id: target,
            target_department_id: Some(DepartmentId::new()),
            target_position_id: None,
            target_grade_id: None,
            transfer_date: test_date(),
            reason: Some("group restructuring".to_string()),
            occurred_at: test_time(),
        }
    }

    /// Build a request and walk it to the given status.
    fn request_in_status(status: TransferStatus) -> (TransferRequest, TenantId, TenantId) {
        let source = test_tenant_id();
        let target = test_tenant_id();
        let request_id = test_request_id();

        let mut request = TransferRequest::empty(request_id);
        let events = request
            .handle(&TransferCommand::CreateTransferRequest(create_cmd(
                source, target, request_id,
            )))
            .unwrap();
        request.apply(&events[0]);
        if status == TransferStatus::Draft {
            return (request, source, target);
        }

        let events = request
            .handle(&TransferCommand::SubmitTransferRequest(
                SubmitTransferRequest {
                    tenant_id: source,
                    request_id,
                    occurred_at: test_time(),
                },
            ))
            .unwrap();
        request.apply(&events[0]);
        if status == TransferStatus::Pending {
            return (request, source, target);
        }

        let events = request
            .handle(&TransferCommand::ApproveSource(ApproveSource {
                tenant_id: source,
                request_id,
                approver_id: UserId::new(),
                approver_name: "Source Approver".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();
        request.apply(&events[0]);
        if status == TransferStatus::SourceApproved {
            return (request, source, target);
        }

        let events = request
            .handle(&TransferCommand::ApproveTarget(ApproveTarget {
                tenant_id: source,
                request_id,
                approving_tenant_id: target,
                approver_id: UserId::new(),
                approver_name: "Target Approver".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();
        request.apply(&events[0]);
        if status == TransferStatus::Approved {
            return (request, source, target);
        }

        let events = request
            .handle(&TransferCommand::BeginCompletion(BeginCompletion {
                tenant_id: source,
                request_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        request.apply(&events[0]);
        if status == TransferStatus::Completing {
            return (request, source, target);
        }

        let events = request
            .handle(&TransferCommand::FinishCompletion(FinishCompletion {
                tenant_id: source,
                request_id,
                target_employee_id: test_employee_id(),
                target_employee_number: "HR-2026-0001".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();
        request.apply(&events[0]);
        assert_eq!(status, TransferStatus::Completed);
        (request, source, target)
    }

    #[test]
    fn create_emits_created_event_in_draft() {
        let source = test_tenant_id();
        let target = test_tenant_id();
        let request_id = test_request_id();
        let request = TransferRequest::empty(request_id);
        let cmd = create_cmd(source, target, request_id);

        let events = request
            .handle(&TransferCommand::CreateTransferRequest(cmd.clone()))
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "transfer.request.created");

        match &events[0] {
            TransferEvent::TransferRequestCreated(e) => {
                assert_eq!(e.tenant_id, source);
                assert_eq!(e.target_tenant_id, target);
                assert_eq!(e.employee_id, cmd.employee_id);
                assert_eq!(e.transfer_date, cmd.transfer_date);
            }
            _ => panic!("Expected TransferRequestCreated event"),
        }
    }

    #[test]
    fn create_rejects_same_source_and_target_tenant() {
        let tenant = test_tenant_id();
        let request_id = test_request_id();
        let request = TransferRequest::empty(request_id);
        let cmd = create_cmd(tenant, tenant, request_id);

        let err = request
            .handle(&TransferCommand::CreateTransferRequest(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_is_rejected_after_submission() {
        let (request, source, _) = request_in_status(TransferStatus::Pending);

        let err = request
            .handle(&TransferCommand::UpdateTransferRequest(
                UpdateTransferRequest {
                    tenant_id: source,
                    request_id: request.id_typed(),
                    target_department_id: Some(DepartmentId::new()),
                    target_position_id: None,
                    target_grade_id: None,
                    transfer_date: None,
                    reason: None,
                    occurred_at: test_time(),
                },
            ))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn update_in_draft_keeps_unspecified_fields() {
        let (mut request, source, _) = request_in_status(TransferStatus::Draft);
        let original_department = request.target_department_id();
        let new_date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

        let events = request
            .handle(&TransferCommand::UpdateTransferRequest(
                UpdateTransferRequest {
                    tenant_id: source,
                    request_id: request.id_typed(),
                    target_department_id: None,
                    target_position_id: None,
                    target_grade_id: None,
                    transfer_date: Some(new_date),
                    reason: None,
                    occurred_at: test_time(),
                },
            ))
            .unwrap();
        request.apply(&events[0]);

        assert_eq!(request.target_department_id(), original_department);
        assert_eq!(request.transfer_date(), Some(new_date));
        assert_eq!(request.reason(), Some("group restructuring"));
    }

    #[test]
    fn target_approval_before_source_approval_fails() {
        let (request, source, target) = request_in_status(TransferStatus::Pending);

        let cmd = ApproveTarget {
            tenant_id: source,
            request_id: request.id_typed(),
            approving_tenant_id: target,
            approver_id: UserId::new(),
            approver_name: "Target Approver".to_string(),
            occurred_at: test_time(),
        };

        // Fails however often it is retried while source approval is missing.
        for _ in 0..3 {
            let err = request
                .handle(&TransferCommand::ApproveTarget(cmd.clone()))
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
        }
    }

    #[test]
    fn target_approval_succeeds_after_source_approval() {
        let (mut request, source, target) = request_in_status(TransferStatus::SourceApproved);

        let events = request
            .handle(&TransferCommand::ApproveTarget(ApproveTarget {
                tenant_id: source,
                request_id: request.id_typed(),
                approving_tenant_id: target,
                approver_id: UserId::new(),
                approver_name: "Target Approver".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();
        request.apply(&events[0]);

        assert_eq!(request.status(), TransferStatus::Approved);
        assert!(request.source_approval().is_some());
        assert!(request.target_approval().is_some());
    }

    #[test]
    fn target_approval_from_wrong_tenant_fails() {
        let (request, source, _) = request_in_status(TransferStatus::SourceApproved);

        let err = request
            .handle(&TransferCommand::ApproveTarget(ApproveTarget {
                tenant_id: source,
                request_id: request.id_typed(),
                approving_tenant_id: test_tenant_id(),
                approver_id: UserId::new(),
                approver_name: "Imposter".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn source_approval_requires_pending() {
        let (request, source, _) = request_in_status(TransferStatus::Draft);

        let err = request
            .handle(&TransferCommand::ApproveSource(ApproveSource {
                tenant_id: source,
                request_id: request.id_typed(),
                approver_id: UserId::new(),
                approver_name: "Source Approver".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn reject_is_allowed_from_every_active_state() {
        for status in [
            TransferStatus::Draft,
            TransferStatus::Pending,
            TransferStatus::SourceApproved,
            TransferStatus::Approved,
        ] {
            let (mut request, source, _) = request_in_status(status);
            let events = request
                .handle(&TransferCommand::RejectTransfer(RejectTransfer {
                    tenant_id: source,
                    request_id: request.id_typed(),
                    reason: "headcount freeze".to_string(),
                    occurred_at: test_time(),
                }))
                .unwrap();
            request.apply(&events[0]);

            assert_eq!(request.status(), TransferStatus::Rejected);
            assert_eq!(request.reject_reason(), Some("headcount freeze"));
        }
    }

    #[test]
    fn reject_is_blocked_in_terminal_and_completing_states() {
        for status in [TransferStatus::Completing, TransferStatus::Completed] {
            let (request, source, _) = request_in_status(status);
            let err = request
                .handle(&TransferCommand::RejectTransfer(RejectTransfer {
                    tenant_id: source,
                    request_id: request.id_typed(),
                    reason: "too late".to_string(),
                    occurred_at: test_time(),
                }))
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
        }
    }

    #[test]
    fn reject_requires_a_reason() {
        let (request, source, _) = request_in_status(TransferStatus::Pending);

        let err = request
            .handle(&TransferCommand::RejectTransfer(RejectTransfer {
                tenant_id: source,
                request_id: request.id_typed(),
                reason: "   ".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn cancel_is_blocked_once_completed_or_completing() {
        for status in [TransferStatus::Completing, TransferStatus::Completed] {
            let (request, source, _) = request_in_status(status);
            let err = request
                .handle(&TransferCommand::CancelTransfer(CancelTransfer {
                    tenant_id: source,
                    request_id: request.id_typed(),
                    reason: None,
                    occurred_at: test_time(),
                }))
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
        }
    }

    #[test]
    fn cancel_is_allowed_even_after_rejection() {
        let (mut request, source, _) = request_in_status(TransferStatus::Pending);
        let events = request
            .handle(&TransferCommand::RejectTransfer(RejectTransfer {
                tenant_id: source,
                request_id: request.id_typed(),
                reason: "no".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();
        request.apply(&events[0]);

        let events = request
            .handle(&TransferCommand::CancelTransfer(CancelTransfer {
                tenant_id: source,
                request_id: request.id_typed(),
                reason: Some("withdrawn".to_string()),
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn begin_completion_requires_approved() {
        for status in [
            TransferStatus::Draft,
            TransferStatus::Pending,
            TransferStatus::SourceApproved,
        ] {
            let (request, source, _) = request_in_status(status);
            let err = request
                .handle(&TransferCommand::BeginCompletion(BeginCompletion {
                    tenant_id: source,
                    request_id: request.id_typed(),
                    occurred_at: test_time(),
                }))
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
        }
    }

    #[test]
    fn begin_completion_blocks_a_second_claim() {
        let (request, source, _) = request_in_status(TransferStatus::Completing);

        let err = request
            .handle(&TransferCommand::BeginCompletion(BeginCompletion {
                tenant_id: source,
                request_id: request.id_typed(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn abort_completion_returns_to_approved() {
        let (mut request, source, _) = request_in_status(TransferStatus::Completing);

        let events = request
            .handle(&TransferCommand::AbortCompletion(AbortCompletion {
                tenant_id: source,
                request_id: request.id_typed(),
                reason: "source employee not found".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();
        request.apply(&events[0]);

        assert_eq!(request.status(), TransferStatus::Approved);
    }

    #[test]
    fn finish_completion_records_mirror_employee_and_timestamp() {
        let (request, _, _) = request_in_status(TransferStatus::Completed);

        assert_eq!(request.status(), TransferStatus::Completed);
        assert!(request.completed_at().is_some());
        assert!(request.target_employee_id().is_some());
        assert_eq!(request.target_employee_number(), Some("HR-2026-0001"));
        assert!(request.is_terminal());
    }

    #[test]
    fn only_draft_requests_can_be_deleted() {
        let (draft, _, _) = request_in_status(TransferStatus::Draft);
        assert!(draft.can_be_deleted());

        for status in [
            TransferStatus::Pending,
            TransferStatus::SourceApproved,
            TransferStatus::Approved,
            TransferStatus::Completed,
        ] {
            let (request, _, _) = request_in_status(status);
            assert!(!request.can_be_deleted());
        }
    }

    #[test]
    fn completion_context_carries_both_tenants_and_the_effective_date() {
        let (request, source, target) = request_in_status(TransferStatus::Approved);

        let ctx = request.completion_context().unwrap();
        assert_eq!(ctx.source_tenant_id, source);
        assert_eq!(ctx.target_tenant_id, target);
        assert_eq!(ctx.transfer_date, test_date());

        let empty = TransferRequest::empty(test_request_id());
        assert!(empty.completion_context().is_err());
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let (request, source, _) = request_in_status(TransferStatus::Pending);
        let version_before = request.version();
        let status_before = request.status();

        let cmd = TransferCommand::ApproveSource(ApproveSource {
            tenant_id: source,
            request_id: request.id_typed(),
            approver_id: UserId::new(),
            approver_name: "Source Approver".to_string(),
            occurred_at: test_time(),
        });

        let events1 = request.handle(&cmd).unwrap();
        let events2 = request.handle(&cmd).unwrap();

        assert_eq!(request.version(), version_before);
        assert_eq!(request.status(), status_before);
        assert_eq!(events1, events2);
    }

    #[test]
    fn version_increments_on_apply() {
        let (request, _, _) = request_in_status(TransferStatus::SourceApproved);
        // create + submit + approve_source
        assert_eq!(request.version(), 3);
    }

    #[test]
    fn apply_is_deterministic() {
        let source = test_tenant_id();
        let target = test_tenant_id();
        let request_id = test_request_id();
        let employee_id = test_employee_id();
        let at = test_time();

        let created = TransferEvent::TransferRequestCreated(TransferRequestCreated {
            tenant_id: source,
            request_id,
            employee_id,
            target_tenant_id: target,
            target_department_id: None,
            target_position_id: None,
            target_grade_id: None,
            transfer_date: test_date(),
            reason: None,
            occurred_at: at,
        });
        let submitted = TransferEvent::TransferRequestSubmitted(TransferRequestSubmitted {
            tenant_id: source,
            request_id,
            occurred_at: at,
        });

        let mut a = TransferRequest::empty(request_id);
        a.apply(&created);
        a.apply(&submitted);

        let mut b = TransferRequest::empty(request_id);
        b.apply(&created);
        b.apply(&submitted);

        assert_eq!(a, b);
        assert_eq!(a.status(), TransferStatus::Pending);
    }
}
