//! Inter-company transfer orchestration.
//!
//! Simple transitions (create/submit/approve/reject/cancel) go straight
//! through the command dispatcher. `complete` is the one operation with
//! cross-tenant side effects; it claims the request first (`Approved →
//! Completing`), then walks the two directories and the two history ledgers
//! with every tenant id passed explicitly, and only then closes the request.
//!
//! Failure handling is asymmetric:
//! - before anything irreversible happened, the claim is aborted back to
//!   `Approved` and the underlying error surfaces;
//! - after the mirror's hire history or the source resignation was written,
//!   a failure leaves a person potentially active in two tenants. That is an
//!   integrity hazard: logged at error level, surfaced to the caller, and the
//!   request stays in `Completing` for the reconciliation sweep.

use chrono::Utc;
use serde_json::Value as JsonValue;
use thiserror::Error;

use peopleforge_core::{AggregateId, TenantId, UserId};
use peopleforge_employee::{
    DirectoryError, Employee, EmployeeDirectory, EmployeeId, HistoryRecorder,
};
use peopleforge_events::{EventBus, EventEnvelope};
use peopleforge_numbering::EmployeeNumberGenerator;
use peopleforge_transfer::{
    AbortCompletion, ApproveSource, ApproveTarget, BeginCompletion, CancelTransfer,
    CompletionContext, CreateTransferRequest, FinishCompletion, RejectTransfer,
    SubmitTransferRequest, TransferCommand, TransferCompletedFact, TransferRequest,
    TransferRequestId, UpdateTransferRequest,
};

use crate::dispatcher::{apply_history, CommandDispatcher, DispatchError};
use crate::event_store::{EventStore, EventStoreError};
use crate::retry::{retry_read, RetryPolicy};

const AGGREGATE_TYPE: &str = "transfer.request";

/// Workflow-surface error taxonomy.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transfer request not found")]
    NotFound,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// Lost a race against a concurrent transition on the same request.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Transient infrastructure failure; the operation was aborted cleanly
    /// and can be retried.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// The cross-tenant unit of work could not be confirmed complete and
    /// could not be compensated. One person may be active in two tenants.
    #[error("integrity hazard on transfer request {request_id}: {detail}")]
    IntegrityHazard {
        request_id: TransferRequestId,
        detail: String,
    },

    #[error("storage error: {0}")]
    Store(String),
}

impl From<DispatchError> for TransferError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::Concurrency(msg) => TransferError::Conflict(msg),
            DispatchError::TenantIsolation(msg) => TransferError::Store(msg),
            DispatchError::Validation(msg) => TransferError::Validation(msg),
            DispatchError::InvalidState(msg) => TransferError::InvalidState(msg),
            DispatchError::NotFound => TransferError::NotFound,
            DispatchError::Deserialize(msg) => TransferError::Store(msg),
            DispatchError::Store(e) => TransferError::Store(e.to_string()),
            DispatchError::Publish(msg) => TransferError::Store(msg),
        }
    }
}

impl From<EventStoreError> for TransferError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => TransferError::Conflict(msg),
            other => TransferError::Store(other.to_string()),
        }
    }
}

/// Fields for a new transfer request.
#[derive(Debug, Clone)]
pub struct NewTransferRequest {
    pub employee_id: EmployeeId,
    pub target_tenant_id: TenantId,
    pub target_department_id: Option<peopleforge_core::DepartmentId>,
    pub target_position_id: Option<peopleforge_core::PositionId>,
    pub target_grade_id: Option<peopleforge_core::GradeId>,
    pub transfer_date: chrono::NaiveDate,
    pub reason: Option<String>,
}

/// Partial update for a draft request; `None` fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct TransferRequestChanges {
    pub target_department_id: Option<peopleforge_core::DepartmentId>,
    pub target_position_id: Option<peopleforge_core::PositionId>,
    pub target_grade_id: Option<peopleforge_core::GradeId>,
    pub transfer_date: Option<chrono::NaiveDate>,
    pub reason: Option<String>,
}

/// Application service driving the transfer request lifecycle.
pub struct TransferService<S, B, D, H, G, N> {
    store: S,
    dispatcher: CommandDispatcher<S, B>,
    directory: D,
    history: H,
    numbers: G,
    notifier: N,
    retry: RetryPolicy,
}

impl<S, B, D, H, G, N> TransferService<S, B, D, H, G, N>
where
    S: EventStore + Clone,
    B: EventBus<EventEnvelope<JsonValue>>,
    D: EmployeeDirectory,
    H: HistoryRecorder,
    G: EmployeeNumberGenerator,
    N: EventBus<TransferCompletedFact>,
{
    pub fn new(store: S, bus: B, directory: D, history: H, numbers: G, notifier: N) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store.clone(), bus),
            store,
            directory,
            history,
            numbers,
            notifier,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn create(
        &self,
        source_tenant: TenantId,
        request_id: TransferRequestId,
        request: NewTransferRequest,
    ) -> Result<TransferRequest, TransferError> {
        let created = self.dispatch(
            source_tenant,
            request_id,
            TransferCommand::CreateTransferRequest(CreateTransferRequest {
                tenant_id: source_tenant,
                request_id,
                employee_id: request.employee_id,
                target_tenant_id: request.target_tenant_id,
                target_department_id: request.target_department_id,
                target_position_id: request.target_position_id,
                target_grade_id: request.target_grade_id,
                transfer_date: request.transfer_date,
                reason: request.reason,
                occurred_at: Utc::now(),
            }),
        )?;

        tracing::info!(
            request_id = %request_id,
            employee_id = %request.employee_id,
            target_tenant = %request.target_tenant_id,
            "transfer request created"
        );
        Ok(created)
    }

    pub fn update(
        &self,
        source_tenant: TenantId,
        request_id: TransferRequestId,
        changes: TransferRequestChanges,
    ) -> Result<TransferRequest, TransferError> {
        self.dispatch(
            source_tenant,
            request_id,
            TransferCommand::UpdateTransferRequest(UpdateTransferRequest {
                tenant_id: source_tenant,
                request_id,
                target_department_id: changes.target_department_id,
                target_position_id: changes.target_position_id,
                target_grade_id: changes.target_grade_id,
                transfer_date: changes.transfer_date,
                reason: changes.reason,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn submit(
        &self,
        source_tenant: TenantId,
        request_id: TransferRequestId,
    ) -> Result<TransferRequest, TransferError> {
        let submitted = self.dispatch(
            source_tenant,
            request_id,
            TransferCommand::SubmitTransferRequest(SubmitTransferRequest {
                tenant_id: source_tenant,
                request_id,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(request_id = %request_id, "transfer request submitted");
        Ok(submitted)
    }

    /// Hard-delete a request that never left its draft phase.
    pub fn delete(
        &self,
        source_tenant: TenantId,
        request_id: TransferRequestId,
    ) -> Result<(), TransferError> {
        let request = self.get(source_tenant, request_id)?;
        if !request.can_be_deleted() {
            return Err(TransferError::InvalidState(
                "only draft requests can be deleted".to_string(),
            ));
        }

        self.store.purge_stream(source_tenant, request_id.0)?;
        tracing::info!(request_id = %request_id, "transfer request deleted");
        Ok(())
    }

    pub fn approve_source(
        &self,
        source_tenant: TenantId,
        request_id: TransferRequestId,
        approver_id: UserId,
        approver_name: impl Into<String>,
    ) -> Result<TransferRequest, TransferError> {
        let approved = self.dispatch(
            source_tenant,
            request_id,
            TransferCommand::ApproveSource(ApproveSource {
                tenant_id: source_tenant,
                request_id,
                approver_id,
                approver_name: approver_name.into(),
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(request_id = %request_id, approver_id = %approver_id, "transfer source approved");
        Ok(approved)
    }

    pub fn approve_target(
        &self,
        source_tenant: TenantId,
        request_id: TransferRequestId,
        approving_tenant: TenantId,
        approver_id: UserId,
        approver_name: impl Into<String>,
    ) -> Result<TransferRequest, TransferError> {
        let approved = self.dispatch(
            source_tenant,
            request_id,
            TransferCommand::ApproveTarget(ApproveTarget {
                tenant_id: source_tenant,
                request_id,
                approving_tenant_id: approving_tenant,
                approver_id,
                approver_name: approver_name.into(),
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(request_id = %request_id, approver_id = %approver_id, "transfer target approved");
        Ok(approved)
    }

    pub fn reject(
        &self,
        source_tenant: TenantId,
        request_id: TransferRequestId,
        reason: impl Into<String>,
    ) -> Result<TransferRequest, TransferError> {
        let reason = reason.into();
        let rejected = self.dispatch(
            source_tenant,
            request_id,
            TransferCommand::RejectTransfer(RejectTransfer {
                tenant_id: source_tenant,
                request_id,
                reason: reason.clone(),
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(request_id = %request_id, reason = %reason, "transfer request rejected");
        Ok(rejected)
    }

    pub fn cancel(
        &self,
        source_tenant: TenantId,
        request_id: TransferRequestId,
        reason: Option<String>,
    ) -> Result<TransferRequest, TransferError> {
        let cancelled = self.dispatch(
            source_tenant,
            request_id,
            TransferCommand::CancelTransfer(CancelTransfer {
                tenant_id: source_tenant,
                request_id,
                reason,
                occurred_at: Utc::now(),
            }),
        )?;
        tracing::info!(request_id = %request_id, "transfer request cancelled");
        Ok(cancelled)
    }

    pub fn get(
        &self,
        source_tenant: TenantId,
        request_id: TransferRequestId,
    ) -> Result<TransferRequest, TransferError> {
        let history = self.store.load_stream(source_tenant, request_id.0)?;
        if history.is_empty() {
            return Err(TransferError::NotFound);
        }

        let mut request = TransferRequest::empty(request_id);
        apply_history::<TransferRequest>(&mut request, &history).map_err(TransferError::from)?;
        Ok(request)
    }

    /// Run the cross-tenant completion protocol.
    ///
    /// Legal only from `Approved`. Claims the request, mirrors the employee
    /// into the target tenant under a freshly allocated number, resigns the
    /// source employee, records history on both sides, closes the request and
    /// publishes the completed fact (best-effort).
    pub fn complete(
        &self,
        source_tenant: TenantId,
        request_id: TransferRequestId,
    ) -> Result<TransferRequest, TransferError> {
        // Claim: the linearization point. A racing reject/cancel/complete on
        // the same request makes this dispatch fail and nothing has happened.
        let claimed = self.dispatch(
            source_tenant,
            request_id,
            TransferCommand::BeginCompletion(BeginCompletion {
                tenant_id: source_tenant,
                request_id,
                occurred_at: Utc::now(),
            }),
        )?;

        let ctx = match claimed.completion_context() {
            Ok(ctx) => ctx,
            Err(e) => {
                self.abort(source_tenant, request_id, "request incomplete");
                return Err(TransferError::InvalidState(e.to_string()));
            }
        };

        let source_employee = match retry_read(&self.retry, "load source employee", || {
            self.directory.find_by_id(source_tenant, ctx.employee_id)
        }) {
            Ok(employee) => employee,
            Err(DirectoryError::NotFound) => {
                self.abort(source_tenant, request_id, "source employee not found");
                return Err(TransferError::NotFound);
            }
            Err(DirectoryError::Unavailable(msg)) => {
                self.abort(source_tenant, request_id, "employee directory unavailable");
                return Err(TransferError::DependencyUnavailable(msg));
            }
        };

        if !source_employee.is_active() {
            self.abort(source_tenant, request_id, "source employee already resigned");
            return Err(TransferError::InvalidState(
                "source employee is already resigned".to_string(),
            ));
        }

        // The mirror's id is derived from the request id: this is the
        // idempotency key, so a retry resumes instead of duplicating.
        let mirror_id = EmployeeId::new(request_id.0);
        let mirror = match self.mirror_employee(request_id, &ctx, &source_employee, mirror_id) {
            Ok(employee) => employee,
            Err(e) => return Err(e),
        };

        // Hire history in the target tenant. Still compensable: the mirror
        // can be removed and the claim released.
        if let Err(e) = self.history.record_hire(
            ctx.target_tenant_id,
            &mirror,
            &format!("inter-company transfer in from tenant {source_tenant}"),
        ) {
            return match self.directory.remove(ctx.target_tenant_id, mirror_id) {
                Ok(()) => {
                    self.abort(source_tenant, request_id, "target hire history write failed");
                    Err(TransferError::DependencyUnavailable(e.to_string()))
                }
                Err(remove_err) => Err(self.integrity_hazard(
                    request_id,
                    format!(
                        "hire history write failed ({e}) and mirror removal failed ({remove_err})"
                    ),
                )),
            };
        }

        // Past this point partial state spans both tenants; failures are
        // hazards, not retries.
        let mut resigned = source_employee.clone();
        if let Err(e) = resigned.resign(ctx.transfer_date) {
            return Err(self.integrity_hazard(
                request_id,
                format!("source employee could not be resigned: {e}"),
            ));
        }
        if let Err(e) = self.directory.save(source_tenant, resigned.clone()) {
            return Err(self.integrity_hazard(
                request_id,
                format!("source resignation could not be saved: {e}"),
            ));
        }

        if let Err(e) = self.history.record_resign(
            source_tenant,
            &resigned,
            &format!("inter-company transfer out to tenant {}", ctx.target_tenant_id),
        ) {
            return Err(self.integrity_hazard(
                request_id,
                format!("source resign history write failed: {e}"),
            ));
        }

        let completed = match self.dispatch(
            source_tenant,
            request_id,
            TransferCommand::FinishCompletion(FinishCompletion {
                tenant_id: source_tenant,
                request_id,
                target_employee_id: mirror_id,
                target_employee_number: mirror.employee_number().to_string(),
                occurred_at: Utc::now(),
            }),
        ) {
            Ok(request) => request,
            Err(e) => {
                return Err(self.integrity_hazard(
                    request_id,
                    format!("both tenants updated but request could not be closed: {e}"),
                ))
            }
        };

        // Best-effort notification; never unwinds a completed transfer.
        let fact = TransferCompletedFact {
            transfer_request_id: request_id,
            source_employee_id: ctx.employee_id,
            target_employee_id: mirror_id,
            source_tenant_id: source_tenant,
            target_tenant_id: ctx.target_tenant_id,
            occurred_at: Utc::now(),
        };
        if let Err(e) = self.notifier.publish(fact) {
            tracing::warn!(
                request_id = %request_id,
                error = ?e,
                "transfer completed fact could not be published"
            );
        }

        tracing::info!(
            request_id = %request_id,
            source_employee = %ctx.employee_id,
            target_employee = %mirror_id,
            "transfer completed"
        );
        Ok(completed)
    }

    /// Create (or re-find, on retry) the mirrored employee in the target tenant.
    fn mirror_employee(
        &self,
        request_id: TransferRequestId,
        ctx: &CompletionContext,
        source_employee: &Employee,
        mirror_id: EmployeeId,
    ) -> Result<Employee, TransferError> {
        match self.directory.find_by_id(ctx.target_tenant_id, mirror_id) {
            Ok(existing) => {
                tracing::warn!(
                    request_id = %request_id,
                    "mirror employee already present in target tenant, resuming"
                );
                return Ok(existing);
            }
            Err(DirectoryError::NotFound) => {}
            Err(DirectoryError::Unavailable(msg)) => {
                self.abort(ctx.source_tenant_id, request_id, "target directory unavailable");
                return Err(TransferError::DependencyUnavailable(msg));
            }
        }

        let number = match self.numbers.generate(ctx.target_tenant_id, ctx.transfer_date) {
            Ok(number) => number,
            Err(e) => {
                self.abort(ctx.source_tenant_id, request_id, "number allocation failed");
                return Err(TransferError::DependencyUnavailable(e.to_string()));
            }
        };

        let mut mirror = match Employee::hire(
            mirror_id,
            number,
            source_employee.name().to_string(),
            source_employee.employment_type(),
            ctx.transfer_date,
        ) {
            Ok(employee) => employee,
            Err(e) => {
                self.abort(ctx.source_tenant_id, request_id, "mirror employee invalid");
                return Err(TransferError::Validation(e.to_string()));
            }
        };
        mirror.set_contact(
            source_employee.email().map(str::to_owned),
            source_employee.phone().map(str::to_owned),
        );
        mirror.set_assignment(
            ctx.target_department_id.or(source_employee.department_id()),
            ctx.target_position_id
                .map(|p| p.to_string())
                .or_else(|| source_employee.position_code().map(str::to_owned)),
            ctx.target_grade_id
                .map(|g| g.to_string())
                .or_else(|| source_employee.job_title_code().map(str::to_owned)),
        );

        if let Err(e) = self.directory.save(ctx.target_tenant_id, mirror.clone()) {
            self.abort(ctx.source_tenant_id, request_id, "target directory save failed");
            return Err(TransferError::DependencyUnavailable(e.to_string()));
        }

        Ok(mirror)
    }

    fn dispatch(
        &self,
        source_tenant: TenantId,
        request_id: TransferRequestId,
        command: TransferCommand,
    ) -> Result<TransferRequest, TransferError> {
        self.dispatcher
            .dispatch(
                source_tenant,
                request_id.0,
                AGGREGATE_TYPE,
                command,
                |_, id: AggregateId| TransferRequest::empty(TransferRequestId::new(id)),
            )
            .map_err(TransferError::from)?;

        self.get(source_tenant, request_id)
    }

    /// Release a completion claim after a cleanly compensated failure.
    fn abort(&self, source_tenant: TenantId, request_id: TransferRequestId, reason: &str) {
        let result = self.dispatch(
            source_tenant,
            request_id,
            TransferCommand::AbortCompletion(AbortCompletion {
                tenant_id: source_tenant,
                request_id,
                reason: reason.to_string(),
                occurred_at: Utc::now(),
            }),
        );

        match result {
            Ok(_) => tracing::warn!(request_id = %request_id, reason, "transfer completion aborted"),
            Err(e) => tracing::error!(
                request_id = %request_id,
                reason,
                error = %e,
                "transfer completion could not be aborted; request stays claimed"
            ),
        }
    }

    fn integrity_hazard(&self, request_id: TransferRequestId, detail: String) -> TransferError {
        tracing::error!(
            request_id = %request_id,
            detail = %detail,
            "cross-tenant transfer completion left inconsistent state"
        );
        TransferError::IntegrityHazard { request_id, detail }
    }
}
