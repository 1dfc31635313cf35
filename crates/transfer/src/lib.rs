//! Inter-company transfer requests (event-sourced).
//!
//! A transfer moves one employee's active record from a source tenant to a
//! target tenant: resign-in-source + hire-in-target, gated by a dual-approval
//! state machine. This crate contains the pure state machine; the
//! cross-tenant completion protocol lives in infrastructure.

pub mod fact;
pub mod request;

pub use fact::TransferCompletedFact;
pub use request::{
    AbortCompletion, ApproveSource, ApproveTarget, Approval, BeginCompletion, CancelTransfer,
    CompletionContext, CreateTransferRequest, FinishCompletion, RejectTransfer,
    SubmitTransferRequest, TransferCancelled, TransferCommand, TransferCompleted,
    TransferCompletionAborted, TransferCompletionStarted, TransferEvent, TransferRejected,
    TransferRequest, TransferRequestCreated, TransferRequestId, TransferRequestSubmitted,
    TransferRequestUpdated, TransferSourceApproved, TransferStatus, TransferTargetApproved,
    UpdateTransferRequest,
};
