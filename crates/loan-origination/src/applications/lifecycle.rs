//! Status state machine for loan applications.
//!
//! Forward progress is one step at a time. Every non-terminal status may also fall back to
//! `PendingDocuments` or be closed as `Rejected`/`Cancelled`. Terminal statuses have no edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Actor, ActorRole, ApplicationId, LoanApplication, LoanStatus};

/// Statuses reachable from `from` in one transition.
pub fn allowed_transitions(from: LoanStatus) -> &'static [LoanStatus] {
    use LoanStatus::*;

    match from {
        InReview => &[PendingDocuments, InEvaluation, Rejected, Cancelled],
        PendingDocuments => &[InReview, Rejected, Cancelled],
        InEvaluation => &[PreApproved, PendingDocuments, Rejected, Cancelled],
        PreApproved => &[FinalApproval, PendingDocuments, Rejected, Cancelled],
        FinalApproval => &[Approved, PendingDocuments, Rejected, Cancelled],
        Approved => &[InDisbursement, PendingDocuments, Rejected, Cancelled],
        InDisbursement | Rejected | Cancelled => &[],
    }
}

pub fn can_transition(from: LoanStatus, to: LoanStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Applicants may withdraw their own application or hand it back for review after
/// supplying documents. Every other move is staff work.
pub fn may_trigger(actor: &Actor, application: &LoanApplication, to: LoanStatus) -> bool {
    match actor.role {
        ActorRole::Executive => true,
        ActorRole::Applicant => {
            actor.owns(application)
                && (to == LoanStatus::Cancelled
                    || (application.status == LoanStatus::PendingDocuments
                        && to == LoanStatus::InReview))
        }
    }
}

/// Moves `application` to `to`, stamping `updated_at`. Leaves the application untouched on error.
pub fn transition(
    application: &mut LoanApplication,
    to: LoanStatus,
    actor: &Actor,
    at: DateTime<Utc>,
) -> Result<StatusChanged, LifecycleError> {
    let from = application.status;

    if !can_transition(from, to) {
        return Err(LifecycleError::InvalidTransition { from, to });
    }

    if !may_trigger(actor, application, to) {
        return Err(LifecycleError::NotPermitted {
            actor: actor.id.clone(),
            role: actor.role,
            from,
            to,
        });
    }

    application.status = to;
    application.updated_at = at;

    Ok(StatusChanged {
        application_id: application.id.clone(),
        from,
        to,
        actor: actor.clone(),
        at,
    })
}

/// Event emitted after a committed status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChanged {
    pub application_id: ApplicationId,
    pub from: LoanStatus,
    pub to: LoanStatus,
    pub actor: Actor,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot move application from {from} to {to}")]
    InvalidTransition { from: LoanStatus, to: LoanStatus },
    #[error("{role} '{actor}' may not move application from {from} to {to}")]
    NotPermitted {
        actor: String,
        role: ActorRole,
        from: LoanStatus,
        to: LoanStatus,
    },
}
