// Primary lifecycle controller
//
// New -> UnderReview -> {ApprovedForFiling | Rejected} -> Finalized

use super::commands::{LifecycleCommand, RejectionDecision, TransitionName};
use super::errors::{GuardFailure, LifecycleError};
use super::resubmission;
use super::state_machine::TransitionDraft;
use super::triage::{is_triage_complete, unchecked_items};
use super::types::{Actor, FinalResult, SubmissionStatus, TriageUpdate};

pub(crate) fn apply(
    draft: &mut TransitionDraft<'_>,
    command: &LifecycleCommand,
) -> Result<(), LifecycleError> {
    let name = command.name();
    let status = draft.submission.status;

    match (status, command) {
        (SubmissionStatus::New, LifecycleCommand::Receive) => {
            draft.set_status(SubmissionStatus::UnderReview);
            tracing::info!(key = %draft.submission.key(), "Submission received for review");
            Ok(())
        }
        (SubmissionStatus::UnderReview, LifecycleCommand::UpdateTriage(update)) => {
            update_triage(draft, update);
            Ok(())
        }
        (SubmissionStatus::UnderReview, LifecycleCommand::Approve) => approve(draft),
        (SubmissionStatus::UnderReview, LifecycleCommand::Reject(decision)) => {
            reject(draft, decision)
        }
        (SubmissionStatus::ApprovedForFiling, LifecycleCommand::Finalize) => {
            let actor = draft.ctx.actor.clone();
            draft.finalize_as(FinalResult::Approved, &actor);
            Ok(())
        }
        (SubmissionStatus::Rejected, LifecycleCommand::Finalize) => {
            if let Some(case) = draft.submission.active_case() {
                return Err(LifecycleError::guard(
                    name,
                    GuardFailure::ResubmissionOpen {
                        number: case.number,
                    },
                ));
            }
            let actor = draft.ctx.actor.clone();
            draft.finalize_as(FinalResult::Rejected, &actor);
            Ok(())
        }
        _ => Err(LifecycleError::invalid(name, draft.submission.position())),
    }
}

fn update_triage(draft: &mut TransitionDraft<'_>, update: &TriageUpdate) {
    update.apply_to(&mut draft.submission.triage);
    draft.record_in_place();
    tracing::debug!(
        key = %draft.submission.key(),
        triage = ?draft.submission.triage,
        ready = draft.submission.is_ready_for_review(),
        "Triage checklist updated"
    );
}

fn approve(draft: &mut TransitionDraft<'_>) -> Result<(), LifecycleError> {
    let triage = draft.submission.triage;
    if !is_triage_complete(&triage) {
        return Err(LifecycleError::guard(
            TransitionName::Approve,
            GuardFailure::TriageIncomplete {
                unchecked: unchecked_items(&triage),
            },
        ));
    }
    draft.set_status(SubmissionStatus::ApprovedForFiling);
    Ok(())
}

fn reject(
    draft: &mut TransitionDraft<'_>,
    decision: &RejectionDecision,
) -> Result<(), LifecycleError> {
    let reason = decision.reason.trim();
    if reason.is_empty() {
        return Err(LifecycleError::guard(
            TransitionName::Reject,
            GuardFailure::EmptyRejectionReason,
        ));
    }
    draft.submission.rejection_reason = Some(reason.to_string());
    draft.set_status(SubmissionStatus::Rejected);

    if decision.missing.any() {
        let consultant: Actor = draft.ctx.actor.clone();
        resubmission::open_case(draft, decision.missing, decision.deadline, &consultant);
    }
    Ok(())
}
