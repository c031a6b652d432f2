// Resubmission lifecycle controller
//
// PendingResubmission -> Resubmitted -> ReceivedByConsultant -> UnderReReview
//     -> {Approved | RejectedAgain}
//
// Only reachable while the parent is Rejected with an active case.

use chrono::NaiveDate;

use super::commands::{
    Corrections, LifecycleCommand, ReReviewDecision, ReReviewOutcome, TransitionName,
};
use super::errors::{GuardFailure, LifecycleError, RequiredArtifact};
use super::state_machine::TransitionDraft;
use super::types::{
    Actor, FinalResult, LifecycleState, MissingItems, ResubmissionCase, ResubmissionStatus,
    StateChange, SubmissionStatus,
};

pub(crate) fn apply(
    draft: &mut TransitionDraft<'_>,
    command: &LifecycleCommand,
) -> Result<(), LifecycleError> {
    let name = command.name();
    let Some(case_status) = draft.submission.active_case().map(|case| case.status) else {
        return Err(LifecycleError::invalid(name, draft.submission.position()));
    };

    match (case_status, command) {
        (
            ResubmissionStatus::PendingResubmission,
            LifecycleCommand::SubmitCorrections(corrections),
        ) => submit_corrections(draft, corrections),
        (ResubmissionStatus::Resubmitted, LifecycleCommand::ReceiveResubmission) => {
            advance_case(draft, ResubmissionStatus::ReceivedByConsultant);
            Ok(())
        }
        (ResubmissionStatus::ReceivedByConsultant, LifecycleCommand::StartReReview) => {
            advance_case(draft, ResubmissionStatus::UnderReReview);
            Ok(())
        }
        (ResubmissionStatus::UnderReReview, LifecycleCommand::Decide(decision)) => {
            decide(draft, decision)
        }
        _ => Err(LifecycleError::invalid(name, draft.submission.position())),
    }
}

/// Open the next case at `PendingResubmission`, or escalate when the round cap
/// would be exceeded. The parent must already be `Rejected`.
pub(crate) fn open_case(
    draft: &mut TransitionDraft<'_>,
    missing: MissingItems,
    deadline: Option<NaiveDate>,
    actor: &Actor,
) {
    let number = draft.submission.next_case_number();
    if let Some(max) = draft.ctx.policy.max_resubmission_rounds {
        if number > max {
            tracing::warn!(
                key = %draft.submission.key(),
                rounds = number - 1,
                max_rounds = max,
                "Resubmission round cap reached, escalating"
            );
            draft.set_status_as(SubmissionStatus::EscalationRequired, &Actor::system());
            return;
        }
    }

    let now = draft.now();
    draft
        .submission
        .resubmissions
        .push(ResubmissionCase::open(number, missing, deadline, now));
    draft.record_change(StateChange {
        from: None,
        to: LifecycleState::Resubmission {
            number,
            status: ResubmissionStatus::PendingResubmission,
        },
        actor: actor.clone(),
        at: now,
    });
    tracing::info!(
        key = %draft.submission.key(),
        resubmission = number,
        missing = ?missing,
        deadline = ?deadline,
        "Resubmission case opened"
    );
}

/// Artifacts the case requires that `corrections` does not supply.
pub fn missing_artifacts(
    missing: &MissingItems,
    corrections: &Corrections,
) -> Vec<RequiredArtifact> {
    fn supplied(reference: &Option<String>) -> bool {
        reference.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    [
        (
            missing.inventor_details,
            &corrections.updated_contact_ref,
            RequiredArtifact::UpdatedContact,
        ),
        (
            missing.design_views,
            &corrections.updated_design_ref,
            RequiredArtifact::UpdatedDesign,
        ),
        (
            missing.description,
            &corrections.updated_form_ref,
            RequiredArtifact::UpdatedForm,
        ),
    ]
    .into_iter()
    .filter(|(required, reference, _)| *required && !supplied(reference))
    .map(|(_, _, artifact)| artifact)
    .collect()
}

fn submit_corrections(
    draft: &mut TransitionDraft<'_>,
    corrections: &Corrections,
) -> Result<(), LifecycleError> {
    let missing = match draft.submission.active_case() {
        Some(case) => case.missing,
        None => {
            return Err(LifecycleError::invalid(
                TransitionName::SubmitCorrections,
                draft.submission.position(),
            ))
        }
    };

    let absent = missing_artifacts(&missing, corrections);
    if !absent.is_empty() {
        return Err(LifecycleError::guard(
            TransitionName::SubmitCorrections,
            GuardFailure::MissingArtifacts { artifacts: absent },
        ));
    }
    let remarks = corrections.applicant_remarks.trim();
    if remarks.is_empty() {
        return Err(LifecycleError::guard(
            TransitionName::SubmitCorrections,
            GuardFailure::EmptyApplicantRemarks,
        ));
    }

    let now = draft.now();
    if let Some(case) = draft.submission.active_case_mut() {
        case.updated_contact_ref = corrections.updated_contact_ref.clone();
        case.updated_design_ref = corrections.updated_design_ref.clone();
        case.updated_form_ref = corrections.updated_form_ref.clone();
        case.applicant_remarks = Some(remarks.to_string());
        case.resubmitted_at = Some(now);
    }
    advance_case(draft, ResubmissionStatus::Resubmitted);
    Ok(())
}

fn decide(
    draft: &mut TransitionDraft<'_>,
    decision: &ReReviewDecision,
) -> Result<(), LifecycleError> {
    let remarks = decision.consultant_remarks.trim();
    if remarks.is_empty() {
        return Err(LifecycleError::guard(
            TransitionName::Decide,
            GuardFailure::EmptyConsultantRemarks,
        ));
    }

    let now = draft.now();
    if let Some(case) = draft.submission.active_case_mut() {
        case.consultant_remarks = Some(remarks.to_string());
        case.decided_at = Some(now);
    }

    let consultant = draft.ctx.actor.clone();
    let system = Actor::system();
    match decision.outcome {
        ReReviewOutcome::Approved => {
            advance_case(draft, ResubmissionStatus::Approved);
            draft.set_status_as(SubmissionStatus::ApprovedForFiling, &consultant);
            draft.finalize_as(FinalResult::Approved, &system);
        }
        ReReviewOutcome::RejectedAgain => {
            advance_case(draft, ResubmissionStatus::RejectedAgain);
            draft.submission.rejection_reason = Some(remarks.to_string());
            if decision.missing.any() {
                open_case(draft, decision.missing, decision.deadline, &consultant);
            } else {
                draft.finalize_as(FinalResult::Rejected, &system);
            }
        }
    }
    Ok(())
}

fn advance_case(draft: &mut TransitionDraft<'_>, to: ResubmissionStatus) {
    let now = draft.now();
    let actor = draft.ctx.actor.clone();
    let Some(case) = draft.submission.active_case_mut() else {
        return;
    };
    let from = case.status;
    let number = case.number;
    case.status = to;
    draft.record_change(StateChange {
        from: Some(LifecycleState::Resubmission { number, status: from }),
        to: LifecycleState::Resubmission { number, status: to },
        actor,
        at: now,
    });
}
