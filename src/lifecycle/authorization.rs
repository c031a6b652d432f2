// Authorization gate: (actor, submission, transition) -> allow/deny
//
// Pure. Role checks only; state and guards are the controllers' business.

use super::commands::TransitionName;
use super::errors::LifecycleError;
use super::types::{Actor, Role, Submission};

/// Roles allowed to request `transition` at all.
pub fn permitted_roles(transition: TransitionName) -> &'static [Role] {
    match transition {
        TransitionName::File | TransitionName::SubmitCorrections => &[Role::Inventor],
        TransitionName::Receive
        | TransitionName::UpdateTriage
        | TransitionName::Approve
        | TransitionName::Reject
        | TransitionName::ReceiveResubmission
        | TransitionName::StartReReview
        | TransitionName::Decide => &[Role::Consultant],
        TransitionName::Finalize => &[Role::Admin, Role::System],
    }
}

/// Whether `actor` may request `transition` on `submission`.
///
/// Inventors may only correct their own submissions.
pub fn can_transition(actor: &Actor, submission: &Submission, transition: TransitionName) -> bool {
    if !permitted_roles(transition).contains(&actor.role) {
        return false;
    }
    match actor.role {
        Role::Inventor => actor.user_id == submission.submitter_id,
        Role::Consultant | Role::Admin | Role::System => true,
    }
}

/// Whether `actor` may file a new submission.
pub fn can_file(actor: &Actor) -> bool {
    permitted_roles(TransitionName::File).contains(&actor.role) && !actor.user_id.trim().is_empty()
}

pub fn authorize(
    actor: &Actor,
    submission: &Submission,
    transition: TransitionName,
) -> Result<(), LifecycleError> {
    if can_transition(actor, submission, transition) {
        Ok(())
    } else {
        Err(forbidden(actor, transition))
    }
}

pub fn authorize_filing(actor: &Actor) -> Result<(), LifecycleError> {
    if can_file(actor) {
        Ok(())
    } else {
        Err(forbidden(actor, TransitionName::File))
    }
}

fn forbidden(actor: &Actor, transition: TransitionName) -> LifecycleError {
    tracing::warn!(
        role = %actor.role,
        user_id = %actor.user_id,
        transition = %transition,
        "Transition denied by authorization gate"
    );
    LifecycleError::Forbidden {
        role: actor.role,
        user_id: actor.user_id.clone(),
        transition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::types::{IpType, SubmissionDraft, SubmissionId};
    use chrono::{NaiveDate, Utc};

    fn submission_by(inventor: &str) -> Submission {
        Submission::from_draft(
            SubmissionId::from("id-1"),
            &Actor::inventor(inventor),
            SubmissionDraft {
                ip_type: IpType::IndustrialDesign,
                title: "Folding chair".to_string(),
                description: "A chair that folds".to_string(),
                delivery_unit: "Engineering".to_string(),
                filing_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                official_form_ref: None,
                design_representation_ref: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn inventor_cannot_drive_review_steps() {
        let submission = submission_by("ines");
        let inventor = Actor::inventor("ines");
        for transition in [
            TransitionName::Receive,
            TransitionName::UpdateTriage,
            TransitionName::Approve,
            TransitionName::Reject,
            TransitionName::ReceiveResubmission,
            TransitionName::StartReReview,
            TransitionName::Decide,
            TransitionName::Finalize,
        ] {
            assert!(!can_transition(&inventor, &submission, transition), "{transition}");
        }
    }

    #[test]
    fn only_the_submitter_may_submit_corrections() {
        let submission = submission_by("ines");
        assert!(can_transition(
            &Actor::inventor("ines"),
            &submission,
            TransitionName::SubmitCorrections
        ));
        assert!(!can_transition(
            &Actor::inventor("someone-else"),
            &submission,
            TransitionName::SubmitCorrections
        ));
        assert!(!can_transition(
            &Actor::consultant("carl"),
            &submission,
            TransitionName::SubmitCorrections
        ));
    }

    #[test]
    fn finalize_is_admin_or_system() {
        let submission = submission_by("ines");
        assert!(can_transition(&Actor::admin("ada"), &submission, TransitionName::Finalize));
        assert!(can_transition(&Actor::system(), &submission, TransitionName::Finalize));
        assert!(!can_transition(
            &Actor::consultant("carl"),
            &submission,
            TransitionName::Finalize
        ));
    }

    #[test]
    fn filing_needs_a_named_inventor() {
        assert!(can_file(&Actor::inventor("ines")));
        assert!(!can_file(&Actor::inventor("  ")));
        assert!(!can_file(&Actor::consultant("carl")));
    }
}
