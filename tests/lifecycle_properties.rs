// Property-Based Testing for the submission lifecycle
// Random command sequences from random actors must never break the record's invariants

use chrono::NaiveDate;
use ip_portal::lifecycle::{
    Actor, Corrections, ErrorKind, IpType, LifecycleCommand, LifecycleService, MissingItems,
    ReReviewDecision, ReReviewOutcome, RejectionDecision, Submission, SubmissionDraft,
    SubmissionId, SubmissionStatus, Triage, TriageUpdate,
};
use ip_portal::store::InMemorySubmissionStore;
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::sync::Arc;

const IP: IpType = IpType::UtilityModel;
const OWNER: &str = "ines";

#[derive(Debug, Clone, Copy, Arbitrary)]
enum ActorPick {
    Owner,
    OtherInventor,
    Consultant,
    Admin,
}

impl ActorPick {
    fn actor(self) -> Actor {
        match self {
            ActorPick::Owner => Actor::inventor(OWNER),
            ActorPick::OtherInventor => Actor::inventor("mallory"),
            ActorPick::Consultant => Actor::consultant("carl"),
            ActorPick::Admin => Actor::admin("ada"),
        }
    }
}

#[derive(Debug, Clone, Copy, Arbitrary)]
struct Flags {
    inventor_details: bool,
    design_views: bool,
    description: bool,
}

impl Flags {
    fn missing(self) -> MissingItems {
        MissingItems {
            inventor_details: self.inventor_details,
            design_views: self.design_views,
            description: self.description,
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Step {
    Receive,
    Triage(Option<bool>, Option<bool>, Option<bool>),
    Approve,
    Reject {
        #[proptest(strategy = "remark_strategy()")]
        reason: String,
        missing: Flags,
    },
    Finalize,
    Resubmit {
        supplied: Flags,
        #[proptest(strategy = "remark_strategy()")]
        remarks: String,
    },
    ReceiveResubmission,
    StartReReview,
    Decide {
        approve: bool,
        #[proptest(strategy = "remark_strategy()")]
        remarks: String,
        missing: Flags,
    },
}

impl Step {
    fn command(&self) -> LifecycleCommand {
        match self {
            Step::Receive => LifecycleCommand::Receive,
            Step::Triage(inventor_identified, design_views_complete, description_clear) => {
                LifecycleCommand::UpdateTriage(TriageUpdate {
                    inventor_identified: *inventor_identified,
                    design_views_complete: *design_views_complete,
                    description_clear: *description_clear,
                })
            }
            Step::Approve => LifecycleCommand::Approve,
            Step::Reject { reason, missing } => LifecycleCommand::Reject(RejectionDecision {
                reason: reason.clone(),
                missing: missing.missing(),
                deadline: None,
            }),
            Step::Finalize => LifecycleCommand::Finalize,
            Step::Resubmit { supplied, remarks } => {
                let reference = |on: bool, name: &str| on.then(|| format!("uploads/{name}"));
                LifecycleCommand::SubmitCorrections(Corrections {
                    updated_contact_ref: reference(supplied.inventor_details, "contact.pdf"),
                    updated_design_ref: reference(supplied.design_views, "views.png"),
                    updated_form_ref: reference(supplied.description, "form.pdf"),
                    applicant_remarks: remarks.clone(),
                })
            }
            Step::ReceiveResubmission => LifecycleCommand::ReceiveResubmission,
            Step::StartReReview => LifecycleCommand::StartReReview,
            Step::Decide {
                approve,
                remarks,
                missing,
            } => LifecycleCommand::Decide(ReReviewDecision {
                outcome: if *approve {
                    ReReviewOutcome::Approved
                } else {
                    ReReviewOutcome::RejectedAgain
                },
                consultant_remarks: remarks.clone(),
                missing: missing.missing(),
                deadline: None,
            }),
        }
    }
}

// Blank and whitespace-only text shows up often enough to exercise the guards
fn remark_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        "[a-z]{1,12}( [a-z]{1,12}){0,3}",
    ]
}

fn draft() -> SubmissionDraft {
    SubmissionDraft {
        ip_type: IP,
        title: "Self-cleaning filter".to_string(),
        description: "Filter that backflushes on a timer".to_string(),
        delivery_unit: "R&D".to_string(),
        filing_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        official_form_ref: Some("forms/filter.pdf".to_string()),
        design_representation_ref: None,
    }
}

fn check_record(submission: &Submission) -> Result<(), TestCaseError> {
    // Rejection reason is never blank on entry into Rejected.
    for change in &submission.status_history {
        if change.to == SubmissionStatus::Rejected {
            let reason = change.reason.as_deref().unwrap_or_default();
            prop_assert!(!reason.trim().is_empty(), "blank reason in {:?}", change);
        }
    }
    if submission.status == SubmissionStatus::Rejected {
        let reason = submission.rejection_reason.as_deref().unwrap_or_default();
        prop_assert!(!reason.trim().is_empty());
    }

    // History forms a chain ending in the current status.
    let history = &submission.status_history;
    prop_assert_eq!(history[0].from, None);
    for pair in history.windows(2) {
        prop_assert_eq!(pair[1].from, Some(pair[0].to));
    }
    prop_assert_eq!(history.last().map(|c| c.to), Some(submission.status));

    // Finalization exists exactly when finalized.
    prop_assert_eq!(
        submission.finalization.is_some(),
        submission.status == SubmissionStatus::Finalized
    );

    // Cases are numbered 1..=n and only the newest may still be active.
    for (index, case) in submission.resubmissions.iter().enumerate() {
        prop_assert_eq!(case.number as usize, index + 1);
        if index + 1 < submission.resubmissions.len() {
            prop_assert!(!case.is_active());
        }
    }
    if submission.active_case().is_some() {
        prop_assert_eq!(submission.status, SubmissionStatus::Rejected);
    }
    Ok(())
}

async fn replay(steps: &[(ActorPick, Step)]) -> Result<(), TestCaseError> {
    let service = LifecycleService::new(Arc::new(InMemorySubmissionStore::new()));
    let id: SubmissionId = service
        .file(&Actor::inventor(OWNER), draft())
        .await
        .map_err(|e| TestCaseError::fail(e.to_string()))?
        .submission
        .id;

    let mut committed = 0u64;
    for (pick, step) in steps {
        let before = service.get(IP, &id).await.unwrap().submission;
        match service.execute(IP, &id, &pick.actor(), step.command()).await {
            Ok(view) => {
                committed += 1;
                prop_assert_eq!(view.submission.revision, committed);
                check_record(&view.submission)?;
            }
            Err(e) => {
                prop_assert_ne!(e.kind(), ErrorKind::Conflict);
                prop_assert_ne!(e.kind(), ErrorKind::Storage);
                let after = service.get(IP, &id).await.unwrap().submission;
                prop_assert_eq!(&before, &after, "refused {:?} changed the record", step);
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invariants_hold_for_any_command_sequence(
        steps in prop::collection::vec(any::<(ActorPick, Step)>(), 1..40)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(replay(&steps))?;
    }

    #[test]
    fn prop_incomplete_triage_blocks_approval(
        inventor_identified in any::<bool>(),
        design_views_complete in any::<bool>(),
        description_clear in any::<bool>(),
    ) {
        let triage = Triage { inventor_identified, design_views_complete, description_clear };
        prop_assume!(triage != Triage::all_checked());

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let service = LifecycleService::new(Arc::new(InMemorySubmissionStore::new()));
            let consultant = Actor::consultant("carl");
            let id = service.file(&Actor::inventor(OWNER), draft()).await.unwrap().submission.id;
            service.execute(IP, &id, &consultant, LifecycleCommand::Receive).await.unwrap();
            service
                .execute(IP, &id, &consultant, LifecycleCommand::UpdateTriage(triage.into()))
                .await
                .unwrap();

            let err = service
                .execute(IP, &id, &consultant, LifecycleCommand::Approve)
                .await
                .unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::GuardViolation);

            let view = service.get(IP, &id).await.unwrap();
            prop_assert_eq!(view.submission.status, SubmissionStatus::UnderReview);
            prop_assert!(!view.ready_for_review);
            Ok(())
        })?;
    }
}
