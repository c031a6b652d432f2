// Transition commands accepted by the command API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{MissingItems, TriageUpdate};

/// Names every mutation the portal understands, intake included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionName {
    File,
    Receive,
    UpdateTriage,
    Approve,
    Reject,
    Finalize,
    SubmitCorrections,
    ReceiveResubmission,
    StartReReview,
    Decide,
}

impl TransitionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionName::File => "file",
            TransitionName::Receive => "receive",
            TransitionName::UpdateTriage => "update_triage",
            TransitionName::Approve => "approve",
            TransitionName::Reject => "reject",
            TransitionName::Finalize => "finalize",
            TransitionName::SubmitCorrections => "submit_corrections",
            TransitionName::ReceiveResubmission => "receive_resubmission",
            TransitionName::StartReReview => "start_re_review",
            TransitionName::Decide => "decide",
        }
    }

    /// Transitions handled by the nested resubmission machine.
    pub fn is_resubmission(&self) -> bool {
        matches!(
            self,
            TransitionName::SubmitCorrections
                | TransitionName::ReceiveResubmission
                | TransitionName::StartReReview
                | TransitionName::Decide
        )
    }
}

impl fmt::Display for TransitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionDecision {
    pub reason: String,
    #[serde(default)]
    pub missing: MissingItems,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

/// References to re-uploaded artifacts. Uploads finish before this is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corrections {
    #[serde(default)]
    pub updated_contact_ref: Option<String>,
    #[serde(default)]
    pub updated_design_ref: Option<String>,
    #[serde(default)]
    pub updated_form_ref: Option<String>,
    pub applicant_remarks: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReReviewOutcome {
    Approved,
    RejectedAgain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReReviewDecision {
    pub outcome: ReReviewOutcome,
    pub consultant_remarks: String,
    /// Only read for `RejectedAgain`: a non-empty set opens the next case.
    #[serde(default)]
    pub missing: MissingItems,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

impl ReReviewDecision {
    pub fn approve(remarks: impl Into<String>) -> Self {
        Self {
            outcome: ReReviewOutcome::Approved,
            consultant_remarks: remarks.into(),
            missing: MissingItems::default(),
            deadline: None,
        }
    }

    pub fn reject_again(remarks: impl Into<String>, missing: MissingItems) -> Self {
        Self {
            outcome: ReReviewOutcome::RejectedAgain,
            consultant_remarks: remarks.into(),
            missing,
            deadline: None,
        }
    }
}

/// `{transition, payload}` as sent by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", content = "payload", rename_all = "snake_case")]
pub enum LifecycleCommand {
    Receive,
    UpdateTriage(TriageUpdate),
    Approve,
    Reject(RejectionDecision),
    Finalize,
    SubmitCorrections(Corrections),
    ReceiveResubmission,
    StartReReview,
    Decide(ReReviewDecision),
}

impl LifecycleCommand {
    pub fn name(&self) -> TransitionName {
        match self {
            LifecycleCommand::Receive => TransitionName::Receive,
            LifecycleCommand::UpdateTriage(_) => TransitionName::UpdateTriage,
            LifecycleCommand::Approve => TransitionName::Approve,
            LifecycleCommand::Reject(_) => TransitionName::Reject,
            LifecycleCommand::Finalize => TransitionName::Finalize,
            LifecycleCommand::SubmitCorrections(_) => TransitionName::SubmitCorrections,
            LifecycleCommand::ReceiveResubmission => TransitionName::ReceiveResubmission,
            LifecycleCommand::StartReReview => TransitionName::StartReReview,
            LifecycleCommand::Decide(_) => TransitionName::Decide,
        }
    }

    pub fn reject(reason: impl Into<String>, missing: MissingItems) -> Self {
        LifecycleCommand::Reject(RejectionDecision {
            reason: reason.into(),
            missing,
            deadline: None,
        })
    }
}
