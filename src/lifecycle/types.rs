// Core types for the submission review lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four application categories. Each one is its own id namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpType {
    IndustrialDesign,
    UtilityModel,
    Trademark,
    Copyright,
}

impl IpType {
    pub const ALL: [IpType; 4] = [
        IpType::IndustrialDesign,
        IpType::UtilityModel,
        IpType::Trademark,
        IpType::Copyright,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IpType::IndustrialDesign => "industrial_design",
            IpType::UtilityModel => "utility_model",
            IpType::Trademark => "trademark",
            IpType::Copyright => "copyright",
        }
    }
}

impl fmt::Display for IpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "industrialdesign" | "design" => Ok(IpType::IndustrialDesign),
            "utilitymodel" | "utility" => Ok(IpType::UtilityModel),
            "trademark" => Ok(IpType::Trademark),
            "copyright" => Ok(IpType::Copyright),
            _ => Err(format!(
                "unknown IP type '{s}' (expected industrial_design, utility_model, trademark or copyright)"
            )),
        }
    }
}

/// Opaque submission identifier, unique within its [`IpType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubmissionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SubmissionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Store identity of a submission: `(ip_type, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionKey {
    pub ip_type: IpType,
    pub id: SubmissionId,
}

impl SubmissionKey {
    pub fn new(ip_type: IpType, id: impl Into<SubmissionId>) -> Self {
        Self {
            ip_type,
            id: id.into(),
        }
    }
}

impl fmt::Display for SubmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip_type, self.id)
    }
}

/// Portal roles. `System` is the non-human actor used for automatic finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Inventor,
    Consultant,
    Admin,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Inventor => "inventor",
            Role::Consultant => "consultant",
            Role::Admin => "admin",
            Role::System => "system",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inventor" => Ok(Role::Inventor),
            "consultant" => Ok(Role::Consultant),
            "admin" => Ok(Role::Admin),
            "system" => Ok(Role::System),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Who is asking for a transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub role: Role,
    pub user_id: String,
}

impl Actor {
    pub fn new(role: Role, user_id: impl Into<String>) -> Self {
        Self {
            role,
            user_id: user_id.into(),
        }
    }

    pub fn inventor(user_id: impl Into<String>) -> Self {
        Self::new(Role::Inventor, user_id)
    }

    pub fn consultant(user_id: impl Into<String>) -> Self {
        Self::new(Role::Consultant, user_id)
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(Role::Admin, user_id)
    }

    pub fn system() -> Self {
        Self::new(Role::System, "system")
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.user_id)
    }
}

/// Primary lifecycle state of a submission.
///
/// "Ready for review" is not a state: it is `UnderReview` with a complete
/// triage checklist, see [`Submission::is_ready_for_review`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    New,
    UnderReview,
    ApprovedForFiling,
    Rejected,
    Finalized,
    /// Resubmission round cap exceeded; needs a decision outside the portal.
    EscalationRequired,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Finalized | SubmissionStatus::EscalationRequired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::New => "new",
            SubmissionStatus::UnderReview => "under_review",
            SubmissionStatus::ApprovedForFiling => "approved_for_filing",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::Finalized => "finalized",
            SubmissionStatus::EscalationRequired => "escalation_required",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        [
            SubmissionStatus::New,
            SubmissionStatus::UnderReview,
            SubmissionStatus::ApprovedForFiling,
            SubmissionStatus::Rejected,
            SubmissionStatus::Finalized,
            SubmissionStatus::EscalationRequired,
        ]
        .into_iter()
        .find(|status| status.as_str() == wanted)
        .ok_or_else(|| format!("unknown submission status '{s}'"))
    }
}

/// Sub-state of a resubmission case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResubmissionStatus {
    PendingResubmission,
    Resubmitted,
    ReceivedByConsultant,
    UnderReReview,
    Approved,
    RejectedAgain,
}

impl ResubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResubmissionStatus::Approved | ResubmissionStatus::RejectedAgain
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResubmissionStatus::PendingResubmission => "pending_resubmission",
            ResubmissionStatus::Resubmitted => "resubmitted",
            ResubmissionStatus::ReceivedByConsultant => "received_by_consultant",
            ResubmissionStatus::UnderReReview => "under_re_review",
            ResubmissionStatus::Approved => "approved",
            ResubmissionStatus::RejectedAgain => "rejected_again",
        }
    }
}

impl fmt::Display for ResubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalResult {
    Approved,
    Rejected,
}

impl fmt::Display for FinalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalResult::Approved => f.write_str("approved"),
            FinalResult::Rejected => f.write_str("rejected"),
        }
    }
}

/// Consultant completeness checklist. Everything starts unchecked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triage {
    pub inventor_identified: bool,
    pub design_views_complete: bool,
    pub description_clear: bool,
}

impl Triage {
    pub fn all_checked() -> Self {
        Self {
            inventor_identified: true,
            design_views_complete: true,
            description_clear: true,
        }
    }
}

/// Partial checklist update; `None` leaves the flag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageUpdate {
    #[serde(default)]
    pub inventor_identified: Option<bool>,
    #[serde(default)]
    pub design_views_complete: Option<bool>,
    #[serde(default)]
    pub description_clear: Option<bool>,
}

impl TriageUpdate {
    pub fn apply_to(&self, triage: &mut Triage) {
        if let Some(value) = self.inventor_identified {
            triage.inventor_identified = value;
        }
        if let Some(value) = self.design_views_complete {
            triage.design_views_complete = value;
        }
        if let Some(value) = self.description_clear {
            triage.description_clear = value;
        }
    }
}

impl From<Triage> for TriageUpdate {
    fn from(triage: Triage) -> Self {
        Self {
            inventor_identified: Some(triage.inventor_identified),
            design_views_complete: Some(triage.design_views_complete),
            description_clear: Some(triage.description_clear),
        }
    }
}

/// Items a rejection flags as missing. Fixed on the case once it is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingItems {
    #[serde(default)]
    pub inventor_details: bool,
    #[serde(default)]
    pub design_views: bool,
    #[serde(default)]
    pub description: bool,
}

impl MissingItems {
    pub fn any(&self) -> bool {
        self.inventor_details || self.design_views || self.description
    }

    pub fn inventor_details() -> Self {
        Self {
            inventor_details: true,
            ..Self::default()
        }
    }

    pub fn design_views() -> Self {
        Self {
            design_views: true,
            ..Self::default()
        }
    }

    pub fn description() -> Self {
        Self {
            description: true,
            ..Self::default()
        }
    }
}

/// One correction round opened by a rejection with missing items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResubmissionCase {
    pub number: u32,
    pub status: ResubmissionStatus,
    pub missing: MissingItems,
    /// Advisory only; nothing expires a case automatically.
    pub deadline: Option<NaiveDate>,
    pub updated_contact_ref: Option<String>,
    pub updated_design_ref: Option<String>,
    pub updated_form_ref: Option<String>,
    pub applicant_remarks: Option<String>,
    pub consultant_remarks: Option<String>,
    pub opened_at: DateTime<Utc>,
    pub resubmitted_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl ResubmissionCase {
    pub fn open(
        number: u32,
        missing: MissingItems,
        deadline: Option<NaiveDate>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            number,
            status: ResubmissionStatus::PendingResubmission,
            missing,
            deadline,
            updated_contact_ref: None,
            updated_design_ref: None,
            updated_form_ref: None,
            applicant_remarks: None,
            consultant_remarks: None,
            opened_at: at,
            resubmitted_at: None,
            decided_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// True when the inventor still owes corrections past the deadline.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == ResubmissionStatus::PendingResubmission
            && self.deadline.is_some_and(|deadline| today > deadline)
    }

    pub fn marker(&self) -> CaseMarker {
        CaseMarker {
            number: self.number,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finalization {
    pub result: FinalResult,
    pub finalized_at: DateTime<Utc>,
    pub duration_days: i64,
}

/// Anything that can be the source or target of a recorded change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "machine", rename_all = "snake_case")]
pub enum LifecycleState {
    Submission { status: SubmissionStatus },
    Resubmission { number: u32, status: ResubmissionStatus },
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Submission { status } => write!(f, "{status}"),
            LifecycleState::Resubmission { number, status } => {
                write!(f, "resubmission #{number} {status}")
            }
        }
    }
}

/// A committed state change, parent or nested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: Option<LifecycleState>,
    pub to: LifecycleState,
    pub actor: Actor,
    pub at: DateTime<Utc>,
}

/// Entry in the parent's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: Option<SubmissionStatus>,
    pub to: SubmissionStatus,
    pub actor: Actor,
    pub at: DateTime<Utc>,
    /// Rejection reason in force when `to` is `Rejected`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseMarker {
    pub number: u32,
    pub status: ResubmissionStatus,
}

/// Parent status plus the active case, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LifecyclePosition {
    pub status: SubmissionStatus,
    pub active_case: Option<CaseMarker>,
}

impl fmt::Display for LifecyclePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.active_case {
            Some(case) => write!(
                f,
                "{} (resubmission #{} {})",
                self.status, case.number, case.status
            ),
            None => write!(f, "{}", self.status),
        }
    }
}

/// Expected pre-state for a compare-and-swap write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Precondition {
    pub key: SubmissionKey,
    pub position: LifecyclePosition,
    pub revision: u64,
}

impl Precondition {
    pub fn matches(&self, stored: &Submission) -> bool {
        stored.precondition() == *self
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at revision {}", self.position, self.revision)
    }
}

/// Intake data supplied by the inventor. The submitter is the filing actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDraft {
    pub ip_type: IpType,
    pub title: String,
    pub description: String,
    pub delivery_unit: String,
    pub filing_date: NaiveDate,
    #[serde(default)]
    pub official_form_ref: Option<String>,
    #[serde(default)]
    pub design_representation_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub ip_type: IpType,
    pub status: SubmissionStatus,
    pub submitter_id: String,
    pub delivery_unit: String,
    pub title: String,
    pub description: String,
    pub filing_date: NaiveDate,
    pub official_form_ref: Option<String>,
    pub design_representation_ref: Option<String>,
    pub triage: Triage,
    pub rejection_reason: Option<String>,
    pub finalization: Option<Finalization>,
    /// Every case ever opened, oldest first. Only the last may be active.
    pub resubmissions: Vec<ResubmissionCase>,
    pub status_history: Vec<StatusChange>,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn from_draft(
        id: SubmissionId,
        submitter: &Actor,
        draft: SubmissionDraft,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            ip_type: draft.ip_type,
            status: SubmissionStatus::New,
            submitter_id: submitter.user_id.clone(),
            delivery_unit: draft.delivery_unit,
            title: draft.title,
            description: draft.description,
            filing_date: draft.filing_date,
            official_form_ref: draft.official_form_ref,
            design_representation_ref: draft.design_representation_ref,
            triage: Triage::default(),
            rejection_reason: None,
            finalization: None,
            resubmissions: Vec::new(),
            status_history: vec![StatusChange {
                from: None,
                to: SubmissionStatus::New,
                actor: submitter.clone(),
                at,
                reason: None,
            }],
            revision: 0,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn key(&self) -> SubmissionKey {
        SubmissionKey::new(self.ip_type, self.id.clone())
    }

    /// Derived label, never persisted.
    pub fn is_ready_for_review(&self) -> bool {
        self.status == SubmissionStatus::UnderReview
            && crate::lifecycle::triage::is_triage_complete(&self.triage)
    }

    pub fn active_case(&self) -> Option<&ResubmissionCase> {
        self.resubmissions.last().filter(|case| case.is_active())
    }

    pub(crate) fn active_case_mut(&mut self) -> Option<&mut ResubmissionCase> {
        self.resubmissions.last_mut().filter(|case| case.is_active())
    }

    pub fn next_case_number(&self) -> u32 {
        self.resubmissions.last().map_or(1, |case| case.number + 1)
    }

    pub fn position(&self) -> LifecyclePosition {
        LifecyclePosition {
            status: self.status,
            active_case: self.active_case().map(ResubmissionCase::marker),
        }
    }

    pub fn precondition(&self) -> Precondition {
        Precondition {
            key: self.key(),
            position: self.position(),
            revision: self.revision,
        }
    }
}

/// What the query API hands to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionView {
    pub submission: Submission,
    pub active_case: Option<ResubmissionCase>,
    pub ready_for_review: bool,
}

impl From<Submission> for SubmissionView {
    fn from(submission: Submission) -> Self {
        let active_case = submission.active_case().cloned();
        let ready_for_review = submission.is_ready_for_review();
        Self {
            submission,
            active_case,
            ready_for_review,
        }
    }
}

/// Tunables that change controller behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    /// `None` leaves resubmission rounds unbounded.
    pub max_resubmission_rounds: Option<u32>,
}
