// Submission Lifecycle Module - review and resubmission state machines
//
// Pure controllers (primary, resubmission) behind an authorization gate, with
// the service layer doing the store round-trip and event fan-out.

pub mod authorization;
pub mod commands;
pub mod errors;
pub mod primary;
pub mod resubmission;
pub mod service;
pub mod state_machine;
pub mod traits;
pub mod triage;
pub mod types;


pub use authorization::{can_file, can_transition};
pub use commands::{
    Corrections, LifecycleCommand, ReReviewDecision, ReReviewOutcome, RejectionDecision,
    TransitionName,
};
pub use errors::{ErrorKind, GuardFailure, LifecycleError, RequiredArtifact};
pub use service::LifecycleService;
pub use state_machine::{transition, TransitionContext, TransitionOutcome};
pub use traits::{Clock, EventSink, ManualClock, SystemClock};
pub use triage::{is_triage_complete, TriageItem};
pub use types::{
    Actor, FinalResult, IpType, LifecyclePolicy, MissingItems, ResubmissionCase,
    ResubmissionStatus, Role, Submission, SubmissionDraft, SubmissionId, SubmissionKey,
    SubmissionStatus, SubmissionView, Triage, TriageUpdate,
};
