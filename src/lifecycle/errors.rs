// Lifecycle error taxonomy

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::commands::TransitionName;
use super::triage::TriageItem;
use super::types::{LifecyclePosition, Role, SubmissionKey};
use crate::store::StoreError;

/// Corrected artifact an open case may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredArtifact {
    UpdatedContact,
    UpdatedDesign,
    UpdatedForm,
}

impl fmt::Display for RequiredArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequiredArtifact::UpdatedContact => "updated inventor contact details",
            RequiredArtifact::UpdatedDesign => "updated design views",
            RequiredArtifact::UpdatedForm => "updated official form",
        };
        f.write_str(label)
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Business-rule failure: right state, unmet precondition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardFailure {
    #[error("triage checklist incomplete (unchecked: {})", join(.unchecked))]
    TriageIncomplete { unchecked: Vec<TriageItem> },
    #[error("rejection reason must not be empty")]
    EmptyRejectionReason,
    #[error("missing required artifacts: {}", join(.artifacts))]
    MissingArtifacts { artifacts: Vec<RequiredArtifact> },
    #[error("applicant remarks must not be empty")]
    EmptyApplicantRemarks,
    #[error("consultant remarks must not be empty")]
    EmptyConsultantRemarks,
    #[error("resubmission case #{number} is still open")]
    ResubmissionOpen { number: u32 },
    #[error("intake field '{field}' must not be empty")]
    EmptyIntakeField { field: &'static str },
}

/// Client-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    GuardViolation,
    Forbidden,
    Conflict,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::GuardViolation => "guard_violation",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("submission {key} not found")]
    NotFound { key: SubmissionKey },

    #[error("'{transition}' does not apply to a submission in state {position}")]
    InvalidTransition {
        transition: TransitionName,
        position: LifecyclePosition,
    },

    #[error("'{transition}' refused: {failure}")]
    GuardViolation {
        transition: TransitionName,
        failure: GuardFailure,
    },

    #[error("{role} '{user_id}' may not perform '{transition}'")]
    Forbidden {
        role: Role,
        user_id: String,
        transition: TransitionName,
    },

    #[error("concurrent update on {key}: {detail}; re-read and retry")]
    Conflict { key: SubmissionKey, detail: String },

    #[error("storage failure: {0}")]
    Storage(String),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::NotFound { .. } => ErrorKind::NotFound,
            LifecycleError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            LifecycleError::GuardViolation { .. } => ErrorKind::GuardViolation,
            LifecycleError::Forbidden { .. } => ErrorKind::Forbidden,
            LifecycleError::Conflict { .. } => ErrorKind::Conflict,
            LifecycleError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn guard(transition: TransitionName, failure: GuardFailure) -> Self {
        LifecycleError::GuardViolation {
            transition,
            failure,
        }
    }

    pub(crate) fn invalid(transition: TransitionName, position: LifecyclePosition) -> Self {
        LifecycleError::InvalidTransition {
            transition,
            position,
        }
    }
}

/// `Conflict` covers both a lost compare-and-swap and an intake id that is
/// already taken.
impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => LifecycleError::NotFound { key },
            StoreError::Duplicate(key) => LifecycleError::Conflict {
                key,
                detail: "a submission with this id already exists".to_string(),
            },
            StoreError::Conflict {
                key,
                expected,
                found,
            } => LifecycleError::Conflict {
                key,
                detail: format!("expected {expected}, found {found}"),
            },
            other => LifecycleError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::types::{IpType, SubmissionStatus};

    #[test]
    fn kinds_are_distinct_per_variant() {
        let key = SubmissionKey::new(IpType::Trademark, "tm-1");
        let position = LifecyclePosition {
            status: SubmissionStatus::New,
            active_case: None,
        };
        let errors = vec![
            LifecycleError::NotFound { key: key.clone() },
            LifecycleError::invalid(TransitionName::Approve, position),
            LifecycleError::guard(TransitionName::Reject, GuardFailure::EmptyRejectionReason),
            LifecycleError::Forbidden {
                role: Role::Inventor,
                user_id: "ines".to_string(),
                transition: TransitionName::Receive,
            },
            LifecycleError::Conflict {
                key,
                detail: "raced".to_string(),
            },
            LifecycleError::Storage("disk full".to_string()),
        ];

        let kinds: std::collections::HashSet<_> = errors.iter().map(LifecycleError::kind).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn guard_message_lists_missing_artifacts() {
        let failure = GuardFailure::MissingArtifacts {
            artifacts: vec![RequiredArtifact::UpdatedDesign, RequiredArtifact::UpdatedForm],
        };
        assert_eq!(
            failure.to_string(),
            "missing required artifacts: updated design views, updated official form"
        );
    }

    #[test]
    fn store_conflict_maps_to_conflict_kind() {
        let key = SubmissionKey::new(IpType::Copyright, "c-9");
        let err: LifecycleError = StoreError::Conflict {
            key,
            expected: "under_review at revision 1".to_string(),
            found: "rejected at revision 2".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn duplicate_id_maps_to_conflict_kind() {
        let key = SubmissionKey::new(IpType::Trademark, "tm-1");
        let err: LifecycleError = StoreError::Duplicate(key.clone()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        match err {
            LifecycleError::Conflict { key: found, detail } => {
                assert_eq!(found, key);
                assert!(detail.contains("already exists"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
