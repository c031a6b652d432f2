// Pure transition function for the submission lifecycle.
//
// Takes the current record and a command, returns the next record plus the
// state changes it implies. Nothing here touches storage or emits events.

use chrono::{DateTime, Utc};

use super::commands::LifecycleCommand;
use super::errors::LifecycleError;
use super::types::{
    Actor, FinalResult, Finalization, LifecyclePolicy, LifecycleState, StateChange,
    StatusChange, Submission, SubmissionStatus,
};
use super::{primary, resubmission};

/// Inputs every transition needs besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub actor: &'a Actor,
    pub now: DateTime<Utc>,
    pub policy: &'a LifecyclePolicy,
}

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub submission: Submission,
    pub changes: Vec<StateChange>,
}

/// Apply `command` to `current`.
///
/// Role checks happen before this is called; this enforces source state and
/// guards only.
pub fn transition(
    current: &Submission,
    command: &LifecycleCommand,
    ctx: &TransitionContext<'_>,
) -> Result<TransitionOutcome, LifecycleError> {
    let mut draft = TransitionDraft::new(current, ctx);
    if command.name().is_resubmission() {
        resubmission::apply(&mut draft, command)?;
    } else {
        primary::apply(&mut draft, command)?;
    }
    Ok(draft.finish())
}

/// Working copy of a submission while a transition is being applied.
pub(crate) struct TransitionDraft<'a> {
    pub(crate) submission: Submission,
    changes: Vec<StateChange>,
    pub(crate) ctx: &'a TransitionContext<'a>,
}

impl<'a> TransitionDraft<'a> {
    fn new(current: &Submission, ctx: &'a TransitionContext<'a>) -> Self {
        Self {
            submission: current.clone(),
            changes: Vec::new(),
            ctx,
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.ctx.now
    }

    /// Move the parent to `to`, recorded against `actor`.
    pub(crate) fn set_status_as(&mut self, to: SubmissionStatus, actor: &Actor) {
        let from = self.submission.status;
        self.submission.status = to;
        let reason = match to {
            SubmissionStatus::Rejected => self.submission.rejection_reason.clone(),
            _ => None,
        };
        self.submission.status_history.push(StatusChange {
            from: Some(from),
            to,
            actor: actor.clone(),
            at: self.ctx.now,
            reason,
        });
        self.changes.push(StateChange {
            from: Some(LifecycleState::Submission { status: from }),
            to: LifecycleState::Submission { status: to },
            actor: actor.clone(),
            at: self.ctx.now,
        });
    }

    pub(crate) fn set_status(&mut self, to: SubmissionStatus) {
        let actor = self.ctx.actor.clone();
        self.set_status_as(to, &actor);
    }

    pub(crate) fn record_change(&mut self, change: StateChange) {
        self.changes.push(change);
    }

    /// Record a change that keeps the parent where it is. The status
    /// history is untouched; only an event goes out.
    pub(crate) fn record_in_place(&mut self) {
        let status = self.submission.status;
        self.changes.push(StateChange {
            from: Some(LifecycleState::Submission { status }),
            to: LifecycleState::Submission { status },
            actor: self.ctx.actor.clone(),
            at: self.ctx.now,
        });
    }

    /// Close the parent with `result`. Finalization data is written once.
    pub(crate) fn finalize_as(&mut self, result: FinalResult, actor: &Actor) {
        let finalized_at = self.ctx.now;
        let duration_days = (finalized_at.date_naive() - self.submission.filing_date)
            .num_days()
            .max(0);
        self.submission.finalization = Some(Finalization {
            result,
            finalized_at,
            duration_days,
        });
        self.set_status_as(SubmissionStatus::Finalized, actor);
    }

    fn finish(mut self) -> TransitionOutcome {
        self.submission.revision += 1;
        self.submission.updated_at = self.ctx.now;
        TransitionOutcome {
            submission: self.submission,
            changes: self.changes,
        }
    }
}
