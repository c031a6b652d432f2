// Command and query API over the lifecycle controllers.
//
// One command = read -> authorize -> pure transition -> compare-and-swap ->
// publish events. Nothing is retried here; on Conflict the caller re-reads.

use std::sync::Arc;

use tracing::{info, warn, Instrument};

use super::authorization;
use super::commands::{LifecycleCommand, TransitionName};
use super::errors::{GuardFailure, LifecycleError};
use super::state_machine::{self, TransitionContext};
use super::traits::{Clock, EventSink, SystemClock};
use super::types::{
    Actor, IpType, LifecyclePolicy, LifecycleState, StateChange, Submission, SubmissionDraft,
    SubmissionId, SubmissionKey, SubmissionStatus, SubmissionView,
};
use crate::events::TransitionEvent;
use crate::observability::{lifecycle_metrics, OperationTimer};
use crate::store::{SubmissionFilter, SubmissionStore};
use crate::telemetry::{create_lifecycle_span, generate_correlation_id};

pub struct LifecycleService {
    store: Arc<dyn SubmissionStore>,
    sinks: Vec<Arc<dyn EventSink>>,
    clock: Arc<dyn Clock>,
    policy: LifecyclePolicy,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn SubmissionStore>) -> Self {
        Self {
            store,
            sinks: Vec::new(),
            clock: Arc::new(SystemClock),
            policy: LifecyclePolicy::default(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Intake: create a `New` submission owned by the filing inventor.
    pub async fn file(
        &self,
        actor: &Actor,
        draft: SubmissionDraft,
    ) -> Result<SubmissionView, LifecycleError> {
        let correlation_id = generate_correlation_id();
        let span = create_lifecycle_span(
            TransitionName::File.as_str(),
            None,
            &actor.to_string(),
            &correlation_id,
        );
        let result = self
            .file_inner(actor, draft, &correlation_id)
            .instrument(span)
            .await;
        self.record(&result);
        result
    }

    async fn file_inner(
        &self,
        actor: &Actor,
        draft: SubmissionDraft,
        correlation_id: &str,
    ) -> Result<SubmissionView, LifecycleError> {
        authorization::authorize_filing(actor)?;
        validate_draft(&draft)?;

        let now = self.clock.now();
        let submission = Submission::from_draft(SubmissionId::generate(), actor, draft, now);
        let stored = self.store.insert(submission).await?;

        info!(key = %stored.key(), submitter = %stored.submitter_id, "Submission filed");
        self.publish(
            &stored.key(),
            &[StateChange {
                from: None,
                to: LifecycleState::Submission {
                    status: SubmissionStatus::New,
                },
                actor: actor.clone(),
                at: now,
            }],
            correlation_id,
        );
        Ok(stored.into())
    }

    /// Query: the submission plus its active resubmission case, if any.
    pub async fn get(
        &self,
        ip_type: IpType,
        id: &SubmissionId,
    ) -> Result<SubmissionView, LifecycleError> {
        let key = SubmissionKey::new(ip_type, id.clone());
        self.load(&key).await.map(SubmissionView::from)
    }

    /// Read-only snapshots for dashboards and list views.
    pub async fn list(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<Vec<SubmissionView>, LifecycleError> {
        let submissions = self.store.list(filter).await?;
        Ok(submissions.into_iter().map(SubmissionView::from).collect())
    }

    /// Command: apply one transition on behalf of `actor`.
    pub async fn execute(
        &self,
        ip_type: IpType,
        id: &SubmissionId,
        actor: &Actor,
        command: LifecycleCommand,
    ) -> Result<SubmissionView, LifecycleError> {
        let key = SubmissionKey::new(ip_type, id.clone());
        let correlation_id = generate_correlation_id();
        let span = create_lifecycle_span(
            command.name().as_str(),
            Some(&key.to_string()),
            &actor.to_string(),
            &correlation_id,
        );
        let timer = OperationTimer::new(command.name().as_str());
        let result = self
            .execute_inner(&key, actor, &command, &correlation_id)
            .instrument(span)
            .await;
        timer.finish();
        if let Err(e) = &result {
            warn!(
                key = %key,
                transition = %command.name(),
                kind = %e.kind(),
                "Transition refused: {}",
                e
            );
        }
        self.record(&result);
        result
    }

    async fn execute_inner(
        &self,
        key: &SubmissionKey,
        actor: &Actor,
        command: &LifecycleCommand,
        correlation_id: &str,
    ) -> Result<SubmissionView, LifecycleError> {
        let current = self.load(key).await?;
        authorization::authorize(actor, &current, command.name())?;

        let ctx = TransitionContext {
            actor,
            now: self.clock.now(),
            policy: &self.policy,
        };
        let outcome = state_machine::transition(&current, command, &ctx)?;
        let committed = self
            .store
            .compare_and_swap(&current.precondition(), outcome.submission)
            .await?;

        info!(
            key = %key,
            transition = %command.name(),
            status = %committed.status,
            revision = committed.revision,
            "Transition committed"
        );
        self.publish(key, &outcome.changes, correlation_id);
        Ok(committed.into())
    }

    async fn load(&self, key: &SubmissionKey) -> Result<Submission, LifecycleError> {
        self.store
            .get(key)
            .await?
            .ok_or_else(|| LifecycleError::NotFound { key: key.clone() })
    }

    /// Fire-and-forget delivery; a failing sink never undoes the commit.
    fn publish(&self, key: &SubmissionKey, changes: &[StateChange], correlation_id: &str) {
        for change in changes {
            let event = TransitionEvent::from_change(key, change, correlation_id);
            for sink in &self.sinks {
                if let Err(e) = sink.publish(&event) {
                    lifecycle_metrics().record_sink_failure();
                    warn!(
                        key = %key,
                        to = %event.to,
                        error = %e,
                        "Failed to deliver transition event"
                    );
                }
            }
        }
    }

    fn record<T>(&self, result: &Result<T, LifecycleError>) {
        match result {
            Ok(_) => lifecycle_metrics().record_committed(),
            Err(e) => lifecycle_metrics().record_refused(e.kind()),
        }
    }
}

fn validate_draft(draft: &SubmissionDraft) -> Result<(), LifecycleError> {
    let required = [
        ("title", draft.title.as_str()),
        ("description", draft.description.as_str()),
        ("delivery_unit", draft.delivery_unit.as_str()),
    ];
    match required.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(LifecycleError::guard(
            TransitionName::File,
            GuardFailure::EmptyIntakeField { field: *field },
        )),
        None => Ok(()),
    }
}
