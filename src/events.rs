// Transition events handed to the notification/audit collaborators

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::lifecycle::traits::EventSink;
use crate::lifecycle::types::{
    Actor, IpType, LifecycleState, StateChange, SubmissionId, SubmissionKey,
};

/// One committed state change, parent or resubmission case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub ip_type: IpType,
    pub id: SubmissionId,
    /// `None` when the state came into existence (intake, case opened).
    pub from: Option<LifecycleState>,
    pub to: LifecycleState,
    pub actor: Actor,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: String,
}

impl TransitionEvent {
    pub fn from_change(key: &SubmissionKey, change: &StateChange, correlation_id: &str) -> Self {
        Self {
            ip_type: key.ip_type,
            id: key.id.clone(),
            from: change.from,
            to: change.to,
            actor: change.actor.clone(),
            timestamp: change.at,
            correlation_id: correlation_id.to_string(),
        }
    }

    pub fn key(&self) -> SubmissionKey {
        SubmissionKey::new(self.ip_type, self.id.clone())
    }
}

/// Writes every event to the structured log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn publish(&self, event: &TransitionEvent) -> Result<()> {
        let from = event
            .from
            .map(|state| state.to_string())
            .unwrap_or_else(|| "-".to_string());
        info!(
            ip_type = %event.ip_type,
            id = %event.id,
            from = %from,
            to = %event.to,
            actor = %event.actor,
            correlation.id = %event.correlation_id,
            "Lifecycle transition committed"
        );
        Ok(())
    }
}

/// Forwards events to an in-process consumer without waiting on it.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<TransitionEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransitionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&self, event: &TransitionEvent) -> Result<()> {
        self.sender
            .send(event.clone())
            .map_err(|_| anyhow!("event receiver dropped"))
    }
}
