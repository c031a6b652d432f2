// Traits for dependency injection - time source and event delivery

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

use crate::events::TransitionEvent;

/// Time source for transition timestamps and finalization durations.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = at;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Receiver of committed transitions (notification and audit writers).
///
/// Delivery is fire-and-forget: an `Err` is logged by the caller and never
/// undoes the transition.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &TransitionEvent) -> Result<()>;
}
