use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

use crate::lifecycle::errors::ErrorKind;

/// Lifecycle command counters
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
    pub committed: AtomicU64,
    pub not_found: AtomicU64,
    pub invalid_transitions: AtomicU64,
    pub guard_violations: AtomicU64,
    pub forbidden: AtomicU64,
    pub conflicts: AtomicU64,
    pub storage_errors: AtomicU64,
    pub sink_failures: AtomicU64,
}

impl LifecycleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_committed(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refused(&self, kind: ErrorKind) {
        let counter = match kind {
            ErrorKind::NotFound => &self.not_found,
            ErrorKind::InvalidTransition => &self.invalid_transitions,
            ErrorKind::GuardViolation => &self.guard_violations,
            ErrorKind::Forbidden => &self.forbidden,
            ErrorKind::Conflict => &self.conflicts,
            ErrorKind::Storage => &self.storage_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
        warn!("Event sink delivery failed");
    }

    pub fn get_stats(&self) -> LifecycleStats {
        LifecycleStats {
            committed: self.committed.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            invalid_transitions: self.invalid_transitions.load(Ordering::Relaxed),
            guard_violations: self.guard_violations.load(Ordering::Relaxed),
            forbidden: self.forbidden.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            storage_errors: self.storage_errors.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Lifecycle metrics: committed={}, not_found={}, invalid={}, guard={}, forbidden={}, conflicts={}, storage={}, sink_failures={}",
            stats.committed,
            stats.not_found,
            stats.invalid_transitions,
            stats.guard_violations,
            stats.forbidden,
            stats.conflicts,
            stats.storage_errors,
            stats.sink_failures
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleStats {
    pub committed: u64,
    pub not_found: u64,
    pub invalid_transitions: u64,
    pub guard_violations: u64,
    pub forbidden: u64,
    pub conflicts: u64,
    pub storage_errors: u64,
    pub sink_failures: u64,
}

/// Global metrics instance
static LIFECYCLE_METRICS: std::sync::LazyLock<LifecycleMetrics> =
    std::sync::LazyLock::new(LifecycleMetrics::new);

pub fn lifecycle_metrics() -> &'static LifecycleMetrics {
    &LIFECYCLE_METRICS
}

/// Time an operation and log its duration
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
