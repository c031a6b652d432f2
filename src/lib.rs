// IP Portal Library - submission review and resubmission lifecycle
// This exposes the core components for the CLI, testing and integration

pub mod cli;
pub mod config;
pub mod events;
pub mod lifecycle;
pub mod observability;
pub mod store;
pub mod telemetry;

// Re-export key types for easy access
pub use crate::config::PortalConfig;
pub use events::{ChannelEventSink, LogEventSink, TransitionEvent};
pub use lifecycle::{
    Actor, ErrorKind, IpType, LifecycleCommand, LifecycleError, LifecycleService, Role,
    Submission, SubmissionId, SubmissionStatus, SubmissionView,
};
pub use observability::{lifecycle_metrics, LifecycleMetrics, OperationTimer};
pub use store::{
    open_store, FileSubmissionStore, InMemorySubmissionStore, StoreError, SubmissionFilter,
    SubmissionStore,
};
pub use telemetry::{create_lifecycle_span, generate_correlation_id, init_telemetry};
