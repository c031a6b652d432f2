//! Submission persistence.
//!
//! The `SubmissionStore` trait is the single source of truth for lifecycle
//! state. Every write after intake is a compare-and-swap against the
//! pre-state the caller read, so two actors racing on the same submission
//! cannot both win.

mod file;
mod memory;
#[cfg(feature = "database")]
mod sqlite;

pub use file::FileSubmissionStore;
pub use memory::InMemorySubmissionStore;
#[cfg(feature = "database")]
pub use sqlite::SqliteSubmissionStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{PortalConfig, StoreBackend};
use crate::lifecycle::types::{IpType, Precondition, Submission, SubmissionKey, SubmissionStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("submission {0} not found")]
    NotFound(SubmissionKey),

    #[error("submission {0} already exists")]
    Duplicate(SubmissionKey),

    #[error("stale write on {key}: expected {expected}, found {found}")]
    Conflict {
        key: SubmissionKey,
        expected: String,
        found: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store task failed: {0}")]
    Task(String),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub(crate) fn conflict(expected: &Precondition, found: &Submission) -> Self {
        StoreError::Conflict {
            key: expected.key.clone(),
            expected: expected.to_string(),
            found: found.precondition().to_string(),
        }
    }
}

/// Read-side filter for list queries. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionFilter {
    pub ip_type: Option<IpType>,
    pub status: Option<SubmissionStatus>,
    pub submitter_id: Option<String>,
}

impl SubmissionFilter {
    pub fn matches(&self, submission: &Submission) -> bool {
        self.ip_type.map_or(true, |ip_type| submission.ip_type == ip_type)
            && self.status.map_or(true, |status| submission.status == status)
            && self
                .submitter_id
                .as_deref()
                .map_or(true, |submitter| submission.submitter_id == submitter)
    }
}

/// Storage backend for submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Insert a freshly filed submission. Fails with `Duplicate` if the key exists.
    async fn insert(&self, submission: Submission) -> Result<Submission, StoreError>;

    /// Get a submission, returning None if not found.
    async fn get(&self, key: &SubmissionKey) -> Result<Option<Submission>, StoreError>;

    /// Snapshot of all submissions matching `filter`, ordered by creation time.
    async fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, StoreError>;

    /// Replace the record at `expected.key` with `next` if, and only if, the
    /// stored record still matches `expected`.
    async fn compare_and_swap(
        &self,
        expected: &Precondition,
        next: Submission,
    ) -> Result<Submission, StoreError>;
}

fn sort_by_creation(submissions: &mut [Submission]) {
    submissions.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.key().cmp(&b.key()))
    });
}

/// Build the store selected by `config`.
pub async fn open_store(config: &PortalConfig) -> anyhow::Result<Arc<dyn SubmissionStore>> {
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemorySubmissionStore::new())),
        StoreBackend::File => Ok(Arc::new(FileSubmissionStore::new(&config.store.path))),
        #[cfg(feature = "database")]
        StoreBackend::Sqlite => {
            let db = config
                .database
                .clone()
                .ok_or_else(|| anyhow::anyhow!("sqlite backend requires a [database] section"))?;
            let store = SqliteSubmissionStore::connect(&db).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "database"))]
        StoreBackend::Sqlite => Err(anyhow::anyhow!(
            "sqlite backend requested but the `database` feature is not enabled"
        )),
    }
}
