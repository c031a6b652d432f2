//! In-memory implementation of `SubmissionStore`.
//!
//! All state is held in a `HashMap` behind a `tokio::sync::RwLock` and lost on
//! restart. Used by tests and the `memory` backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{sort_by_creation, StoreError, SubmissionFilter, SubmissionStore};
use crate::lifecycle::types::{Precondition, Submission, SubmissionKey};

#[derive(Debug, Default)]
pub struct InMemorySubmissionStore {
    submissions: RwLock<HashMap<SubmissionKey, Submission>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn insert(&self, submission: Submission) -> Result<Submission, StoreError> {
        let key = submission.key();
        let mut submissions = self.submissions.write().await;
        if submissions.contains_key(&key) {
            return Err(StoreError::Duplicate(key));
        }
        submissions.insert(key, submission.clone());
        Ok(submission)
    }

    async fn get(&self, key: &SubmissionKey) -> Result<Option<Submission>, StoreError> {
        let submissions = self.submissions.read().await;
        Ok(submissions.get(key).cloned())
    }

    async fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, StoreError> {
        let submissions = self.submissions.read().await;
        let mut matching: Vec<Submission> = submissions
            .values()
            .filter(|submission| filter.matches(submission))
            .cloned()
            .collect();
        sort_by_creation(&mut matching);
        Ok(matching)
    }

    async fn compare_and_swap(
        &self,
        expected: &Precondition,
        next: Submission,
    ) -> Result<Submission, StoreError> {
        let mut submissions = self.submissions.write().await;
        let stored = submissions
            .get(&expected.key)
            .ok_or_else(|| StoreError::NotFound(expected.key.clone()))?;
        if !expected.matches(stored) {
            return Err(StoreError::conflict(expected, stored));
        }
        submissions.insert(expected.key.clone(), next.clone());
        Ok(next)
    }
}
