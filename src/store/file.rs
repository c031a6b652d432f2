//! JSON-file implementation of `SubmissionStore`.
//!
//! The whole store is one JSON document. Writers take an exclusive advisory
//! lock on a sibling `.lock` file, re-read the document, apply their change
//! and replace the document via write-to-temp + rename. Readers never lock;
//! the rename guarantees they see either the old or the new document.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{sort_by_creation, StoreError, SubmissionFilter, SubmissionStore};
use crate::lifecycle::types::{Precondition, Submission, SubmissionKey};

const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    submissions: Vec<Submission>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            submissions: Vec::new(),
        }
    }
}

impl StoreDocument {
    fn position(&self, key: &SubmissionKey) -> Option<usize> {
        self.submissions
            .iter()
            .position(|submission| submission.ip_type == key.ip_type && submission.id == key.id)
    }
}

#[derive(Debug, Clone)]
pub struct FileSubmissionStore {
    path: PathBuf,
}

impl FileSubmissionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<StoreDocument, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => parse_document(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Run `mutate` against the current document while holding the write lock.
    /// The document is only rewritten when `mutate` succeeds.
    async fn write<T, F>(&self, mutate: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreDocument) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || with_exclusive_lock(&path, mutate))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn parse_document(bytes: &[u8]) -> Result<StoreDocument, StoreError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(StoreDocument::default());
    }
    Ok(serde_json::from_slice(bytes)?)
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

fn with_exclusive_lock<T, F>(path: &Path, mutate: F) -> Result<T, StoreError>
where
    F: FnOnce(&mut StoreDocument) -> Result<T, StoreError>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))?;
    let mut lock = fd_lock::RwLock::new(lock_file);
    let _guard = lock.write()?;

    let mut document = match std::fs::read(path) {
        Ok(bytes) => parse_document(&bytes)?,
        Err(e) if e.kind() == ErrorKind::NotFound => StoreDocument::default(),
        Err(e) => return Err(e.into()),
    };
    let result = mutate(&mut document)?;

    let serialized = serde_json::to_vec_pretty(&document)?;
    let mut temp = path.as_os_str().to_os_string();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);
    std::fs::write(&temp, serialized)?;
    std::fs::rename(&temp, path)?;
    debug!(file = ?path, submissions = document.submissions.len(), "Submission store written");

    Ok(result)
}

#[async_trait]
impl SubmissionStore for FileSubmissionStore {
    async fn insert(&self, submission: Submission) -> Result<Submission, StoreError> {
        self.write(move |document| {
            let key = submission.key();
            if document.position(&key).is_some() {
                return Err(StoreError::Duplicate(key));
            }
            document.submissions.push(submission.clone());
            Ok(submission)
        })
        .await
    }

    async fn get(&self, key: &SubmissionKey) -> Result<Option<Submission>, StoreError> {
        let document = self.read().await?;
        Ok(document
            .position(key)
            .map(|index| document.submissions[index].clone()))
    }

    async fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, StoreError> {
        let document = self.read().await?;
        let mut matching: Vec<Submission> = document
            .submissions
            .into_iter()
            .filter(|submission| filter.matches(submission))
            .collect();
        sort_by_creation(&mut matching);
        Ok(matching)
    }

    async fn compare_and_swap(
        &self,
        expected: &Precondition,
        next: Submission,
    ) -> Result<Submission, StoreError> {
        let expected = expected.clone();
        self.write(move |document| {
            let index = document
                .position(&expected.key)
                .ok_or_else(|| StoreError::NotFound(expected.key.clone()))?;
            let stored = &document.submissions[index];
            if !expected.matches(stored) {
                return Err(StoreError::conflict(&expected, stored));
            }
            document.submissions[index] = next.clone();
            Ok(next)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::types::{Actor, IpType, SubmissionDraft, SubmissionId, SubmissionStatus};
    use chrono::{NaiveDate, Utc};

    fn submission(id: &str) -> Submission {
        Submission::from_draft(
            SubmissionId::from(id),
            &Actor::inventor("ines"),
            SubmissionDraft {
                ip_type: IpType::IndustrialDesign,
                title: "Lamp".to_string(),
                description: "Desk lamp".to_string(),
                delivery_unit: "Design".to_string(),
                filing_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                official_form_ref: Some("forms/lamp.pdf".to_string()),
                design_representation_ref: Some("views/lamp.png".to_string()),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSubmissionStore::new(dir.path().join("nested/submissions.json"));
        assert!(store.list(&SubmissionFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn records_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store/submissions.json");
        let original = FileSubmissionStore::new(&path)
            .insert(submission("d-1"))
            .await
            .unwrap();

        let reopened = FileSubmissionStore::new(&path);
        let loaded = reopened.get(&original.key()).await.unwrap();
        assert_eq!(loaded, Some(original));
    }

    #[tokio::test]
    async fn failed_swap_leaves_document_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSubmissionStore::new(dir.path().join("submissions.json"));
        let original = store.insert(submission("d-2")).await.unwrap();

        let mut stale = original.precondition();
        stale.revision = 7;
        let mut next = original.clone();
        next.status = SubmissionStatus::UnderReview;
        let err = store.compare_and_swap(&stale, next).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let stored = store.get(&original.key()).await.unwrap().unwrap();
        assert_eq!(stored.status, SubmissionStatus::New);
    }
}
