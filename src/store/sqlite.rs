//! SQLite implementation of `SubmissionStore` (feature `database`).
//!
//! Compare-and-swap is a single `UPDATE ... WHERE revision = ?`: every
//! committed transition bumps the revision, so a matching revision implies a
//! matching status and resubmission position.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::{StoreError, SubmissionFilter, SubmissionStore};
use crate::config::DatabaseConfig;
use crate::lifecycle::types::{Precondition, Submission, SubmissionKey};

pub struct SqliteSubmissionStore {
    pool: SqlitePool,
}

impl SqliteSubmissionStore {
    /// Open (creating if needed) the database and run migrations if enabled.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.url.as_str();
        if let Some(parent) = std::path::Path::new(url.trim_start_matches("sqlite://"))
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)?;
        }

        if !sqlx::Sqlite::database_exists(url).await? {
            info!("Creating database at {}", url);
            sqlx::Sqlite::create_database(url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;

        if config.auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn decode(record: &str) -> Result<Submission, StoreError> {
    Ok(serde_json::from_str(record)?)
}

#[async_trait]
impl SubmissionStore for SqliteSubmissionStore {
    async fn insert(&self, submission: Submission) -> Result<Submission, StoreError> {
        let record = serde_json::to_string(&submission)?;
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO submissions
                (ip_type, id, status, submitter_id, revision, record, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(submission.ip_type.as_str())
        .bind(submission.id.as_str())
        .bind(submission.status.as_str())
        .bind(&submission.submitter_id)
        .bind(submission.revision as i64)
        .bind(&record)
        .bind(submission.created_at.to_rfc3339())
        .bind(submission.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate(submission.key()));
        }
        Ok(submission)
    }

    async fn get(&self, key: &SubmissionKey) -> Result<Option<Submission>, StoreError> {
        let row = sqlx::query("SELECT record FROM submissions WHERE ip_type = ?1 AND id = ?2")
            .bind(key.ip_type.as_str())
            .bind(key.id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode(&row.get::<String, _>("record")))
            .transpose()
    }

    async fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT record FROM submissions
            WHERE (?1 IS NULL OR ip_type = ?1)
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR submitter_id = ?3)
            ORDER BY created_at ASC, ip_type ASC, id ASC
            "#,
        )
        .bind(filter.ip_type.map(|ip_type| ip_type.as_str()))
        .bind(filter.status.map(|status| status.as_str()))
        .bind(filter.submitter_id.as_deref())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| decode(&row.get::<String, _>("record")))
            .collect()
    }

    async fn compare_and_swap(
        &self,
        expected: &Precondition,
        next: Submission,
    ) -> Result<Submission, StoreError> {
        let record = serde_json::to_string(&next)?;
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET status = ?1, revision = ?2, record = ?3, updated_at = ?4
            WHERE ip_type = ?5 AND id = ?6 AND revision = ?7
            "#,
        )
        .bind(next.status.as_str())
        .bind(next.revision as i64)
        .bind(&record)
        .bind(next.updated_at.to_rfc3339())
        .bind(expected.key.ip_type.as_str())
        .bind(expected.key.id.as_str())
        .bind(expected.revision as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(next);
        }
        match self.get(&expected.key).await? {
            Some(stored) => Err(StoreError::conflict(expected, &stored)),
            None => Err(StoreError::NotFound(expected.key.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::types::{Actor, IpType, SubmissionDraft, SubmissionId, SubmissionStatus};
    use chrono::{NaiveDate, Utc};

    async fn store() -> SqliteSubmissionStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        SqliteSubmissionStore::from_pool(pool)
    }

    fn submission(id: &str) -> Submission {
        Submission::from_draft(
            SubmissionId::from(id),
            &Actor::inventor("ines"),
            SubmissionDraft {
                ip_type: IpType::Trademark,
                title: "Bluefin".to_string(),
                description: "Word mark".to_string(),
                delivery_unit: "Brand".to_string(),
                filing_date: NaiveDate::from_ymd_opt(2026, 5, 5).unwrap(),
                official_form_ref: None,
                design_representation_ref: None,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn swap_checks_revision() {
        let store = store().await;
        let original = store.insert(submission("tm-1")).await.unwrap();

        let mut next = original.clone();
        next.status = SubmissionStatus::UnderReview;
        next.revision = 1;
        store
            .compare_and_swap(&original.precondition(), next.clone())
            .await
            .unwrap();

        let err = store
            .compare_and_swap(&original.precondition(), original.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let listed = store
            .list(&SubmissionFilter {
                status: Some(SubmissionStatus::UnderReview),
                ..SubmissionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(listed, vec![next]);
    }

    #[tokio::test]
    async fn duplicate_insert_is_refused() {
        let store = store().await;
        store.insert(submission("tm-2")).await.unwrap();
        assert!(matches!(
            store.insert(submission("tm-2")).await,
            Err(StoreError::Duplicate(_))
        ));
    }
}
