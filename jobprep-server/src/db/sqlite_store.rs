//! SQLite-backed [`RecordStore`]

use async_trait::async_trait;
use jobprep_common::db::retry_on_lock;
use jobprep_common::time::{from_db_string, now, to_db_string};
use jobprep_common::{Error, Result};
use sqlx::{Row, SqlitePool};

use super::RecordStore;
use crate::models::{AudioFile, AudioFileId, JobReport, JobReportId, NewJobReport};

/// Record store over a pooled SQLite connection
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
    /// Retry budget for writes that hit lock contention
    lock_wait_ms: u64,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool, lock_wait_ms: u64) -> Self {
        Self { pool, lock_wait_ms }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn create_job_report(&self, report: &NewJobReport) -> Result<JobReportId> {
        let created_at = to_db_string(&now());

        let result = sqlx::query(
            r#"
            INSERT INTO job_reports (company, title, description, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&report.company)
        .bind(&report.title)
        .bind(&report.description)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_job_report(&self, id: JobReportId) -> Result<Option<JobReport>> {
        let row = sqlx::query(
            r#"
            SELECT id, company, title, description, session_id, created_at
            FROM job_reports
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_at: String = row.get("created_at");
        let created_at = from_db_string(Some(&created_at))
            .ok_or_else(|| Error::Internal(format!("Job report {} has invalid created_at: {}", id, created_at)))?;

        Ok(Some(JobReport {
            id: row.get("id"),
            company: row.get("company"),
            title: row.get("title"),
            description: row.get("description"),
            session_id: row.get("session_id"),
            created_at,
        }))
    }

    async fn update_session_id(&self, id: JobReportId, session_id: &str) -> Result<bool> {
        let pool = &self.pool;
        let rows_affected = retry_on_lock("update_session_id", self.lock_wait_ms, || async move {
            let result = sqlx::query("UPDATE job_reports SET session_id = ? WHERE id = ?")
                .bind(session_id)
                .bind(id)
                .execute(pool)
                .await?;
            Ok::<u64, Error>(result.rows_affected())
        })
        .await?;

        Ok(rows_affected > 0)
    }

    async fn insert_audio_file(
        &self,
        job_report_id: JobReportId,
        storage_path: &str,
        file_name: &str,
    ) -> Result<AudioFileId> {
        let created_at = to_db_string(&now());
        let created_at = created_at.as_str();
        let pool = &self.pool;

        retry_on_lock("insert_audio_file", self.lock_wait_ms, || async move {
            let result = sqlx::query(
                r#"
                INSERT INTO audio_files (job_report_id, storage_path, file_name, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(job_report_id)
            .bind(storage_path)
            .bind(file_name)
            .bind(created_at)
            .execute(pool)
            .await?;
            Ok::<AudioFileId, Error>(result.last_insert_rowid())
        })
        .await
    }

    async fn list_audio_files(&self, job_report_id: JobReportId) -> Result<Vec<AudioFile>> {
        // NULL timestamps sort first in SQLite; id breaks ties
        let rows = sqlx::query(
            r#"
            SELECT id, job_report_id, storage_path, file_name, created_at
            FROM audio_files
            WHERE job_report_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(job_report_id)
        .fetch_all(&self.pool)
        .await?;

        let files = rows
            .into_iter()
            .map(|row| {
                let created_at: Option<String> = row.get("created_at");
                AudioFile {
                    id: row.get("id"),
                    job_report_id: row.get("job_report_id"),
                    storage_path: row.get("storage_path"),
                    file_name: row.get("file_name"),
                    created_at: from_db_string(created_at.as_deref()),
                }
            })
            .collect();

        Ok(files)
    }
}
