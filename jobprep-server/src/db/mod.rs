//! Record store for job reports and audio files
//!
//! The engine only sees the [`RecordStore`] trait; connection management
//! lives entirely inside the implementation.

pub mod sqlite_store;

use async_trait::async_trait;
use jobprep_common::Result;

use crate::models::{AudioFile, AudioFileId, JobReport, JobReportId, NewJobReport};

pub use sqlite_store::SqliteRecordStore;

/// Durable storage for job report and audio file rows
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a job report and return its id
    async fn create_job_report(&self, report: &NewJobReport) -> Result<JobReportId>;

    async fn get_job_report(&self, id: JobReportId) -> Result<Option<JobReport>>;

    /// Atomically overwrite the session id (last write wins).
    ///
    /// Returns `false` when no job report has this id.
    async fn update_session_id(&self, id: JobReportId, session_id: &str) -> Result<bool>;

    /// Append an audio row; duplicates of an existing path are allowed
    async fn insert_audio_file(&self, job_report_id: JobReportId, storage_path: &str, file_name: &str)
        -> Result<AudioFileId>;

    /// Audio rows for a job report, oldest first
    async fn list_audio_files(&self, job_report_id: JobReportId) -> Result<Vec<AudioFile>>;
}
