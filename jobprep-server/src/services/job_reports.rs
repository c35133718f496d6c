//! Job report service: creation, callback bookkeeping and status reconciliation
//!
//! Status is never stored. Every query reloads the audio rows, collapses
//! duplicates, and classifies the result together with a fresh report check:
//!
//! | deduplicated audio | report check         | status         |
//! |--------------------|----------------------|----------------|
//! | empty              | (not attempted)      | `PENDING`      |
//! | non-empty          | link returned        | `REPORT_READY` |
//! | non-empty          | skipped / not ready / unavailable | `AUDIOS_READY` |
//!
//! Upstream failures while computing status are an expected outcome: a
//! failed signature leaves that artifact without a link, a failed report
//! check reads as "not ready". Neither fails the query.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::dedup::dedup_latest;
use super::pipeline_client::{PipelineTrigger, ReportCheck, ReportChecker};
use super::signing_client::{PresignedUpload, UploadBatch, UrlSigner};
use super::upstream::UpstreamError;
use crate::db::RecordStore;
use crate::models::{
    display_name_for, AudioArtifact, AudioFile, JobReport, JobReportId, JobReportRequest, ReportStatus,
    StatusReport, ValidationErrors,
};

/// Largest batch of upload links a single request may ask for
pub const MAX_QUESTIONS_PER_BATCH: u32 = 50;

/// Job report service errors
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Job report not found: {0}")]
    NotFound(JobReportId),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Upstream unavailable: {0}")]
    Upstream(#[from] UpstreamError),

    /// The job report was stored but the pipeline was not notified
    #[error("Job report {} created but pipeline submission failed: {source}", .created.job_report_id)]
    SubmissionFailed {
        created: CreatedJobReport,
        #[source]
        source: UpstreamError,
    },

    #[error(transparent)]
    Store(#[from] jobprep_common::Error),
}

/// Result of a successful creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedJobReport {
    pub job_info: String,
    pub session_id: Option<String>,
    pub job_report_id: JobReportId,
}

/// What the report check found
#[derive(Debug)]
pub enum ReportReadiness {
    /// No session yet, or no report checker configured
    Skipped,
    NotReady,
    /// The checker failed or timed out
    Unavailable(UpstreamError),
    Ready(String),
}

/// Map deduplicated audio count and report readiness to a status
pub fn classify(audio_count: usize, readiness: ReportReadiness) -> (ReportStatus, Option<String>) {
    if audio_count == 0 {
        return (ReportStatus::Pending, None);
    }

    match readiness {
        ReportReadiness::Ready(url) => (ReportStatus::ReportReady, Some(url)),
        ReportReadiness::Skipped | ReportReadiness::NotReady | ReportReadiness::Unavailable(_) => {
            (ReportStatus::AudiosReady, None)
        }
    }
}

/// Orchestrates the record store and the external collaborators
pub struct JobReportService {
    store: Arc<dyn RecordStore>,
    signer: Arc<dyn UrlSigner>,
    trigger: Arc<dyn PipelineTrigger>,
    report_checker: Option<Arc<dyn ReportChecker>>,
    report_check_timeout: Duration,
}

impl JobReportService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        signer: Arc<dyn UrlSigner>,
        trigger: Arc<dyn PipelineTrigger>,
        report_checker: Option<Arc<dyn ReportChecker>>,
        report_check_timeout: Duration,
    ) -> Self {
        Self {
            store,
            signer,
            trigger,
            report_checker,
            report_check_timeout,
        }
    }

    /// Validate, persist, and hand the job to the pipeline.
    ///
    /// The row is committed before submission. A failed submission returns
    /// [`ReportError::SubmissionFailed`] carrying the created identity so the
    /// caller can retry notification; an accepted submission without a
    /// session id is a success.
    pub async fn create_job_report(&self, request: &JobReportRequest) -> Result<CreatedJobReport, ReportError> {
        let new_report = request.validate()?;

        let job_report_id = self.store.create_job_report(&new_report).await?;
        let job_info = new_report.job_info();

        tracing::info!(job_report_id, company = %new_report.company, "Job report created");

        let mut created = CreatedJobReport {
            job_info,
            session_id: None,
            job_report_id,
        };

        let session_id = match self
            .trigger
            .submit(&created.job_info, &new_report.callback_url, job_report_id)
            .await
        {
            Ok(session_id) => session_id,
            Err(source) => {
                tracing::error!(job_report_id, error = %source, "Pipeline submission failed");
                return Err(ReportError::SubmissionFailed { created, source });
            }
        };

        if let Some(session_id) = session_id {
            self.store.update_session_id(job_report_id, &session_id).await?;
            tracing::info!(job_report_id, session_id = %session_id, "Pipeline accepted job");
            created.session_id = Some(session_id);
        } else {
            tracing::info!(job_report_id, "Pipeline accepted job, session id pending callback");
        }

        Ok(created)
    }

    pub async fn get_job_report(&self, id: JobReportId) -> Result<JobReport, ReportError> {
        self.store
            .get_job_report(id)
            .await?
            .ok_or(ReportError::NotFound(id))
    }

    /// Compute the current status of a job report.
    ///
    /// Read-only with respect to the store; safe to call concurrently.
    pub async fn get_status(&self, id: JobReportId) -> Result<StatusReport, ReportError> {
        let job_report = self.get_job_report(id).await?;

        let rows = self.store.list_audio_files(id).await?;
        let row_count = rows.len();
        let audio_files = dedup_latest(rows);

        tracing::debug!(
            job_report_id = id,
            rows = row_count,
            unique = audio_files.len(),
            "Loaded audio files"
        );

        if audio_files.is_empty() {
            tracing::info!(job_report_id = id, "Status: PENDING (no audio recorded)");
            return Ok(StatusReport::pending());
        }

        let audio_artifacts = self.presign_artifacts(&audio_files).await;
        let readiness = self.check_report(id, job_report.session_id.as_deref()).await;

        let reason = match &readiness {
            ReportReadiness::Skipped => "no session or report checker",
            ReportReadiness::NotReady => "report not generated yet",
            ReportReadiness::Unavailable(_) => "report check unavailable",
            ReportReadiness::Ready(_) => "report available",
        };

        let (status, report_url) = classify(audio_files.len(), readiness);
        tracing::info!(job_report_id = id, status = ?status, reason, "Status computed");

        Ok(StatusReport {
            status,
            audio_artifacts,
            report_url,
        })
    }

    /// Signed download links, one per artifact, in input order.
    ///
    /// Each artifact is its own fault boundary: a signing failure leaves
    /// that artifact's link empty and does not affect the others.
    async fn presign_artifacts(&self, audio_files: &[AudioFile]) -> Vec<AudioArtifact> {
        let requests = audio_files.iter().map(|file| async move {
            let download_url = match self.signer.sign_download(&file.storage_path).await {
                Ok(signed) => Some(signed.url),
                Err(e) => {
                    tracing::warn!(
                        storage_path = %file.storage_path,
                        error = %e,
                        "Failed to sign download URL"
                    );
                    None
                }
            };

            AudioArtifact {
                storage_path: file.storage_path.clone(),
                download_url,
                display_name: file.file_name.clone(),
            }
        });

        join_all(requests).await
    }

    async fn check_report(&self, id: JobReportId, session_id: Option<&str>) -> ReportReadiness {
        let session_id = match session_id.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => return ReportReadiness::Skipped,
        };
        let Some(checker) = &self.report_checker else {
            return ReportReadiness::Skipped;
        };

        match tokio::time::timeout(self.report_check_timeout, checker.check_report(session_id)).await {
            Ok(Ok(ReportCheck::Ready(url))) => ReportReadiness::Ready(url),
            Ok(Ok(ReportCheck::NotReady)) => ReportReadiness::NotReady,
            Ok(Err(e)) => {
                tracing::warn!(job_report_id = id, session_id = %session_id, error = %e, "Report check failed");
                ReportReadiness::Unavailable(e)
            }
            Err(_) => {
                tracing::warn!(
                    job_report_id = id,
                    session_id = %session_id,
                    timeout_ms = self.report_check_timeout.as_millis() as u64,
                    "Report check timed out"
                );
                ReportReadiness::Unavailable(UpstreamError::Timeout(self.report_check_timeout))
            }
        }
    }

    /// Overwrite the session id (last write wins; repeat calls are harmless)
    pub async fn update_session_id(&self, id: JobReportId, session_id: &str) -> Result<(), ReportError> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(ValidationErrors::single("session_id", "session_id must not be blank").into());
        }

        if !self.store.update_session_id(id, session_id).await? {
            return Err(ReportError::NotFound(id));
        }

        tracing::info!(job_report_id = id, session_id = %session_id, "Session id updated");
        Ok(())
    }

    /// Append one audio row per reported storage path.
    ///
    /// Duplicates are stored as-is; reads collapse them. Blank paths are
    /// skipped. Returns the number of rows written.
    pub async fn record_produced_audio(&self, id: JobReportId, storage_paths: &[String]) -> Result<usize, ReportError> {
        if self.store.get_job_report(id).await?.is_none() {
            return Err(ReportError::NotFound(id));
        }

        let mut inserted = 0;
        for storage_path in storage_paths {
            let storage_path = storage_path.trim();
            if storage_path.is_empty() {
                tracing::warn!(job_report_id = id, "Skipping blank audio storage path");
                continue;
            }

            let file_name = display_name_for(storage_path);
            self.store.insert_audio_file(id, storage_path, file_name).await?;
            inserted += 1;
        }

        tracing::info!(job_report_id = id, inserted, "Recorded produced audio");
        Ok(inserted)
    }

    /// Signed upload link for one answer file
    pub async fn sign_upload(&self, session_id: &str, filename: &str) -> Result<PresignedUpload, ReportError> {
        if session_id.trim().is_empty() {
            return Err(ValidationErrors::single("session_id", "session_id must not be blank").into());
        }

        Ok(self.signer.sign_upload(session_id.trim(), filename).await?)
    }

    /// Upload links for every question of a job report's interview
    pub async fn sign_upload_batch(&self, id: JobReportId, num_questions: u32) -> Result<UploadBatch, ReportError> {
        if num_questions == 0 || num_questions > MAX_QUESTIONS_PER_BATCH {
            return Err(ValidationErrors::single(
                "num_questions",
                format!("num_questions must be between 1 and {}", MAX_QUESTIONS_PER_BATCH),
            )
            .into());
        }

        // Ensure the job report exists before opening a session for it
        self.get_job_report(id).await?;

        Ok(self.signer.sign_upload_batch(id, num_questions).await?)
    }
}
