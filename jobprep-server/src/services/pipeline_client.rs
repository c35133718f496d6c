//! Interview pipeline client
//!
//! The pipeline accepts a job description plus a callback address, runs the
//! interview workflow asynchronously and reports produced audio through the
//! callback endpoints. Separately it can be asked whether the final report
//! for a session exists.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::upstream::{normalize_body, JsonPoster, ResponsePayload, UpstreamError};
use crate::models::JobReportId;

/// Submission side of the pipeline
#[async_trait]
pub trait PipelineTrigger: Send + Sync {
    /// Hand a job to the pipeline.
    ///
    /// `Ok(None)` means the pipeline accepted the job without naming a
    /// session yet; the session id will arrive by callback.
    async fn submit(
        &self,
        job_info: &str,
        callback_url: &str,
        job_report_id: JobReportId,
    ) -> Result<Option<String>, UpstreamError>;
}

/// Outcome of asking for a session's report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportCheck {
    /// Direct link to the finished report
    Ready(String),
    /// Nothing usable yet (including a bare storage path)
    NotReady,
}

/// Report-checking side of the pipeline
#[async_trait]
pub trait ReportChecker: Send + Sync {
    async fn check_report(&self, session_id: &str) -> Result<ReportCheck, UpstreamError>;
}

#[derive(Deserialize)]
struct SubmitResponse {
    session_id: Option<String>,
}

#[derive(Deserialize)]
struct ReportResponse {
    report_url: Option<String>,
    report_path: Option<String>,
}

/// HTTP implementation of [`PipelineTrigger`]
pub struct HttpPipelineTrigger {
    poster: JsonPoster,
    submit_url: String,
}

impl HttpPipelineTrigger {
    pub fn new(submit_url: String, timeout: Duration) -> Result<Self, UpstreamError> {
        Ok(Self {
            poster: JsonPoster::new(timeout)?,
            submit_url,
        })
    }
}

#[async_trait]
impl PipelineTrigger for HttpPipelineTrigger {
    async fn submit(
        &self,
        job_info: &str,
        callback_url: &str,
        job_report_id: JobReportId,
    ) -> Result<Option<String>, UpstreamError> {
        let payload = json!({
            "job_info": job_info,
            "callback_url": callback_url,
            "job_report_id": job_report_id,
        });

        let text = self.poster.post(&self.submit_url, &payload).await?;

        let session_id = session_id_from_body(&text)?;

        if session_id.is_none() {
            tracing::debug!(job_report_id, "Pipeline accepted job without a session id");
        }

        Ok(session_id)
    }
}

/// Session id from a 2xx submit response.
///
/// An envelope carrying a non-2xx `statusCode` is a failed submission. Any
/// other body we cannot read only means no session id yet.
fn session_id_from_body(text: &str) -> Result<Option<String>, UpstreamError> {
    let Ok(document) = serde_json::from_str::<serde_json::Value>(text) else {
        return Ok(None);
    };

    let value = match ResponsePayload::classify(document).into_inner() {
        Ok(value) => value,
        Err(e @ UpstreamError::Status(..)) => return Err(e),
        Err(_) => return Ok(None),
    };

    Ok(serde_json::from_value::<SubmitResponse>(value)
        .ok()
        .and_then(|response| response.session_id)
        .filter(|id| !id.trim().is_empty()))
}

/// HTTP implementation of [`ReportChecker`]
pub struct HttpReportChecker {
    poster: JsonPoster,
    report_url: String,
}

impl HttpReportChecker {
    pub fn new(report_url: String, timeout: Duration) -> Result<Self, UpstreamError> {
        Ok(Self {
            poster: JsonPoster::new(timeout)?,
            report_url,
        })
    }
}

#[async_trait]
impl ReportChecker for HttpReportChecker {
    async fn check_report(&self, session_id: &str) -> Result<ReportCheck, UpstreamError> {
        let payload = json!({ "session_id": session_id });

        let text = self.poster.post(&self.report_url, &payload).await?;
        let value = normalize_body(&text)?;
        let response: ReportResponse =
            serde_json::from_value(value).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        match (response.report_url, response.report_path) {
            (Some(url), _) if !url.trim().is_empty() => Ok(ReportCheck::Ready(url)),
            (_, Some(path)) => {
                // A storage path still needs signing before clients can use it
                tracing::debug!(session_id = %session_id, report_path = %path, "Report stored but no link yet");
                Ok(ReportCheck::NotReady)
            }
            _ => Ok(ReportCheck::NotReady),
        }
    }
}
