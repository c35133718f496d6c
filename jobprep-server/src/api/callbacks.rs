//! Pipeline callback handlers
//!
//! The pipeline reports progress by calling back into the service. Callbacks
//! may arrive more than once; both handlers are safe to repeat.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::JobReportId;
use super::ApiJson;
use crate::AppState;

/// POST /api/jobReport/callback/audios-ready request
#[derive(Debug, Deserialize)]
pub struct AudiosReadyCallback {
    pub job_report_id: Option<JobReportId>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub audio_files: Vec<String>,
}

/// POST /api/jobReport/callback/report-ready request
#[derive(Debug, Deserialize)]
pub struct ReportReadyCallback {
    pub job_report_id: Option<JobReportId>,
    pub session_id: Option<String>,
    pub report_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub job_report_id: JobReportId,
    pub audio_files_recorded: usize,
}

fn require_job_report_id(id: Option<JobReportId>) -> ApiResult<JobReportId> {
    id.ok_or_else(|| ApiError::BadRequest("job_report_id is required".to_string()))
}

fn present(session_id: &Option<String>) -> Option<&str> {
    session_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// POST /api/jobReport/callback/audios-ready
pub async fn audios_ready(
    State(state): State<AppState>,
    ApiJson(callback): ApiJson<AudiosReadyCallback>,
) -> ApiResult<Json<CallbackResponse>> {
    let job_report_id = require_job_report_id(callback.job_report_id)?;

    tracing::info!(
        job_report_id,
        audio_files = callback.audio_files.len(),
        "Received audios-ready callback"
    );

    if let Some(session_id) = present(&callback.session_id) {
        state.service.update_session_id(job_report_id, session_id).await?;
    }

    let audio_files_recorded = state
        .service
        .record_produced_audio(job_report_id, &callback.audio_files)
        .await?;

    Ok(Json(CallbackResponse {
        job_report_id,
        audio_files_recorded,
    }))
}

/// POST /api/jobReport/callback/report-ready
///
/// Only the session linkage is persisted; readiness itself is re-checked on
/// every status query.
pub async fn report_ready(
    State(state): State<AppState>,
    ApiJson(callback): ApiJson<ReportReadyCallback>,
) -> ApiResult<Json<CallbackResponse>> {
    let job_report_id = require_job_report_id(callback.job_report_id)?;

    tracing::info!(
        job_report_id,
        report_path = callback.report_path.as_deref().unwrap_or(""),
        "Received report-ready callback"
    );

    match present(&callback.session_id) {
        Some(session_id) => state.service.update_session_id(job_report_id, session_id).await?,
        None => {
            // Still surface unknown ids to the caller
            state.service.get_job_report(job_report_id).await?;
        }
    }

    Ok(Json(CallbackResponse {
        job_report_id,
        audio_files_recorded: 0,
    }))
}

pub fn callback_routes() -> Router<AppState> {
    Router::new()
        .route("/api/jobReport/callback/audios-ready", post(audios_ready))
        .route("/api/jobReport/callback/report-ready", post(report_ready))
}
