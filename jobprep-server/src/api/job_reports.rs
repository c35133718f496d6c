//! Job report API handlers
//!
//! POST /api/jobReport/create, GET /api/jobReport/details/:id,
//! GET /api/jobReport/status/:id, GET /api/jobReport/audios/:id/presigned-urls

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::error::ApiResult;
use crate::models::{AudioArtifact, JobReport, JobReportId, JobReportRequest, StatusReport};
use crate::services::CreatedJobReport;
use super::ApiJson;
use crate::AppState;

/// POST /api/jobReport/create
///
/// Returns 201 with the canonical job description and the session id when the
/// pipeline supplied one synchronously.
pub async fn create_job_report(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<JobReportRequest>,
) -> ApiResult<(StatusCode, Json<CreatedJobReport>)> {
    let created = state.service.create_job_report(&request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/jobReport/details/:id
pub async fn get_job_report(
    State(state): State<AppState>,
    Path(id): Path<JobReportId>,
) -> ApiResult<Json<JobReport>> {
    Ok(Json(state.service.get_job_report(id).await?))
}

/// GET /api/jobReport/status/:id
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<JobReportId>,
) -> ApiResult<Json<StatusReport>> {
    Ok(Json(state.service.get_status(id).await?))
}

/// GET /api/jobReport/audios/:id/presigned-urls
pub async fn get_audio_download_urls(
    State(state): State<AppState>,
    Path(id): Path<JobReportId>,
) -> ApiResult<Json<Vec<AudioArtifact>>> {
    let report = state.service.get_status(id).await?;
    Ok(Json(report.audio_artifacts))
}

pub fn job_report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/jobReport/create", post(create_job_report))
        .route("/api/jobReport/details/:id", get(get_job_report))
        .route("/api/jobReport/status/:id", get(get_status))
        .route("/api/jobReport/audios/:id/presigned-urls", get(get_audio_download_urls))
}
