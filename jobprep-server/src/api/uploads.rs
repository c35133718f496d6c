//! Upload link handlers

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{JobReportId, ValidationErrors};
use crate::services::{PresignedUpload, UploadBatch, MAX_QUESTIONS_PER_BATCH};
use super::ApiJson;
use crate::AppState;

/// POST /api/jobReport/presigned-upload-url request
#[derive(Debug, Deserialize)]
pub struct UploadUrlRequest {
    #[serde(default)]
    pub session_id: String,
    pub filename: Option<String>,
}

/// POST /api/jobReport/generate-upload-urls request
#[derive(Debug, Deserialize)]
pub struct UploadBatchRequest {
    pub job_report_id: Option<JobReportId>,
    pub num_questions: Option<i64>,
}

/// `answer_<uuid>.mp3`
fn default_upload_filename() -> String {
    format!("answer_{}.mp3", Uuid::new_v4())
}

/// POST /api/jobReport/presigned-upload-url
pub async fn presigned_upload_url(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UploadUrlRequest>,
) -> ApiResult<Json<PresignedUpload>> {
    let filename = request
        .filename
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(default_upload_filename);

    let upload = state.service.sign_upload(&request.session_id, &filename).await?;

    tracing::info!(session_id = %upload.session_id, s3_key = %upload.s3_key, "Issued upload URL");
    Ok(Json(upload))
}

/// POST /api/jobReport/generate-upload-urls
pub async fn generate_upload_urls(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UploadBatchRequest>,
) -> ApiResult<Json<UploadBatch>> {
    let job_report_id = request
        .job_report_id
        .ok_or_else(|| ApiError::BadRequest("job_report_id is required".to_string()))?;

    let num_questions = request
        .num_questions
        .filter(|n| (1..=MAX_QUESTIONS_PER_BATCH as i64).contains(n))
        .ok_or_else(|| {
            ApiError::Validation(ValidationErrors::single(
                "num_questions",
                format!("num_questions must be between 1 and {}", MAX_QUESTIONS_PER_BATCH),
            ))
        })?;

    let batch = state
        .service
        .sign_upload_batch(job_report_id, num_questions as u32)
        .await?;

    tracing::info!(
        job_report_id,
        session_id = %batch.session_id,
        urls = batch.upload_urls.len(),
        "Issued upload URL batch"
    );
    Ok(Json(batch))
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/api/jobReport/presigned-upload-url", post(presigned_upload_url))
        .route("/api/jobReport/generate-upload-urls", post(generate_upload_urls))
}
