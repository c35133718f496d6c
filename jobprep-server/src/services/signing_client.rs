//! URL signing service client
//!
//! Mints time-limited GET links for stored audio and PUT links for answer
//! uploads. Links are capabilities: they are returned to callers and never
//! persisted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::upstream::{decode_body, JsonPoster, UpstreamError};
use crate::models::JobReportId;

/// Validity assumed when the service omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

fn default_expires_in() -> u64 {
    DEFAULT_EXPIRES_IN_SECS
}

/// Signed download link for one storage path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedDownload {
    pub url: String,
    pub expires_in_secs: u64,
}

/// Signed upload link for one answer file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedUpload {
    pub session_id: String,
    pub presigned_url: String,
    /// Storage key the uploaded object will live under
    pub s3_key: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

/// One slot of a batch upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSlot {
    pub question_index: u32,
    pub presigned_url: String,
    pub s3_key: String,
}

/// Upload links for every question of an interview session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadBatch {
    pub session_id: String,
    #[serde(default)]
    pub upload_urls: Vec<UploadSlot>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

/// URL signing capability
#[async_trait]
pub trait UrlSigner: Send + Sync {
    /// GET link for a stored object
    async fn sign_download(&self, storage_path: &str) -> Result<PresignedDownload, UpstreamError>;

    /// PUT link for one answer file within a session
    async fn sign_upload(&self, session_id: &str, filename: &str) -> Result<PresignedUpload, UpstreamError>;

    /// PUT links for `count` questions; the service opens the session
    async fn sign_upload_batch(&self, job_report_id: JobReportId, count: u32) -> Result<UploadBatch, UpstreamError>;
}

#[derive(Deserialize)]
struct DownloadResponse {
    presigned_url: String,
    expires_in: Option<u64>,
}

/// HTTP implementation of [`UrlSigner`]
pub struct HttpUrlSigner {
    poster: JsonPoster,
    presign_url: String,
    upload_batch_url: Option<String>,
    download_ttl_secs: u64,
}

impl HttpUrlSigner {
    pub fn new(
        presign_url: String,
        upload_batch_url: Option<String>,
        timeout: Duration,
        download_ttl_secs: u64,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            poster: JsonPoster::new(timeout)?,
            presign_url,
            upload_batch_url: upload_batch_url.filter(|url| !url.trim().is_empty()),
            download_ttl_secs,
        })
    }
}

#[async_trait]
impl UrlSigner for HttpUrlSigner {
    async fn sign_download(&self, storage_path: &str) -> Result<PresignedDownload, UpstreamError> {
        let payload = json!({
            "s3_path": storage_path,
            "expires_in": self.download_ttl_secs,
        });

        let text = self.poster.post(&self.presign_url, &payload).await?;
        let response: DownloadResponse = decode_body(&text)?;

        if response.presigned_url.trim().is_empty() {
            return Err(UpstreamError::Malformed("empty presigned_url".to_string()));
        }

        tracing::debug!(storage_path = %storage_path, "Signed download URL");

        Ok(PresignedDownload {
            url: response.presigned_url,
            expires_in_secs: response.expires_in.unwrap_or(self.download_ttl_secs),
        })
    }

    async fn sign_upload(&self, session_id: &str, filename: &str) -> Result<PresignedUpload, UpstreamError> {
        let payload = json!({
            "session_id": session_id,
            "filename": filename,
        });

        let text = self.poster.post(&self.presign_url, &payload).await?;
        let upload: PresignedUpload = decode_body(&text)?;

        tracing::debug!(session_id = %session_id, s3_key = %upload.s3_key, "Signed upload URL");

        Ok(upload)
    }

    async fn sign_upload_batch(&self, job_report_id: JobReportId, count: u32) -> Result<UploadBatch, UpstreamError> {
        let url = self
            .upload_batch_url
            .as_deref()
            .ok_or(UpstreamError::NotConfigured("signing.upload_batch_url"))?;

        let payload = json!({
            "job_report_id": job_report_id,
            "num_questions": count,
        });

        let text = self.poster.post(url, &payload).await?;
        let batch: UploadBatch = decode_body(&text)?;

        tracing::info!(
            job_report_id,
            session_id = %batch.session_id,
            slots = batch.upload_urls.len(),
            "Signed batch upload URLs"
        );

        Ok(batch)
    }
}
