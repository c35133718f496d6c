//! Job report engine and its external collaborators

pub mod dedup;
pub mod job_reports;
pub mod pipeline_client;
pub mod signing_client;
pub mod upstream;

pub use dedup::dedup_latest;
pub use job_reports::{
    classify, CreatedJobReport, JobReportService, ReportError, ReportReadiness, MAX_QUESTIONS_PER_BATCH,
};
pub use pipeline_client::{HttpPipelineTrigger, HttpReportChecker, PipelineTrigger, ReportCheck, ReportChecker};
pub use signing_client::{
    HttpUrlSigner, PresignedDownload, PresignedUpload, UploadBatch, UploadSlot, UrlSigner,
    DEFAULT_EXPIRES_IN_SECS,
};
pub use upstream::{JsonPoster, ResponsePayload, UpstreamError};
