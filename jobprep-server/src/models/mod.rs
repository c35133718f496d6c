//! Data models for job reports, their audio artifacts and derived status

pub mod audio_file;
pub mod job_report;
pub mod status;

pub use audio_file::{display_name_for, AudioFile, AudioFileId};
pub use job_report::{
    format_job_info, FieldError, JobReport, JobReportId, JobReportRequest, NewJobReport, ValidationErrors,
};
pub use status::{AudioArtifact, ReportStatus, StatusReport};
