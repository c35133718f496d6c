//! Audio file rows produced by the interview pipeline

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::JobReportId;

pub type AudioFileId = i64;

/// One persisted audio upload.
///
/// Rows are immutable and append-only. Several rows may share a
/// `storage_path` when the pipeline re-reports the same artifact; readers
/// collapse them with [`crate::services::dedup::dedup_latest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioFile {
    pub id: AudioFileId,
    pub job_report_id: JobReportId,
    /// Opaque object address, e.g. `s3://bucket/session/q1.mp3`
    pub storage_path: String,
    pub file_name: String,
    /// Null for rows written before timestamps were recorded
    pub created_at: Option<DateTime<Utc>>,
}

/// Display name for a storage path: everything after the last `/`.
pub fn display_name_for(storage_path: &str) -> &str {
    match storage_path.rfind('/') {
        Some(idx) => &storage_path[idx + 1..],
        None => storage_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_is_final_segment() {
        assert_eq!(display_name_for("s3://bucket/sess-1/answer_2.mp3"), "answer_2.mp3");
        assert_eq!(display_name_for("answer.mp3"), "answer.mp3");
        assert_eq!(display_name_for("s3://bucket/dir/"), "");
    }
}
