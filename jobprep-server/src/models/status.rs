//! Derived pipeline status returned to clients

use serde::{Deserialize, Serialize};

/// Pipeline status, recomputed on every query and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// No audio recorded yet
    Pending,
    /// Audio exists, final report not (yet) available
    AudiosReady,
    /// Audio exists and a report link was just confirmed
    ReportReady,
}

/// One deduplicated audio artifact with its (possibly missing) download link.
///
/// `download_url` is a time-limited capability; it is `None` when signing
/// failed for this artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioArtifact {
    pub storage_path: String,
    pub download_url: Option<String>,
    pub display_name: String,
}

/// Status query result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: ReportStatus,
    pub audio_artifacts: Vec<AudioArtifact>,
    /// Present only when `status` is `REPORT_READY`
    pub report_url: Option<String>,
}

impl StatusReport {
    pub fn pending() -> Self {
        Self {
            status: ReportStatus::Pending,
            audio_artifacts: Vec::new(),
            report_url: None,
        }
    }
}
