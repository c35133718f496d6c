//! Shared fixtures for integration tests
//!
//! In-memory record store plus hand-written collaborator fakes whose
//! behavior each test chooses.

#![allow(dead_code)]

use async_trait::async_trait;
use jobprep_server::db::{RecordStore, SqliteRecordStore};
use jobprep_server::models::{JobReportId, NewJobReport};
use jobprep_server::services::{
    JobReportService, PipelineTrigger, PresignedDownload, PresignedUpload, ReportCheck, ReportChecker,
    UploadBatch, UploadSlot, UpstreamError, UrlSigner,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const REPORT_CHECK_TIMEOUT: Duration = Duration::from_millis(200);

pub const VALID_DESCRIPTION: &str =
    "Build and operate data pipelines for the analytics platform, owning reliability and on-call.";

/// Store over a fresh in-memory database
pub async fn memory_store() -> Arc<SqliteRecordStore> {
    let pool = jobprep_common::db::init_memory_database().await.unwrap();
    Arc::new(SqliteRecordStore::new(pool, 1000))
}

/// Store over a WAL database file with several pooled connections
pub async fn file_store(dir: &std::path::Path) -> Arc<SqliteRecordStore> {
    let settings = jobprep_common::db::PoolSettings {
        max_connections: 8,
        ..jobprep_common::db::PoolSettings::default()
    };
    let pool = jobprep_common::db::init_database(&dir.join("jobprep.db"), &settings)
        .await
        .unwrap();
    Arc::new(SqliteRecordStore::new(pool, 5000))
}

pub fn new_job_report(company: &str) -> NewJobReport {
    NewJobReport {
        company: company.to_string(),
        title: "Data Engineer".to_string(),
        description: VALID_DESCRIPTION.to_string(),
        callback_url: "https://app.example/callback".to_string(),
    }
}

/// Insert an audio row with an explicit (possibly null) creation time
pub async fn insert_audio_at(
    store: &SqliteRecordStore,
    job_report_id: JobReportId,
    storage_path: &str,
    created_at: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO audio_files (job_report_id, storage_path, file_name, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(job_report_id)
    .bind(storage_path)
    .bind(storage_path.rsplit('/').next().unwrap_or(storage_path))
    .bind(created_at)
    .execute(store.pool())
    .await
    .unwrap();
}

pub fn signed_url_for(storage_path: &str) -> String {
    format!("https://signed.example/{}?sig=test", storage_path)
}

/// Signer that fails for chosen storage paths
#[derive(Default)]
pub struct FakeSigner {
    pub failing_paths: HashSet<String>,
    pub download_calls: AtomicUsize,
    pub upload_fails: bool,
}

impl FakeSigner {
    pub fn failing(paths: &[&str]) -> Self {
        Self {
            failing_paths: paths.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn download_call_count(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UrlSigner for FakeSigner {
    async fn sign_download(&self, storage_path: &str) -> Result<PresignedDownload, UpstreamError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_paths.contains(storage_path) {
            return Err(UpstreamError::Status(500, "signing backend error".to_string()));
        }
        Ok(PresignedDownload {
            url: signed_url_for(storage_path),
            expires_in_secs: 3600,
        })
    }

    async fn sign_upload(&self, session_id: &str, filename: &str) -> Result<PresignedUpload, UpstreamError> {
        if self.upload_fails {
            return Err(UpstreamError::Network("connection refused".to_string()));
        }
        Ok(PresignedUpload {
            session_id: session_id.to_string(),
            presigned_url: format!("https://upload.example/{}/{}", session_id, filename),
            s3_key: format!("sessions/{}/{}", session_id, filename),
            expires_in: 3600,
        })
    }

    async fn sign_upload_batch(&self, job_report_id: JobReportId, count: u32) -> Result<UploadBatch, UpstreamError> {
        let session_id = format!("batch-{}", job_report_id);
        let upload_urls = (1..=count)
            .map(|question_index| UploadSlot {
                question_index,
                presigned_url: format!("https://upload.example/{}/q{}", session_id, question_index),
                s3_key: format!("sessions/{}/q{}.mp3", session_id, question_index),
            })
            .collect();
        Ok(UploadBatch {
            session_id,
            upload_urls,
            expires_in: 3600,
        })
    }
}

/// What the fake pipeline answers on submission
#[derive(Clone)]
pub enum TriggerBehavior {
    Session(String),
    NoSession,
    Fail,
}

pub struct FakeTrigger {
    behavior: TriggerBehavior,
    pub submissions: Mutex<Vec<(String, String, JobReportId)>>,
}

impl FakeTrigger {
    pub fn new(behavior: TriggerBehavior) -> Self {
        Self {
            behavior,
            submissions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PipelineTrigger for FakeTrigger {
    async fn submit(
        &self,
        job_info: &str,
        callback_url: &str,
        job_report_id: JobReportId,
    ) -> Result<Option<String>, UpstreamError> {
        self.submissions
            .lock()
            .unwrap()
            .push((job_info.to_string(), callback_url.to_string(), job_report_id));

        match &self.behavior {
            TriggerBehavior::Session(s) => Ok(Some(s.clone())),
            TriggerBehavior::NoSession => Ok(None),
            TriggerBehavior::Fail => Err(UpstreamError::Status(503, "pipeline down".to_string())),
        }
    }
}

/// What the fake report checker answers
#[derive(Clone)]
pub enum CheckBehavior {
    Ready(String),
    NotReady,
    Fail,
    /// Sleep well past [`REPORT_CHECK_TIMEOUT`]
    Hang,
}

pub struct FakeChecker {
    behavior: CheckBehavior,
    pub calls: AtomicUsize,
}

impl FakeChecker {
    pub fn new(behavior: CheckBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportChecker for FakeChecker {
    async fn check_report(&self, _session_id: &str) -> Result<ReportCheck, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            CheckBehavior::Ready(url) => Ok(ReportCheck::Ready(url.clone())),
            CheckBehavior::NotReady => Ok(ReportCheck::NotReady),
            CheckBehavior::Fail => Err(UpstreamError::Network("connection reset".to_string())),
            CheckBehavior::Hang => {
                tokio::time::sleep(REPORT_CHECK_TIMEOUT * 10).await;
                Ok(ReportCheck::Ready("https://too.late/report".to_string()))
            }
        }
    }
}

/// Engine wired to the given fakes, with handles kept for assertions
pub struct TestEngine {
    pub store: Arc<SqliteRecordStore>,
    pub signer: Arc<FakeSigner>,
    pub trigger: Arc<FakeTrigger>,
    pub checker: Option<Arc<FakeChecker>>,
    pub service: JobReportService,
}

pub async fn engine_with(signer: FakeSigner, trigger: TriggerBehavior, checker: Option<CheckBehavior>) -> TestEngine {
    engine_on_store(memory_store().await, signer, trigger, checker)
}

pub fn engine_on_store(
    store: Arc<SqliteRecordStore>,
    signer: FakeSigner,
    trigger: TriggerBehavior,
    checker: Option<CheckBehavior>,
) -> TestEngine {
    let signer = Arc::new(signer);
    let trigger = Arc::new(FakeTrigger::new(trigger));
    let checker = checker.map(|b| Arc::new(FakeChecker::new(b)));

    let report_checker: Option<Arc<dyn ReportChecker>> = match &checker {
        Some(c) => Some(c.clone()),
        None => None,
    };

    let service = JobReportService::new(
        store.clone(),
        signer.clone(),
        trigger.clone(),
        report_checker,
        REPORT_CHECK_TIMEOUT,
    );

    TestEngine {
        store,
        signer,
        trigger,
        checker,
        service,
    }
}

pub async fn default_engine() -> TestEngine {
    engine_with(
        FakeSigner::default(),
        TriggerBehavior::Session("sess-1".to_string()),
        Some(CheckBehavior::NotReady),
    )
    .await
}

/// Create a job report directly in the store, optionally linked to a session
pub async fn seed_job_report(engine: &TestEngine, session_id: Option<&str>) -> JobReportId {
    let id = engine
        .store
        .create_job_report(&new_job_report("Acme Corp"))
        .await
        .unwrap();
    if let Some(session_id) = session_id {
        engine.store.update_session_id(id, session_id).await.unwrap();
    }
    id
}
