//! jobprep-server - job report status service
//!
//! Creates job reports, hands them to the interview pipeline, records the
//! audio the pipeline produces, and answers status queries with signed
//! download links.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

use jobprep_server::config::{Args, ServiceConfig};
use jobprep_server::db::SqliteRecordStore;
use jobprep_server::services::{
    HttpPipelineTrigger, HttpReportChecker, HttpUrlSigner, JobReportService, ReportChecker,
};
use jobprep_server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Subscriber first; the config file's level is swapped in once loaded
    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.bootstrap_log_level())),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();

    let toml_config = jobprep_common::config::load_toml_config(args.config.as_deref())?;
    let config = ServiceConfig::resolve(&args, toml_config)?;

    if std::env::var_os("RUST_LOG").is_none() && args.explicit_log_level().is_none() {
        filter_handle.reload(EnvFilter::new(&config.log_level))?;
    }

    info!("Starting jobprep-server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!("Database: {}", config.database_path.display());

    let pool = jobprep_common::db::init_database(&config.database_path, &config.pool_settings()).await?;
    info!("Database connection established");

    let store = SqliteRecordStore::new(pool, config.lock_wait_ms);

    let signer = HttpUrlSigner::new(
        config.presign_url.clone(),
        config.upload_batch_url.clone(),
        config.signing_timeout,
        config.download_ttl_secs,
    )?;
    let trigger = HttpPipelineTrigger::new(config.submit_url.clone(), config.pipeline_timeout)?;

    let report_checker: Option<Arc<dyn ReportChecker>> = match &config.report_url {
        Some(url) => Some(Arc::new(HttpReportChecker::new(url.clone(), config.report_timeout)?)),
        None => None,
    };

    // Outer bound slightly above the client's own timeout
    let report_check_timeout = config.report_timeout + Duration::from_secs(1);

    let service = JobReportService::new(
        Arc::new(store),
        Arc::new(signer),
        Arc::new(trigger),
        report_checker,
        report_check_timeout,
    );

    let app = jobprep_server::build_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("jobprep-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
