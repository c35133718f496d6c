//! Configuration resolution for jobprep-server
//!
//! Every setting resolves CLI → ENV → TOML → compiled default. Collaborator
//! URLs have no compiled default.

use clap::Parser;
use jobprep_common::config::{resolve_setting, TomlConfig};
use jobprep_common::db::PoolSettings;
use jobprep_common::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

/// Command-line arguments
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "jobprep-server", version, about = "Job report status reconciliation service")]
pub struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "JOBPREP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (host:port)
    #[arg(short, long, env = "JOBPREP_BIND")]
    pub bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "JOBPREP_DATABASE")]
    pub database: Option<PathBuf>,

    /// Log filter directive (overridden by RUST_LOG)
    #[arg(short, long, env = "JOBPREP_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// `--log-level` / `JOBPREP_LOG_LEVEL`, ignoring a blank value
    pub fn explicit_log_level(&self) -> Option<&str> {
        self.log_level.as_deref().map(str::trim).filter(|level| !level.is_empty())
    }

    /// Log filter usable before the config file is read
    pub fn bootstrap_log_level(&self) -> &str {
        self.explicit_log_level().unwrap_or("info")
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub database_path: PathBuf,
    pub log_level: String,
    pub max_connections: u32,
    pub lock_wait_ms: u64,
    pub submit_url: String,
    /// `None` leaves the report checker unconfigured
    pub report_url: Option<String>,
    pub pipeline_timeout: Duration,
    pub report_timeout: Duration,
    pub presign_url: String,
    pub upload_batch_url: Option<String>,
    pub signing_timeout: Duration,
    pub download_ttl_secs: u64,
}

impl ServiceConfig {
    pub fn resolve(args: &Args, toml: TomlConfig) -> Result<Self> {
        let bind_address = resolve_setting(args.bind.clone(), "JOBPREP_BIND", toml.bind_address)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let database_path = match resolve_setting(args.database.clone(), "JOBPREP_DATABASE", toml.database_path) {
            Some(path) => path,
            None => default_database_path()?,
        };

        let log_level = resolve_setting(args.log_level.clone(), "JOBPREP_LOG_LEVEL", Some(toml.logging.level))
            .unwrap_or_else(|| "info".to_string());

        let submit_url = non_blank(resolve_setting(None, "JOBPREP_PIPELINE_SUBMIT_URL", toml.pipeline.submit_url))
            .ok_or_else(|| missing("pipeline.submit_url", "JOBPREP_PIPELINE_SUBMIT_URL"))?;

        let presign_url = non_blank(resolve_setting(None, "JOBPREP_SIGNING_PRESIGN_URL", toml.signing.presign_url))
            .ok_or_else(|| missing("signing.presign_url", "JOBPREP_SIGNING_PRESIGN_URL"))?;

        let report_url = non_blank(resolve_setting(None, "JOBPREP_PIPELINE_REPORT_URL", toml.pipeline.report_url));
        let upload_batch_url = non_blank(resolve_setting(
            None,
            "JOBPREP_SIGNING_UPLOAD_BATCH_URL",
            toml.signing.upload_batch_url,
        ));

        if report_url.is_none() {
            info!("pipeline.report_url not set; report readiness checks disabled");
        }

        Ok(Self {
            bind_address,
            database_path,
            log_level,
            max_connections: toml.database.max_connections.max(1),
            lock_wait_ms: toml.database.lock_wait_ms,
            submit_url,
            report_url,
            pipeline_timeout: Duration::from_secs(toml.pipeline.timeout_secs),
            report_timeout: Duration::from_secs(toml.pipeline.report_timeout_secs),
            presign_url,
            upload_batch_url,
            signing_timeout: Duration::from_secs(toml.signing.timeout_secs),
            download_ttl_secs: toml.signing.download_ttl_secs,
        })
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            ..PoolSettings::default()
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn missing(key: &str, env_var: &str) -> Error {
    Error::Config(format!("{} not configured (set {} or add it to the config file)", key, env_var))
}

/// `<data dir>/jobprep/jobprep.db`
fn default_database_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join("jobprep").join("jobprep.db"))
        .ok_or_else(|| Error::Config("Cannot determine data directory; set --database".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobprep_common::config::parse_toml_config;
    use serial_test::serial;

    const ENV_VARS: &[&str] = &[
        "JOBPREP_BIND",
        "JOBPREP_DATABASE",
        "JOBPREP_LOG_LEVEL",
        "JOBPREP_PIPELINE_SUBMIT_URL",
        "JOBPREP_PIPELINE_REPORT_URL",
        "JOBPREP_SIGNING_PRESIGN_URL",
        "JOBPREP_SIGNING_UPLOAD_BATCH_URL",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn toml_with_urls() -> TomlConfig {
        parse_toml_config(
            r#"
            database_path = "/tmp/jobprep-test.db"

            [pipeline]
            submit_url = "http://pipeline.local/submit"
            report_url = "  "

            [signing]
            presign_url = "http://signer.local/presign"
            timeout_secs = 5
            "#,
        )
        .unwrap()
    }

    #[test]
    #[serial]
    fn test_resolve_from_toml_with_defaults() {
        clear_env();
        let config = ServiceConfig::resolve(&Args::default(), toml_with_urls()).unwrap();

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.database_path, PathBuf::from("/tmp/jobprep-test.db"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.submit_url, "http://pipeline.local/submit");
        assert_eq!(config.report_url, None, "blank report_url leaves checker unconfigured");
        assert_eq!(config.upload_batch_url, None);
        assert_eq!(config.signing_timeout, Duration::from_secs(5));
        assert_eq!(config.report_timeout, Duration::from_secs(10));
        assert_eq!(config.download_ttl_secs, 3600);
    }

    #[test]
    #[serial]
    fn test_cli_and_env_override_toml() {
        clear_env();
        std::env::set_var("JOBPREP_PIPELINE_REPORT_URL", "http://pipeline.local/report");
        std::env::set_var("JOBPREP_BIND", "0.0.0.0:9000");

        let args = Args {
            bind: Some("127.0.0.1:7000".to_string()),
            ..Args::default()
        };
        let config = ServiceConfig::resolve(&args, toml_with_urls()).unwrap();
        clear_env();

        assert_eq!(config.bind_address, "127.0.0.1:7000");
        assert_eq!(config.report_url.as_deref(), Some("http://pipeline.local/report"));
    }

    #[test]
    fn test_bootstrap_log_level() {
        assert_eq!(Args::default().bootstrap_log_level(), "info");

        let blank = Args {
            log_level: Some("  ".to_string()),
            ..Args::default()
        };
        assert_eq!(blank.explicit_log_level(), None);
        assert_eq!(blank.bootstrap_log_level(), "info");

        let debug = Args {
            log_level: Some("jobprep_server=debug".to_string()),
            ..Args::default()
        };
        assert_eq!(debug.bootstrap_log_level(), "jobprep_server=debug");
    }

    #[test]
    #[serial]
    fn test_blank_env_url_falls_through_to_toml() {
        clear_env();
        std::env::set_var("JOBPREP_PIPELINE_SUBMIT_URL", "");
        std::env::set_var("JOBPREP_SIGNING_PRESIGN_URL", "   ");

        let result = ServiceConfig::resolve(&Args::default(), toml_with_urls());
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.submit_url, "http://pipeline.local/submit");
        assert_eq!(config.presign_url, "http://signer.local/presign");
    }

    #[test]
    #[serial]
    fn test_missing_submit_url_is_config_error() {
        clear_env();
        let toml = parse_toml_config(
            r#"
            [signing]
            presign_url = "http://signer.local/presign"
            "#,
        )
        .unwrap();

        let err = ServiceConfig::resolve(&Args::default(), toml).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("pipeline.submit_url")));
    }
}
