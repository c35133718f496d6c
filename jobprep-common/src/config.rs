//! Configuration file loading and setting resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is never fatal: it is logged and the compiled
//! defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Directory name under the platform config directory
const CONFIG_DIR_NAME: &str = "jobprep";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Address the HTTP server binds to, e.g. `127.0.0.1:8080`
    pub bind_address: Option<String>,
    /// SQLite database file
    pub database_path: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub pipeline: PipelineConfig,
    pub signing: SigningConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing directive (`RUST_LOG` still wins)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    /// Total time a single-row write may spend retrying on lock contention
    pub lock_wait_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            lock_wait_ms: 5000,
        }
    }
}

/// External interview pipeline endpoints
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub submit_url: Option<String>,
    /// Report checker endpoint; absent or empty disables report checks
    pub report_url: Option<String>,
    pub timeout_secs: u64,
    /// Wall-clock bound on a single report check
    pub report_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            submit_url: None,
            report_url: None,
            timeout_secs: 30,
            report_timeout_secs: 10,
        }
    }
}

/// URL signing service endpoints
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SigningConfig {
    /// Single download/upload link endpoint
    pub presign_url: Option<String>,
    /// Batch upload link endpoint
    pub upload_batch_url: Option<String>,
    pub timeout_secs: u64,
    /// Requested validity of download links
    pub download_ttl_secs: u64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            presign_url: None,
            upload_batch_url: None,
            timeout_secs: 15,
            download_ttl_secs: 3600,
        }
    }
}

/// Locate the default config file.
///
/// Tries `<config dir>/jobprep/config.toml` first, then
/// `/etc/jobprep/config.toml` on Linux. Returns `None` when neither exists.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load configuration.
///
/// An explicitly requested file must exist. Without an explicit path the
/// default locations are searched and, if nothing is found, compiled defaults
/// are returned.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!("Config file not found: {}", path.display())));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) => path,
            None => {
                warn!("No config file found, using compiled defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parse TOML text into [`TomlConfig`]; unknown keys are ignored
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Resolve one setting: CLI, then environment variable, then TOML.
///
/// An environment variable that is set but fails to parse is logged and
/// skipped rather than silently masking the TOML value.
pub fn resolve_setting<T>(cli_value: Option<T>, env_var_name: &str, toml_value: Option<T>) -> Option<T>
where
    T: FromStr,
{
    if cli_value.is_some() {
        return cli_value;
    }

    if let Ok(raw) = std::env::var(env_var_name) {
        if !raw.trim().is_empty() {
            match raw.trim().parse::<T>() {
                Ok(value) => return Some(value),
                Err(_) => warn!(env_var = env_var_name, "Ignoring unparsable environment value"),
            }
        }
    }

    toml_value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.pipeline.timeout_secs, 30);
        assert_eq!(config.pipeline.report_timeout_secs, 10);
        assert_eq!(config.signing.download_ttl_secs, 3600);
        assert_eq!(config.database.lock_wait_ms, 5000);
        assert!(config.pipeline.submit_url.is_none());
    }

    #[test]
    fn test_parse_partial_file_keeps_section_defaults() {
        let config = parse_toml_config(
            r#"
            bind_address = "0.0.0.0:9000"

            [pipeline]
            submit_url = "https://pipeline.example/submit"
            report_timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_address.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(config.pipeline.submit_url.as_deref(), Some("https://pipeline.example/submit"));
        assert_eq!(config.pipeline.report_timeout_secs, 3);
        assert_eq!(config.pipeline.timeout_secs, 30);
        assert_eq!(config.signing, SigningConfig::default());
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        let result = parse_toml_config("[database]\nmax_connections = \"many\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = load_toml_config(Some(Path::new("/nonexistent/jobprep/config.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[signing]\npresign_url = \"http://localhost:9100/\"\n").unwrap();

        let config = load_toml_config(Some(&path)).unwrap();
        assert_eq!(config.signing.presign_url.as_deref(), Some("http://localhost:9100/"));
    }

    #[test]
    #[serial]
    fn test_resolve_setting_priority() {
        std::env::remove_var("JOBPREP_TEST_SETTING");

        assert_eq!(resolve_setting(Some(1u64), "JOBPREP_TEST_SETTING", Some(3)), Some(1));
        assert_eq!(resolve_setting(None::<u64>, "JOBPREP_TEST_SETTING", Some(3)), Some(3));

        std::env::set_var("JOBPREP_TEST_SETTING", "2");
        assert_eq!(resolve_setting(None::<u64>, "JOBPREP_TEST_SETTING", Some(3)), Some(2));
        assert_eq!(resolve_setting(Some(1u64), "JOBPREP_TEST_SETTING", Some(3)), Some(1));

        std::env::set_var("JOBPREP_TEST_SETTING", "not-a-number");
        assert_eq!(resolve_setting(None::<u64>, "JOBPREP_TEST_SETTING", Some(3)), Some(3));

        std::env::remove_var("JOBPREP_TEST_SETTING");
        assert_eq!(resolve_setting(None::<u64>, "JOBPREP_TEST_SETTING", None), None);
    }
}
