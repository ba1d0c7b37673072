// src/config.rs

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Base name of the config file searched for when no override is given
pub const CONFIG_FILE_NAME: &str = "checkServiceCerts.toml";

/// Run deadline used when `global.timeout` is missing or unparsable
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Minimum certificate lifetime used when no configured value parses (30 days)
pub const DEFAULT_MIN_CERT_LIFETIME: Duration = Duration::from_secs(720 * 60 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no checkServiceCerts.toml found in any of {searched:?}")]
    NotFound { searched: Vec<PathBuf> },

    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A duration string from the config that humantime could not parse
#[derive(Debug, Error)]
#[error("invalid duration {value:?}: {source}")]
pub struct DurationParseError {
    pub value: String,
    #[source]
    pub source: humantime::DurationError,
}

/// Parse a Go-style duration string such as `720h` or `2m`
pub fn parse_duration(value: &str) -> Result<Duration, DurationParseError> {
    humantime::parse_duration(value.trim()).map_err(|source| DurationParseError {
        value: value.to_string(),
        source,
    })
}

/// Settings under `[global]`; also describes the unnamed service
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default)]
    pub min_cert_lifetime: Option<String>,
    #[serde(default)]
    pub template: Option<PathBuf>,
    #[serde(default)]
    pub logfile: Option<PathBuf>,
    #[serde(default)]
    pub cert_paths: Vec<PathBuf>,
}

/// One `[namedServices.<name>]` table
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    #[serde(default)]
    pub cert_paths: Vec<PathBuf>,
    #[serde(default)]
    pub min_cert_lifetime: Option<String>,
}

/// Recipients for one notification profile (`notifications` or `notifications_test`)
#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub admin_email: Vec<String>,
    #[serde(default)]
    pub slack_alerts_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default = "default_smtp_host")]
    pub smtphost: String,
    #[serde(default = "default_smtp_port")]
    pub smtpport: u16,
}

fn default_smtp_host() -> String { "localhost".to_string() }
fn default_smtp_port() -> u16 { 25 }

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from: None,
            smtphost: default_smtp_host(),
            smtpport: default_smtp_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default, rename = "namedServices")]
    pub named_services: BTreeMap<String, ServiceConfig>,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub notifications_test: NotificationsConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the override if given, otherwise the first config file found on the search path
    pub fn locate_and_load(override_path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        if let Some(path) = override_path {
            return Ok((Self::from_file(path)?, path.to_path_buf()));
        }

        let searched = search_paths();
        match searched.iter().find(|p| p.is_file()) {
            Some(path) => Ok((Self::from_file(path)?, path.clone())),
            None => Err(ConfigError::NotFound { searched }),
        }
    }

    /// Notification recipients for this run; test mode uses `notifications_test`
    pub fn notifications_for(&self, test_mode: bool) -> &NotificationsConfig {
        if test_mode {
            &self.notifications_test
        } else {
            &self.notifications
        }
    }

    /// Deadline for the whole run, falling back to two minutes
    pub fn run_timeout(&self) -> Duration {
        match self.global.timeout.as_deref().map(parse_duration) {
            Some(Ok(timeout)) => timeout,
            Some(Err(e)) => {
                tracing::error!(
                    "Could not parse global timeout ({}). Using default of {}",
                    e,
                    humantime::format_duration(DEFAULT_TIMEOUT)
                );
                DEFAULT_TIMEOUT
            }
            None => DEFAULT_TIMEOUT,
        }
    }
}

fn search_paths() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from("/etc/check-service-certs")];
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".check-service-certs"));
    }
    dirs.push(PathBuf::from("."));
    dirs.into_iter().map(|d| d.join(CONFIG_FILE_NAME)).collect()
}
