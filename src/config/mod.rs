//! Dashboard configuration.
//!
//! User-level config: `~/.penguin/config.yaml` (optional)
//! Explicit config: `--config <path>` (must exist)
//!
//! Resolution: defaults → config file → command-line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prober::icmp::ProbeOptions;
use crate::tui::theme::Theme;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything that shapes a dashboard run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Time between echo requests, per host.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// How long one request waits for its reply.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Length of the per-host history strip.
    pub history: usize,
    /// ICMP payload bytes per request.
    pub payload_size: usize,
    /// How long quit waits for probers to wind down.
    #[serde(with = "humantime_serde")]
    pub grace_period: Duration,
    /// Lines kept in the on-screen log pane.
    pub log_lines: usize,
    pub theme: Theme,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let probe = ProbeOptions::default();
        Self {
            interval: probe.interval,
            timeout: probe.timeout,
            history: 10,
            payload_size: probe.payload_size,
            grace_period: Duration::from_secs(1),
            log_lines: 256,
            theme: Theme::default(),
        }
    }
}

/// Path to `~/.penguin/config.yaml`.
fn user_config_path() -> Option<PathBuf> {
    #[cfg(windows)]
    let home = std::env::var("USERPROFILE").ok();
    #[cfg(not(windows))]
    let home = std::env::var("HOME").ok();

    home.map(|h| PathBuf::from(h).join(".penguin").join("config.yaml"))
}

impl DashboardConfig {
    /// Load from `path`, or from the user config file if it exists,
    /// or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_file(p),
            None => match user_config_path() {
                Some(p) if p.exists() => Self::load_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("loaded config from {}", path.display());
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::Invalid("interval must be greater than zero".into()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be greater than zero".into()));
        }
        if self.history == 0 {
            return Err(ConfigError::Invalid("history must be at least 1".into()));
        }
        if self.log_lines == 0 {
            return Err(ConfigError::Invalid("log_lines must be at least 1".into()));
        }
        Ok(())
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            interval: self.interval,
            timeout: self.timeout,
            payload_size: self.payload_size,
        }
    }
}
