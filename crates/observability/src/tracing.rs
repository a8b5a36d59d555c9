//! Tracing/logging initialization.
//!
//! Settings come from the environment:
//! - `RUST_LOG`: `EnvFilter` directives (default `info`)
//! - `SALERETURN_LOG_FORMAT`: `json` (default) or `pretty`

use std::env;

use anyhow::Context;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const FILTER_VAR: &str = "RUST_LOG";
pub const FORMAT_VAR: &str = "SALERETURN_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(SettingsError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown log format '{0}' (expected 'json' or 'pretty')")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or blank values take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let present = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());

        let filter = present(FILTER_VAR).unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let format = match present(FORMAT_VAR) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };
        Ok(Self { filter, format })
    }
}

/// Install the global subscriber described by `settings`.
///
/// Fails when the filter does not parse or a subscriber is already installed.
pub fn try_init(settings: &LogSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&settings.filter)
        .with_context(|| format!("invalid log filter '{}'", settings.filter))?;

    let installed = match settings.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!(e))?;

    ::tracing::debug!(filter = %settings.filter, format = ?settings.format, "logging initialised");
    Ok(())
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops). Bad settings
/// fall back to the defaults.
pub fn init() {
    let settings = LogSettings::from_env().unwrap_or_default();
    if try_init(&settings).is_err() && settings != LogSettings::default() {
        let _ = try_init(&LogSettings::default());
    }
}
