//! Configuration loading and typed config structures for the dashboard.
//!
//! The configuration lives in `quakewatch.yaml` (path overridable with
//! `QUAKEWATCH_CONFIG`). Every section has defaults, so a missing file
//! yields a working dashboard against a local data endpoint. Selected
//! values can be overridden through environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::DashboardError;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "quakewatch.yaml";

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardConfig {
    /// Data endpoint settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Refresh and countdown cadence.
    #[serde(default)]
    pub timers: TimerConfig,

    /// Labels and template overrides.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Listen address of the web surface.
    #[serde(default)]
    pub server: ListenConfig,
}

impl DashboardConfig {
    /// Load configuration from the path in `QUAKEWATCH_CONFIG`, or from
    /// [`DEFAULT_CONFIG_PATH`].
    ///
    /// A missing file is not an error: defaults are used. Environment
    /// overrides are applied and the result is validated in both cases.
    pub fn load() -> Result<Self, DashboardError> {
        let path = std::env::var("QUAKEWATCH_CONFIG")
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                DashboardError::Config(format!("failed to read {}: {e}", path.display()))
            })?;
            Self::parse_yaml(&contents)?
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string without touching the
    /// environment.
    pub fn parse_yaml(yaml: &str) -> Result<Self, DashboardError> {
        serde_yml::from_str(yaml)
            .map_err(|e| DashboardError::Config(format!("failed to parse config YAML: {e}")))
    }

    /// Apply overrides from a key lookup (normally the process environment).
    ///
    /// Recognised keys:
    /// - `QUAKEWATCH_DATA_URL` -- data endpoint URL
    /// - `QUAKEWATCH_HOST` -- web surface bind host
    /// - `QUAKEWATCH_PORT` -- web surface port
    /// - `QUAKEWATCH_LOCALE` -- label set (`en` or `tr`)
    /// - `QUAKEWATCH_REFRESH_INTERVAL_SECS` -- refresh cadence in seconds
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), DashboardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("QUAKEWATCH_DATA_URL") {
            self.source.data_url = url;
        }
        if let Some(host) = lookup("QUAKEWATCH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("QUAKEWATCH_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| DashboardError::Config(format!("invalid QUAKEWATCH_PORT: {e}")))?;
        }
        if let Some(locale) = lookup("QUAKEWATCH_LOCALE") {
            self.display.locale = locale.parse()?;
        }
        if let Some(secs) = lookup("QUAKEWATCH_REFRESH_INTERVAL_SECS") {
            self.timers.refresh_interval_secs = secs.parse().map_err(|e| {
                DashboardError::Config(format!("invalid QUAKEWATCH_REFRESH_INTERVAL_SECS: {e}"))
            })?;
        }
        Ok(())
    }

    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.source.data_url.trim().is_empty() {
            return Err(DashboardError::Config("source.data_url must not be empty".to_owned()));
        }
        if self.source.request_timeout_secs == 0 {
            return Err(DashboardError::Config(
                "source.request_timeout_secs must be at least 1".to_owned(),
            ));
        }
        if self.timers.refresh_interval_secs == 0 {
            return Err(DashboardError::Config(
                "timers.refresh_interval_secs must be at least 1".to_owned(),
            ));
        }
        if self.timers.countdown_interval_ms == 0 {
            return Err(DashboardError::Config(
                "timers.countdown_interval_ms must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Data endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Full URL of the earthquake data endpoint.
    #[serde(default = "default_data_url")]
    pub data_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl SourceConfig {
    /// Request timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_url: default_data_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Timer cadence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimerConfig {
    /// Seconds between periodic refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Milliseconds between countdown label updates.
    #[serde(default = "default_countdown_interval_ms")]
    pub countdown_interval_ms: u64,
}

impl TimerConfig {
    /// Refresh cadence as a [`Duration`].
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Countdown cadence as a [`Duration`].
    pub const fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            countdown_interval_ms: default_countdown_interval_ms(),
        }
    }
}

/// Display configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    /// Label set used for every user-visible string.
    #[serde(default)]
    pub locale: Locale,

    /// Optional directory whose `summary.html` / `city_row.html` replace
    /// the built-in table templates.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
}

/// Supported label sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English labels.
    En,
    /// Turkish labels.
    #[default]
    Tr,
}

impl FromStr for Locale {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "tr" | "turkish" => Ok(Self::Tr),
            other => Err(DashboardError::Config(format!("unknown locale: {other}"))),
        }
    }
}

/// Listen address of the web surface.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenConfig {
    /// Host address to bind (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_data_url() -> String {
    "http://127.0.0.1:5000/earthquake_data".to_owned()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_refresh_interval_secs() -> u64 {
    60
}

const fn default_countdown_interval_ms() -> u64 {
    1000
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = DashboardConfig::parse_yaml("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.timers.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.timers.countdown_interval(), Duration::from_secs(1));
        assert_eq!(config.display.locale, Locale::Tr);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "
source:
  data_url: http://quakes.example/earthquake_data
display:
  locale: en
server:
  port: 9090
";
        let config = DashboardConfig::parse_yaml(yaml).unwrap();
        assert_eq!(config.source.data_url, "http://quakes.example/earthquake_data");
        assert_eq!(config.source.request_timeout_secs, 30);
        assert_eq!(config.display.locale, Locale::En);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let result = DashboardConfig::parse_yaml("timers: 5");
        assert!(matches!(result, Err(DashboardError::Config(_))));
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: BTreeMap<&str, &str> = [
            ("QUAKEWATCH_DATA_URL", "http://override/earthquake_data"),
            ("QUAKEWATCH_PORT", "7000"),
            ("QUAKEWATCH_LOCALE", "EN"),
            ("QUAKEWATCH_REFRESH_INTERVAL_SECS", "15"),
        ]
        .into_iter()
        .collect();

        let mut config = DashboardConfig::default();
        let result = config.apply_overrides(|key| vars.get(key).map(|v| (*v).to_owned()));
        assert!(result.is_ok());
        assert_eq!(config.source.data_url, "http://override/earthquake_data");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.display.locale, Locale::En);
        assert_eq!(config.timers.refresh_interval_secs, 15);
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = DashboardConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "QUAKEWATCH_PORT").then(|| "not-a-port".to_owned())
        });
        assert!(matches!(result, Err(DashboardError::Config(_))));
    }

    #[test]
    fn zero_intervals_fail_validation() {
        let mut config = DashboardConfig::default();
        config.timers.refresh_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.timers.countdown_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.source.data_url = "  ".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_locale_is_rejected() {
        assert!("de".parse::<Locale>().is_err());
        assert_eq!("turkish".parse::<Locale>().ok(), Some(Locale::Tr));
    }
}
