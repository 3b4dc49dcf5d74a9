//! Application-level configuration loading: match clock interpretation, roster operation
//! timeout and invitation notification templates.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PADEL_ROSTER_CONFIG_PATH";

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_INVITATION_TITLE: &str = "Match invitation";
const DEFAULT_INVITATION_MESSAGE: &str =
    "You have been invited to a padel match on {date} at {start_time}";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    match_time_zone: Tz,
    operation_timeout: Duration,
    invitation_title: String,
    invitation_message: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        time_zone = %app_config.match_time_zone,
                        "loaded roster configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse the JSON representation, filling omitted keys with defaults.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let raw = serde_json::from_str::<RawConfig>(contents)?;
        raw.try_into()
    }

    /// Zone used to turn the wall-clock date/time columns of a match into an instant.
    pub fn match_time_zone(&self) -> Tz {
        self.match_time_zone
    }

    /// Upper bound for one serialized roster mutation.
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Override the roster operation timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Title of the notification sent to invited players.
    pub fn invitation_title(&self) -> &str {
        &self.invitation_title
    }

    /// Body of the invitation notification with `{date}` and `{start_time}` substituted.
    pub fn invitation_message(&self, date: &str, start_time: &str) -> String {
        self.invitation_message
            .replace("{date}", date)
            .replace("{start_time}", start_time)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            match_time_zone: chrono_tz::UTC,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            invitation_title: DEFAULT_INVITATION_TITLE.to_string(),
            invitation_message: DEFAULT_INVITATION_MESSAGE.to_string(),
        }
    }
}

/// Reasons a configuration file is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed configuration JSON")]
    Json(#[from] serde_json::Error),
    #[error("unknown match time zone `{0}`")]
    TimeZone(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    match_time_zone: Option<String>,
    operation_timeout_ms: Option<u64>,
    invitation_title: Option<String>,
    invitation_message: Option<String>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        let defaults = Self::default();
        let match_time_zone = match value.match_time_zone {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|_| ConfigError::TimeZone(name))?,
            None => defaults.match_time_zone,
        };

        Ok(Self {
            match_time_zone,
            operation_timeout: value
                .operation_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.operation_timeout),
            invitation_title: value
                .invitation_title
                .filter(|title| !title.trim().is_empty())
                .unwrap_or(defaults.invitation_title),
            invitation_message: value
                .invitation_message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or(defaults.invitation_message),
        })
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.match_time_zone(), chrono_tz::UTC);
        assert_eq!(config.operation_timeout(), DEFAULT_OPERATION_TIMEOUT);
        assert_eq!(config.invitation_title(), DEFAULT_INVITATION_TITLE);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_json(
            r#"{
                "match_time_zone": "Europe/Madrid",
                "operation_timeout_ms": 250,
                "invitation_title": "Nuevo partido",
                "invitation_message": "Partido el {date} a las {start_time}"
            }"#,
        )
        .unwrap();
        assert_eq!(config.match_time_zone(), chrono_tz::Europe::Madrid);
        assert_eq!(config.operation_timeout(), Duration::from_millis(250));
        assert_eq!(config.invitation_title(), "Nuevo partido");
        assert_eq!(
            config.invitation_message("2024-05-17", "18:00"),
            "Partido el 2024-05-17 a las 18:00"
        );
    }

    #[test]
    fn unknown_time_zone_is_rejected() {
        let err = AppConfig::from_json(r#"{ "match_time_zone": "Europe/Atlantis" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::TimeZone(name) if name == "Europe/Atlantis"));
    }
}
