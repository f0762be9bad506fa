//! Settings panel configuration, read from TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SettingsError};
use crate::settings::Schema;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub test: TestConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// Module the commands are addressed to.
    #[serde(default = "default_module")]
    pub module: String,
    #[serde(default)]
    pub schema: Schema,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            module: default_module(),
            schema: Schema::default(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestConfig {
    #[serde(default = "default_test_timeout")]
    pub timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_test_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl LoggingConfig {
    /// Configured level, or debug in debug builds and info otherwise.
    pub fn level_filter(&self) -> log::LevelFilter {
        let fallback = if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        match self.level.as_deref().map(str::parse::<log::LevelFilter>) {
            Some(Ok(level)) => level,
            Some(Err(_)) => {
                log::warn!("Unknown log level {:?}, using {fallback}", self.level);
                fallback
            }
            None => fallback,
        }
    }

    /// Cap the `log` facade at the configured level. The logger itself is
    /// installed by the host.
    pub fn apply(&self) {
        log::set_max_level(self.level_filter());
    }
}

fn default_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_module() -> String {
    "email".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_test_timeout() -> u64 {
    60
}

fn default_store_path() -> PathBuf {
    PathBuf::from("email.conf")
}

impl PanelConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SettingsError::Validation(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("backend.request_timeout_secs", self.backend.request_timeout_secs),
            ("test.timeout_secs", self.test.timeout_secs),
        ] {
            if secs == 0 {
                return Err(SettingsError::Validation(format!(
                    "Invalid configuration: {name} must be at least 1"
                )));
            }
        }
        Ok(())
    }

    /// Load from a file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PanelConfig::parse("").unwrap();
        assert_eq!(config.backend.module, "email");
        assert_eq!(config.backend.schema, Schema::Current);
        assert_eq!(config.backend.request_timeout_secs, 10);
        assert_eq!(config.test.timeout_secs, 60);
        assert_eq!(config.store.path, PathBuf::from("email.conf"));
    }

    #[test]
    fn test_parse_sections() {
        let config = PanelConfig::parse(
            r#"
            [backend]
            url = "http://device.local:80"
            module = "smtp"
            schema = "legacy"

            [test]
            timeout_secs = 30

            [logging]
            level = "trace"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.url, "http://device.local:80");
        assert_eq!(config.backend.schema, Schema::Legacy);
        assert_eq!(config.test.timeout_secs, 30);
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            PanelConfig::parse("[backend]\nrequest_timeout_secs = \"soon\""),
            Err(SettingsError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let err = PanelConfig::parse("[test]\ntimeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("test.timeout_secs"));
        assert!(matches!(
            PanelConfig::parse("[backend]\nrequest_timeout_secs = 0"),
            Err(SettingsError::Validation(m)) if m.contains("request_timeout_secs")
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PanelConfig::load(&dir.path().join("panel.toml")).unwrap();
        assert_eq!(config.backend.url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_unknown_log_level_falls_back() {
        let logging = LoggingConfig {
            level: Some("loud".into()),
        };
        assert!(logging.level_filter() >= log::LevelFilter::Info);
    }
}
