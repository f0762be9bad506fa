use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SettingsError};
use crate::provider::CUSTOM_PROVIDER_KEY;

/// What the email module persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    pub provider: String,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub sender: Option<String>,
}

impl Default for StoredConfig {
    fn default() -> Self {
        Self {
            provider: CUSTOM_PROVIDER_KEY.to_string(),
            server: None,
            port: None,
            login: None,
            password: None,
            tls: false,
            ssl: false,
            sender: None,
        }
    }
}

pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<StoredConfig>;
    fn save(&self, config: &StoredConfig) -> Result<()>;
}

/// JSON file; a missing file reads as the default configuration.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for FileStore {
    fn load(&self) -> Result<StoredConfig> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", self.path.display());
                return Ok(StoredConfig::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&data).map_err(|e| {
            SettingsError::Storage(format!("Invalid config file {}: {e}", self.path.display()))
        })
    }

    fn save(&self, config: &StoredConfig) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(config)
            .map_err(|e| SettingsError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoredConfig>,
}

impl MemoryStore {
    pub fn new(config: StoredConfig) -> Self {
        Self {
            inner: Mutex::new(config),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<StoredConfig> {
        Ok(self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, config: &StoredConfig) -> Result<()> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = config.clone();
        Ok(())
    }
}
