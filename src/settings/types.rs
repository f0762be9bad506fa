use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SettingsError};
use crate::provider::CUSTOM_PROVIDER_KEY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub key: String,
    pub label: String,
}

/// Configuration as returned by the `get_module_config` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub providers: Vec<ProviderSummary>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default, deserialize_with = "lenient::port")]
    pub port: Option<u16>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub tls: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub ssl: bool,
    #[serde(default)]
    pub sender: Option<String>,
}

fn default_provider() -> String {
    CUSTOM_PROVIDER_KEY.to_string()
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            providers: Vec::new(),
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

/// Port as typed by the user. Kept loose on the wire so that a malformed
/// value reaches the backend and comes back as a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortField {
    Number(i64),
    Text(String),
}

impl PortField {
    pub fn from_input(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        Some(match input.parse::<i64>() {
            Ok(n) => PortField::Number(n),
            Err(_) => PortField::Text(input.to_string()),
        })
    }

    /// `Ok(None)` for an empty text value.
    pub fn validate(&self) -> Result<Option<u16>> {
        let n = match self {
            PortField::Number(n) => *n,
            PortField::Text(s) if s.trim().is_empty() => return Ok(None),
            PortField::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| SettingsError::invalid("port"))?,
        };
        match u16::try_from(n) {
            Ok(port) if port > 0 => Ok(Some(port)),
            _ => Err(SettingsError::invalid("port")),
        }
    }
}

/// Parameters of the `set_config` command. Also the connection part of the
/// `test` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPayload {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortField>,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Bool(bool),
        Number(i64),
        Text(String),
    }

    pub fn port<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Loose>::deserialize(deserializer)?;
        let n = match value {
            None | Some(Loose::Bool(_)) => return Ok(None),
            Some(Loose::Number(n)) => n,
            Some(Loose::Text(s)) if s.trim().is_empty() => return Ok(None),
            Some(Loose::Text(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid port \"{s}\"")))?,
        };
        u16::try_from(n)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("port {n} out of range")))
    }

    pub fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Loose>::deserialize(deserializer)? {
            Some(Loose::Bool(b)) => b,
            Some(Loose::Number(n)) => n != 0,
            Some(Loose::Text(s)) => matches!(s.trim(), "true" | "1"),
            None => false,
        })
    }
}
