//! Translation between the current configuration schema and the historical
//! `smtp_*` one.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::types::{ConfigPayload, ModuleConfig};
use crate::error::{Result, SettingsError};
use crate::provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    #[default]
    Current,
    Legacy,
}

#[derive(Debug, Deserialize)]
struct LegacyConfig {
    #[serde(default)]
    smtp_server: Option<String>,
    #[serde(default)]
    smtp_port: Option<Value>,
    #[serde(default)]
    smtp_login: Option<String>,
    #[serde(default)]
    smtp_password: Option<String>,
    #[serde(default)]
    smtp_tls: Option<Value>,
    #[serde(default)]
    smtp_ssl: Option<Value>,
    #[serde(default)]
    email_sender: Option<String>,
}

fn is_legacy(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.contains_key("smtp_server") || o.contains_key("smtp_login"))
}

impl Schema {
    /// Decode a `get_module_config` answer. The schema is detected from the
    /// document itself so either kind of backend can be read.
    pub fn decode(value: Value) -> Result<ModuleConfig> {
        let mut config = if is_legacy(&value) {
            upgrade(value)?
        } else {
            serde_json::from_value::<ModuleConfig>(value)
                .map_err(|e| SettingsError::Transport(format!("Malformed configuration: {e}")))?
        };
        if config.providers.is_empty() {
            config.providers = provider::summaries();
        }
        Ok(config)
    }

    pub fn encode_set_config(&self, payload: &ConfigPayload) -> Result<Value> {
        let value = serde_json::to_value(payload)
            .map_err(|e| SettingsError::Validation(e.to_string()))?;
        Ok(match self {
            Schema::Current => value,
            Schema::Legacy => downgrade(value),
        })
    }

    pub fn encode_test(&self, recipient: &str, payload: &ConfigPayload) -> Result<Value> {
        match self {
            Schema::Legacy => Ok(json!({ "recipient": recipient })),
            Schema::Current => {
                let mut value = serde_json::to_value(payload)
                    .map_err(|e| SettingsError::Validation(e.to_string()))?;
                if let Some(obj) = value.as_object_mut() {
                    obj.insert("recipient".into(), Value::String(recipient.to_string()));
                }
                Ok(value)
            }
        }
    }
}

fn upgrade(value: Value) -> Result<ModuleConfig> {
    let legacy: LegacyConfig = serde_json::from_value(value)
        .map_err(|e| SettingsError::Transport(format!("Malformed legacy configuration: {e}")))?;
    let provider = provider::by_server(legacy.smtp_server.as_deref());

    // Reuse the lenient readers of the current schema for port and flags.
    let current: ModuleConfig = serde_json::from_value(json!({
        "provider": provider.key,
        "server": legacy.smtp_server,
        "port": legacy.smtp_port,
        "login": legacy.smtp_login,
        "password": legacy.smtp_password,
        "tls": legacy.smtp_tls,
        "ssl": legacy.smtp_ssl,
        "sender": legacy.email_sender,
    }))
    .map_err(|e| SettingsError::Transport(format!("Malformed legacy configuration: {e}")))?;
    Ok(current)
}

const RENAMES: [(&str, &str); 7] = [
    ("server", "smtp_server"),
    ("port", "smtp_port"),
    ("login", "smtp_login"),
    ("password", "smtp_password"),
    ("tls", "smtp_tls"),
    ("ssl", "smtp_ssl"),
    ("sender", "email_sender"),
];

fn downgrade(value: Value) -> Value {
    let Value::Object(current) = value else {
        return value;
    };
    let mut legacy = Map::new();
    for (key, v) in current {
        // legacy backends infer the provider from the server
        if key == "provider" {
            continue;
        }
        let renamed = RENAMES
            .iter()
            .find(|(from, _)| *from == key)
            .map_or(key.clone(), |(_, to)| (*to).to_string());
        legacy.insert(renamed, v);
    }
    Value::Object(legacy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::types::PortField;

    fn payload() -> ConfigPayload {
        ConfigPayload {
            provider: "custom".into(),
            server: Some("mail.example.org".into()),
            port: Some(PortField::Number(2525)),
            login: "me".into(),
            password: "secret".into(),
            tls: Some(true),
            ssl: None,
            sender: None,
        }
    }

    #[test]
    fn test_decode_legacy_infers_provider() {
        let config = Schema::decode(json!({
            "smtp_server": "smtp.gmail.com",
            "smtp_port": "465",
            "smtp_login": "me@gmail.com",
            "smtp_password": "pw",
            "smtp_tls": false,
            "smtp_ssl": true,
            "email_sender": "me@gmail.com"
        }))
        .unwrap();
        assert_eq!(config.provider, "gmail");
        assert_eq!(config.server.as_deref(), Some("smtp.gmail.com"));
        assert_eq!(config.port, Some(465));
        assert!(config.ssl);
        assert_eq!(config.sender.as_deref(), Some("me@gmail.com"));
        assert_eq!(config.providers.len(), provider::all().len());
    }

    #[test]
    fn test_decode_legacy_unknown_server_is_custom() {
        let config = Schema::decode(json!({"smtp_server": "mx.local", "smtp_login": ""})).unwrap();
        assert_eq!(config.provider, "custom");
    }

    #[test]
    fn test_decode_current_keeps_backend_providers() {
        let config = Schema::decode(json!({
            "provider": "gmail",
            "providers": [{"key": "gmail", "label": "Google Gmail"}],
            "login": "me"
        }))
        .unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.login.as_deref(), Some("me"));
    }

    #[test]
    fn test_decode_malformed_is_transport_error() {
        let err = Schema::decode(json!({"provider": 12})).unwrap_err();
        assert!(matches!(err, SettingsError::Transport(_)));
    }

    #[test]
    fn test_encode_legacy_set_config() {
        let value = Schema::Legacy.encode_set_config(&payload()).unwrap();
        assert_eq!(
            value,
            json!({
                "smtp_server": "mail.example.org",
                "smtp_port": 2525,
                "smtp_login": "me",
                "smtp_password": "secret",
                "smtp_tls": true
            })
        );
    }

    #[test]
    fn test_encode_test() {
        let current = Schema::Current.encode_test("you@example.org", &payload()).unwrap();
        assert_eq!(current["recipient"], "you@example.org");
        assert_eq!(current["provider"], "custom");

        let legacy = Schema::Legacy.encode_test("you@example.org", &payload()).unwrap();
        assert_eq!(legacy, json!({"recipient": "you@example.org"}));
    }
}
