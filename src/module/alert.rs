//! `alert.email.send` events rendered as emails.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SettingsError};

pub const ALERT_EVENT_NAME: &str = "alert.email.send";

const ALERT_KEYS: [&str; 4] = ["subject", "message", "recipients", "attachment"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AlertEmail {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub attachment: Option<String>,
}

impl AlertEmail {
    /// Parse event parameters, rejecting keys the event does not define.
    pub fn from_event(params: &Value) -> Result<Self> {
        let obj = params.as_object().ok_or_else(|| {
            SettingsError::Validation(format!("Invalid {ALERT_EVENT_NAME} parameters"))
        })?;
        if let Some(key) = obj.keys().find(|k| !ALERT_KEYS.contains(&k.as_str())) {
            return Err(SettingsError::Validation(format!(
                "Unexpected {ALERT_EVENT_NAME} parameter \"{key}\""
            )));
        }
        serde_json::from_value(params.clone()).map_err(|e| SettingsError::Validation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_event() {
        let alert = AlertEmail::from_event(&json!({
            "subject": "Motion",
            "message": "Motion detected in garage",
            "recipients": ["me@example.org"]
        }))
        .unwrap();
        assert_eq!(alert.subject, "Motion");
        assert_eq!(alert.recipients, vec!["me@example.org"]);
        assert_eq!(alert.attachment, None);
    }

    #[test]
    fn test_from_event_rejects_unknown_keys() {
        let err = AlertEmail::from_event(&json!({"subject": "x", "priority": 1})).unwrap_err();
        assert!(err.to_string().contains("priority"));
        assert!(AlertEmail::from_event(&json!("x")).is_err());
    }
}
