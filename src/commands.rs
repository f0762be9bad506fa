use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SettingsError};
use crate::module::EmailModule;
use crate::rpc::{CommandRequest, CommandResponse};
use crate::settings::types::ConfigPayload;
use crate::smtp::OutgoingEmail;

/// Routes command requests to the modules registered under a name.
#[derive(Default)]
pub struct CommandRouter {
    modules: HashMap<String, Arc<EmailModule>>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, module: Arc<EmailModule>) {
        self.modules.insert(name.to_string(), module);
    }

    /// Router serving one module under both `email` and its former name `smtp`.
    pub fn with_email_module(module: EmailModule) -> Self {
        let module = Arc::new(module);
        let mut router = Self::new();
        router.register("email", module.clone());
        router.register("smtp", module);
        router
    }

    pub async fn dispatch(&self, request: CommandRequest) -> CommandResponse {
        let result = match self.modules.get(&request.to) {
            Some(module) => execute(module, &request.command, request.params).await,
            None => Err(SettingsError::Command(format!("Unknown module \"{}\"", request.to))),
        };
        match result {
            Ok(data) => CommandResponse::ok(data),
            Err(e) => {
                log::warn!("Command {} to {} failed: {e}", request.command, request.to);
                CommandResponse::failure(&e)
            }
        }
    }
}

#[derive(Deserialize)]
struct TestParams {
    #[serde(default)]
    recipient: String,
}

fn params<T: DeserializeOwned>(params: Value) -> Result<T> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params)
        .map_err(|e| SettingsError::Validation(format!("Invalid parameters: {e}")))
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| SettingsError::Command(e.to_string()))
}

async fn execute(module: &EmailModule, command: &str, raw: Value) -> Result<Value> {
    match command {
        "get_module_config" => to_value(module.get_module_config()?),
        "set_config" => to_value(module.set_config(params::<ConfigPayload>(raw)?)?),
        "test" => {
            // connection fields are optional: without them the stored
            // configuration is used
            let payload = if raw.get("provider").is_some() {
                Some(params::<ConfigPayload>(raw.clone())?)
            } else {
                None
            };
            let TestParams { recipient } = params(raw)?;
            to_value(module.test(&recipient, payload).await?)
        }
        "send_email" => to_value(module.send_email(params::<OutgoingEmail>(raw)?).await?),
        other => Err(SettingsError::Command(format!("Unknown command \"{other}\""))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureReason;
    use crate::module::tests::module_with;
    use crate::module::StoredConfig;
    use serde_json::json;

    fn router() -> (CommandRouter, Arc<crate::module::tests::RecordingMailer>) {
        let (module, mailer) = module_with(StoredConfig::default());
        (CommandRouter::with_email_module(module), mailer)
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (router, _) = router();
        let response = router
            .dispatch(CommandRequest::new(
                "set_config",
                "email",
                json!({
                    "provider": "custom",
                    "server": "mail.example.org",
                    "port": "2525",
                    "login": "",
                    "password": "",
                }),
            ))
            .await;
        assert_eq!(response.data, json!(true), "{}", response.message);

        let config = router
            .dispatch(CommandRequest::new("get_module_config", "smtp", Value::Null))
            .await
            .into_result()
            .unwrap();
        assert_eq!(config["server"], "mail.example.org");
        assert_eq!(config["port"], 2525);
        assert!(config.get("password").is_none());
    }

    #[tokio::test]
    async fn test_invalid_params_are_validation_failures() {
        let (router, _) = router();
        let response = router
            .dispatch(CommandRequest::new("set_config", "email", json!({"provider": 3})))
            .await;
        assert!(response.error);
        assert_eq!(response.reason, Some(FailureReason::InvalidParameter));
    }

    #[tokio::test]
    async fn test_test_command_with_full_payload() {
        let (router, mailer) = router();
        let response = router
            .dispatch(CommandRequest::new(
                "test",
                "email",
                json!({
                    "recipient": "you@example.org",
                    "provider": "custom",
                    "server": "mail.example.org",
                    "port": 25,
                    "login": "",
                    "password": "",
                    "tls": false,
                    "ssl": false,
                    "sender": "me@example.org"
                }),
            ))
            .await;
        assert_eq!(response.data, json!(true), "{}", response.message);
        assert_eq!(mailer.sent.lock().unwrap()[0].1.recipient, "you@example.org");
    }

    #[tokio::test]
    async fn test_send_email_command() {
        let (module, mailer) = module_with(StoredConfig {
            server: Some("mail.example.org".into()),
            port: Some(25),
            ..StoredConfig::default()
        });
        let router = CommandRouter::with_email_module(module);
        let response = router
            .dispatch(CommandRequest::new(
                "send_email",
                "email",
                json!({"subject": "Hi", "content": "Hello", "recipient": "you@example.org"}),
            ))
            .await;
        assert!(!response.error, "{}", response.message);
        assert_eq!(mailer.sent.lock().unwrap()[0].1.subject, "Hi");
    }

    #[tokio::test]
    async fn test_unknown_module_and_command() {
        let (router, _) = router();
        let response = router
            .dispatch(CommandRequest::new("get_module_config", "sms", Value::Null))
            .await;
        assert!(response.message.contains("Unknown module"));
        let response = router
            .dispatch(CommandRequest::new("reboot", "email", Value::Null))
            .await;
        assert_eq!(response.reason, Some(FailureReason::CommandError));
    }
}
