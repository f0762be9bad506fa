use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::PanelConfig;
use crate::error::{Result, SettingsError};
use crate::rpc::{CommandClient, CommandRequest};
use crate::settings::{ConfigPayload, ModuleConfig, Schema};

pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Loads and saves the email configuration through backend commands.
#[derive(Clone)]
pub struct SettingsService {
    client: Arc<dyn CommandClient>,
    module: String,
    schema: Schema,
    test_timeout: Duration,
}

impl SettingsService {
    pub fn new(client: Arc<dyn CommandClient>, module: &str) -> Self {
        Self {
            client,
            module: module.to_string(),
            schema: Schema::Current,
            test_timeout: DEFAULT_TEST_TIMEOUT,
        }
    }

    pub fn from_config(client: Arc<dyn CommandClient>, config: &PanelConfig) -> Self {
        Self::new(client, &config.backend.module)
            .with_schema(config.backend.schema)
            .with_test_timeout(Duration::from_secs(config.test.timeout_secs))
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = timeout;
        self
    }

    pub async fn load(&self) -> Result<ModuleConfig> {
        let value = self
            .client
            .send_command(CommandRequest::new("get_module_config", &self.module, Value::Null))
            .await?;
        Schema::decode(value)
    }

    /// Push a configuration then return what the backend actually stored.
    pub async fn save(&self, payload: &ConfigPayload) -> Result<ModuleConfig> {
        let params = self.schema.encode_set_config(payload)?;
        let saved = self
            .client
            .send_command(CommandRequest::new("set_config", &self.module, params))
            .await?;
        if saved == Value::Bool(false) {
            return Err(SettingsError::Command("Configuration was not saved".to_string()));
        }
        self.load().await
    }

    /// Long running: bounded by the test timeout rather than the client default.
    pub async fn send_test(&self, recipient: &str, payload: &ConfigPayload) -> Result<()> {
        let params = self.schema.encode_test(recipient, payload)?;
        let request =
            CommandRequest::new("test", &self.module, params).with_timeout(self.test_timeout);
        let sent = tokio::time::timeout(self.test_timeout, self.client.send_command(request))
            .await
            .map_err(|_| SettingsError::Timeout(self.test_timeout))??;
        match sent {
            Value::Bool(false) => {
                Err(SettingsError::Command("Test email was not sent".to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::future::BoxFuture;
    use serde_json::json;

    use super::*;

    /// Replays canned answers and records requests.
    #[derive(Default)]
    struct ScriptedClient {
        answers: Mutex<Vec<Result<Value>>>,
        requests: Mutex<Vec<CommandRequest>>,
        delay: Option<Duration>,
    }

    impl ScriptedClient {
        fn with(answers: Vec<Result<Value>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into_iter().rev().collect()),
                ..Self::default()
            })
        }
    }

    impl CommandClient for ScriptedClient {
        fn send_command(&self, request: CommandRequest) -> BoxFuture<'_, Result<Value>> {
            Box::pin(async move {
                self.requests.lock().unwrap().push(request);
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                self.answers
                    .lock()
                    .unwrap()
                    .pop()
                    .unwrap_or_else(|| Err(SettingsError::Transport("no answer".into())))
            })
        }
    }

    fn payload() -> ConfigPayload {
        ConfigPayload {
            provider: "gmail".into(),
            server: None,
            port: None,
            login: "me@gmail.com".into(),
            password: "pw".into(),
            tls: None,
            ssl: Some(true),
            sender: None,
        }
    }

    #[tokio::test]
    async fn test_load_decodes_config() {
        let client = ScriptedClient::with(vec![Ok(json!({"provider": "yahoo", "login": "me"}))]);
        let service = SettingsService::new(client.clone(), "email");
        let config = service.load().await.unwrap();
        assert_eq!(config.provider, "yahoo");
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].command, "get_module_config");
        assert_eq!(requests[0].to, "email");
    }

    #[tokio::test]
    async fn test_load_surfaces_transport_error_without_retry() {
        let client = ScriptedClient::with(vec![Err(SettingsError::Transport("refused".into()))]);
        let service = SettingsService::new(client.clone(), "email");
        assert!(matches!(service.load().await, Err(SettingsError::Transport(_))));
        assert_eq!(client.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_reloads_authoritative_value() {
        let client = ScriptedClient::with(vec![
            Ok(json!(true)),
            Ok(json!({"provider": "gmail", "login": "me@gmail.com", "ssl": true})),
        ]);
        let service = SettingsService::new(client.clone(), "email");
        let config = service.save(&payload()).await.unwrap();
        assert_eq!(config.login.as_deref(), Some("me@gmail.com"));

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].command, "set_config");
        assert_eq!(
            requests[0].params,
            json!({"provider": "gmail", "login": "me@gmail.com", "password": "pw", "ssl": true})
        );
        assert_eq!(requests[1].command, "get_module_config");
    }

    #[tokio::test]
    async fn test_save_validation_error_skips_reload() {
        let client = ScriptedClient::with(vec![Err(SettingsError::invalid("port"))]);
        let service = SettingsService::new(client.clone(), "email");
        assert!(matches!(service.save(&payload()).await, Err(SettingsError::Validation(_))));
        assert_eq!(client.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_send_test_uses_test_timeout() {
        let client = ScriptedClient::with(vec![Ok(json!(true))]);
        let service =
            SettingsService::new(client.clone(), "smtp").with_test_timeout(Duration::from_secs(45));
        service.send_test("you@example.org", &payload()).await.unwrap();
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].timeout, Some(45));
        assert_eq!(requests[0].params["recipient"], "you@example.org");
    }

    #[tokio::test]
    async fn test_send_test_false_is_failure() {
        let client = ScriptedClient::with(vec![Ok(json!(false))]);
        let service = SettingsService::new(client, "email");
        assert!(matches!(
            service.send_test("you@example.org", &payload()).await,
            Err(SettingsError::Command(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_test_times_out() {
        let client = Arc::new(ScriptedClient {
            answers: Mutex::new(vec![Ok(json!(true))]),
            delay: Some(Duration::from_secs(120)),
            ..ScriptedClient::default()
        });
        let service = SettingsService::new(client, "email");
        let err = service.send_test("you@example.org", &payload()).await.unwrap_err();
        assert!(matches!(err, SettingsError::Timeout(d) if d == DEFAULT_TEST_TIMEOUT));
    }

    #[tokio::test]
    async fn test_legacy_schema_renames_fields() {
        let client = ScriptedClient::with(vec![
            Ok(json!(true)),
            Ok(json!({"smtp_server": "smtp.gmail.com", "smtp_login": "me@gmail.com"})),
        ]);
        let service = SettingsService::new(client.clone(), "smtp").with_schema(Schema::Legacy);
        let config = service.save(&payload()).await.unwrap();
        assert_eq!(config.provider, "gmail");
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].params["smtp_login"], "me@gmail.com");
        assert!(requests[0].params.get("provider").is_none());
    }
}
