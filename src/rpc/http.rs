use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;

use super::{CommandClient, CommandRequest, CommandResponse};
use crate::config::BackendConfig;
use crate::error::{Result, SettingsError};

/// Posts commands as JSON to `{url}/command`.
#[derive(Debug, Clone)]
pub struct HttpCommandClient {
    client: reqwest::Client,
    endpoint: String,
    default_timeout: Duration,
}

impl HttpCommandClient {
    pub fn new(url: &str, default_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SettingsError::Transport(format!("HTTP client error: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/command", url.trim_end_matches('/')),
            default_timeout,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(&config.url, Duration::from_secs(config.request_timeout_secs))
    }

    async fn post(&self, request: CommandRequest) -> Result<Value> {
        let timeout = request.timeout_or(self.default_timeout);
        log::debug!("Sending {} to {} ({}s)", request.command, request.to, timeout.as_secs());

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SettingsError::Timeout(timeout)
                } else {
                    SettingsError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SettingsError::Transport(format!("HTTP {status}")));
        }

        let body: CommandResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SettingsError::Timeout(timeout)
            } else {
                SettingsError::Transport(format!("Malformed response: {e}"))
            }
        })?;
        body.into_result()
    }
}

impl CommandClient for HttpCommandClient {
    fn send_command(&self, request: CommandRequest) -> BoxFuture<'_, Result<Value>> {
        Box::pin(self.post(request))
    }
}
