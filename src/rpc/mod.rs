//! Remote command plumbing: the envelope exchanged with backend modules and
//! the client seam used by the settings service.

pub mod http;
pub mod local;

use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FailureReason, Result, SettingsError};

pub use http::HttpCommandClient;
pub use local::LocalCommandClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    /// Target module name.
    pub to: String,
    #[serde(default)]
    pub params: Value,
    /// Seconds; `None` means the client default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl CommandRequest {
    pub fn new(command: &str, to: &str, params: Value) -> Self {
        Self {
            command: command.to_string(),
            to: to.to_string(),
            params,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.as_secs().max(1));
        self
    }

    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.map_or(default, Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub error: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
}

impl CommandResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            error: false,
            message: String::new(),
            data,
            reason: None,
        }
    }

    pub fn failure(err: &SettingsError) -> Self {
        Self {
            error: true,
            message: err.to_string(),
            data: Value::Null,
            reason: Some(err.reason()),
        }
    }

    pub fn into_result(self) -> Result<Value> {
        if !self.error {
            return Ok(self.data);
        }
        Err(match self.reason {
            Some(FailureReason::InvalidParameter) => SettingsError::Validation(self.message),
            _ => SettingsError::Command(self.message),
        })
    }
}

/// Sends a named command to a backend module.
pub trait CommandClient: Send + Sync {
    fn send_command(&self, request: CommandRequest) -> BoxFuture<'_, Result<Value>>;
}
