use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    /// A field was rejected, either locally or by the backend.
    #[error("{0}")]
    Validation(String),

    #[error("Backend unreachable: {0}")]
    Transport(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Unknown provider \"{0}\"")]
    NotFound(String),

    /// Failure reported by the backend module itself.
    #[error("{0}")]
    Command(String),

    #[error("Another request is already in progress")]
    Busy,

    #[error("Config storage error: {0}")]
    Storage(String),
}

pub type Result<T, E = SettingsError> = std::result::Result<T, E>;

impl SettingsError {
    pub fn missing(name: &str) -> Self {
        SettingsError::Validation(format!("Parameter \"{name}\" is missing"))
    }

    pub fn invalid(name: &str) -> Self {
        SettingsError::Validation(format!("Parameter \"{name}\" is invalid"))
    }

    /// Reason carried over the command wire so the client can rebuild the
    /// right variant.
    pub fn reason(&self) -> FailureReason {
        match self {
            SettingsError::Validation(_) | SettingsError::NotFound(_) => {
                FailureReason::InvalidParameter
            }
            _ => FailureReason::CommandError,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for SettingsError {
    fn from(e: reqwest::Error) -> Self {
        SettingsError::Transport(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InvalidParameter,
    CommandError,
}
