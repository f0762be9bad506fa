use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Connection parameters resolved from the stored configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    pub port: Option<u16>,
    /// STARTTLS on a plain connection.
    pub tls: bool,
    /// Implicit TLS from the first byte.
    pub ssl: bool,
    pub login: Option<String>,
    pub password: Option<String>,
    pub sender: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub subject: String,
    /// HTML or text, wrapped in a minimal HTML document when sent.
    pub content: String,
    /// Comma separated.
    pub recipient: String,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub bcc: Option<String>,
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
    /// Overrides the configured sender.
    #[serde(default)]
    pub sender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSendResult {
    pub success: bool,
    pub message: String,
}
