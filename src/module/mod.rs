//! Backend email module: stores the SMTP configuration and sends mail with it.

pub mod alert;
pub mod store;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, SettingsError};
use crate::provider;
use crate::settings::types::{ConfigPayload, ModuleConfig};
use crate::smtp::{Mailer, OutgoingEmail, SmtpConfig};

pub use alert::AlertEmail;
pub use store::{ConfigStore, FileStore, MemoryStore, StoredConfig};

const TEST_SUBJECT: &str = "Test email";
const TEST_CONTENT: &str = "Hello,<br><br>If you received this message, your email notification settings are working.";

pub struct EmailModule {
    store: Arc<dyn ConfigStore>,
    mailer: Arc<dyn Mailer>,
}

impl EmailModule {
    pub fn new(store: Arc<dyn ConfigStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Stored configuration with the provider list. The password is never
    /// returned.
    pub fn get_module_config(&self) -> Result<ModuleConfig> {
        let stored = self.store.load()?;
        Ok(ModuleConfig {
            provider: stored.provider,
            providers: provider::summaries(),
            server: stored.server,
            port: stored.port,
            login: stored.login,
            password: None,
            tls: stored.tls,
            ssl: stored.ssl,
            sender: stored.sender,
        })
    }

    pub fn set_config(&self, payload: ConfigPayload) -> Result<bool> {
        let stored = self.store.load()?;
        let config = candidate(payload, &stored, true)?;
        resolve(&config)?;
        self.store.save(&config)?;
        log::info!("Email configuration saved (provider {})", config.provider);
        Ok(true)
    }

    /// Send a test email, with the given (possibly unsaved) configuration or
    /// the stored one.
    pub async fn test(&self, recipient: &str, payload: Option<ConfigPayload>) -> Result<bool> {
        if recipient.trim().is_empty() {
            return Err(SettingsError::Validation("Recipient parameter is missing".to_string()));
        }
        let stored = self.store.load()?;
        let config = match payload {
            Some(payload) => candidate(payload, &stored, false)?,
            None => stored,
        };
        let smtp = resolve(&config)?;
        let email = OutgoingEmail {
            subject: TEST_SUBJECT.to_string(),
            content: TEST_CONTENT.to_string(),
            recipient: recipient.trim().to_string(),
            ..OutgoingEmail::default()
        };
        self.deliver(&smtp, &email).await
    }

    pub async fn send_email(&self, email: OutgoingEmail) -> Result<bool> {
        for (name, value) in [
            ("subject", &email.subject),
            ("content", &email.content),
            ("recipient", &email.recipient),
        ] {
            if value.trim().is_empty() {
                return Err(SettingsError::missing(name));
            }
        }
        if email.sender.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(SettingsError::invalid("sender"));
        }

        let smtp = resolve(&self.store.load()?)?;
        self.deliver(&smtp, &email).await
    }

    /// Handle a raised event. Only `alert.email.send` is consumed; returns
    /// whether an email went out.
    pub async fn on_event(&self, name: &str, params: &Value) -> bool {
        if name != alert::ALERT_EVENT_NAME {
            log::debug!("Email module ignores event {name}");
            return false;
        }
        match AlertEmail::from_event(params) {
            Ok(alert) => self.on_alert(&alert).await,
            Err(e) => {
                log::warn!("Alert through email not sent: {e}");
                false
            }
        }
    }

    /// Render an alert as an email. Failures are logged, not raised.
    pub async fn on_alert(&self, alert: &AlertEmail) -> bool {
        let recipient = if alert.recipients.is_empty() {
            match self.store.load() {
                Ok(stored) => stored.sender.or(stored.login).unwrap_or_default(),
                Err(e) => {
                    log::warn!("Alert through email not sent: {e}");
                    return false;
                }
            }
        } else {
            alert.recipients.join(",")
        };

        let email = OutgoingEmail {
            subject: alert.subject.clone(),
            content: alert.message.clone(),
            recipient,
            attachments: alert
                .attachment
                .iter()
                .filter(|a| !a.is_empty())
                .map(PathBuf::from)
                .collect(),
            ..OutgoingEmail::default()
        };
        match self.send_email(email).await {
            Ok(sent) => sent,
            Err(e) => {
                log::warn!("Alert through email not sent: {e}");
                false
            }
        }
    }

    async fn deliver(&self, smtp: &SmtpConfig, email: &OutgoingEmail) -> Result<bool> {
        let result = self
            .mailer
            .send(smtp, email)
            .await
            .map_err(|e| SettingsError::Command(e.to_string()))?;
        log::info!("{} to {}", result.message, email.recipient);
        Ok(result.success)
    }
}

fn text(value: Option<String>, name: &str, strict: bool) -> Result<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() && strict => Err(SettingsError::Validation(format!(
            "Parameter \"{name}\" must not be empty"
        ))),
        Some(v) if v.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Turn command parameters into a configuration. `strict` rejects empty
/// optional strings instead of treating them as absent.
fn candidate(payload: ConfigPayload, stored: &StoredConfig, strict: bool) -> Result<StoredConfig> {
    let provider = provider::find(&payload.provider)
        .map_err(|_| SettingsError::Validation("Provider must be chosen from list".to_string()))?;

    let port = match &payload.port {
        Some(port) => port.validate()?,
        None => None,
    };
    let login = Some(payload.login.trim().to_string()).filter(|l| !l.is_empty());

    // The backend never hands the password out, so an unchanged account keeps
    // its stored one.
    let password = if payload.password.is_empty()
        && stored.provider == provider.key
        && stored.login == login
    {
        stored.password.clone()
    } else {
        Some(payload.password).filter(|p| !p.is_empty())
    };

    Ok(StoredConfig {
        provider: provider.key.to_string(),
        server: text(payload.server, "server", strict)?,
        port,
        login,
        password,
        tls: payload.tls.unwrap_or(false),
        ssl: payload.ssl.unwrap_or(false),
        sender: text(payload.sender, "sender", strict)?,
    })
}

/// Connection parameters to actually use: presets for known providers,
/// stored values for custom ones.
fn resolve(config: &StoredConfig) -> Result<SmtpConfig> {
    let provider = provider::resolve(&config.provider);

    if provider.is_custom() {
        let (Some(server), Some(port)) = (config.server.clone(), config.port) else {
            return Err(SettingsError::Validation(
                "Server/port address must be configured when using custom provider".to_string(),
            ));
        };
        return Ok(SmtpConfig {
            server,
            port: Some(port),
            tls: config.tls,
            ssl: config.ssl,
            login: config.login.clone(),
            password: config.password.clone(),
            sender: config.sender.clone(),
        });
    }

    if config.login.is_none() || config.password.is_none() {
        return Err(SettingsError::Validation(
            "Credentials must be specified with chosen provider".to_string(),
        ));
    }
    Ok(SmtpConfig {
        server: provider.server.unwrap_or_default().to_string(),
        port: provider.port,
        tls: provider.tls,
        ssl: provider.ssl,
        login: config.login.clone(),
        password: config.password.clone(),
        sender: config.sender.clone(),
    })
}
