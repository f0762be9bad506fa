//! Email notification settings.
//!
//! The settings panel ([`panel::SettingsPanel`]) edits a [`settings::FormState`],
//! keeps it consistent with the selected [`provider`] and persists it through
//! backend commands ([`persistence::SettingsService`] over an
//! [`rpc::CommandClient`]). The backend side ([`module::EmailModule`] behind a
//! [`commands::CommandRouter`]) validates and stores the configuration and
//! sends mail with lettre.

pub mod commands;
pub mod config;
pub mod error;
pub mod module;
pub mod panel;
pub mod persistence;
pub mod provider;
pub mod rpc;
pub mod settings;
pub mod smtp;

use std::sync::Arc;
use std::time::Duration;

pub use error::{Result, SettingsError};

/// Backend served in process: a file-backed email module reachable under
/// `email` and `smtp`.
pub fn local_backend(config: &config::PanelConfig) -> Arc<commands::CommandRouter> {
    let store = Arc::new(module::FileStore::new(config.store.path.clone()));
    let mailer = Arc::new(smtp::LettreMailer::default());
    Arc::new(commands::CommandRouter::with_email_module(module::EmailModule::new(store, mailer)))
}

/// Panel talking to the backend configured in `config`. Applies the
/// configured log level.
pub fn remote_panel<N: panel::Notifier>(
    config: &config::PanelConfig,
    notifier: N,
) -> Result<panel::SettingsPanel<N>> {
    config.logging.apply();
    let client = Arc::new(rpc::HttpCommandClient::from_config(&config.backend)?);
    let service = persistence::SettingsService::from_config(client, config);
    Ok(panel::SettingsPanel::new(service, notifier))
}

/// Panel wired to an in-process backend.
pub fn local_panel<N: panel::Notifier>(
    config: &config::PanelConfig,
    notifier: N,
) -> panel::SettingsPanel<N> {
    config.logging.apply();
    let client = Arc::new(rpc::LocalCommandClient::new(
        local_backend(config),
        Duration::from_secs(config.backend.request_timeout_secs),
    ));
    let service = persistence::SettingsService::from_config(client, config);
    panel::SettingsPanel::new(service, notifier)
}
