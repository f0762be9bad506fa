//! Editable form state and the rule that reconciles it when the selected
//! provider changes.

use super::types::{ConfigPayload, ModuleConfig, PortField, ProviderSummary};
use crate::provider::{self, Provider};

/// What a provider change did to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First assignment, nothing reset.
    Initial,
    Unchanged,
    /// Back to the provider of the loaded configuration: persisted values restored.
    Restored,
    /// Preset connection values filled in, credentials blanked.
    Prefilled,
    /// Everything blanked (custom provider).
    Cleared,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub provider: Option<String>,
    pub providers: Vec<ProviderSummary>,
    pub server: String,
    pub port: String,
    pub login: String,
    pub password: String,
    pub tls: bool,
    pub ssl: bool,
    pub sender: String,
    /// Only used for test sends, never persisted.
    pub recipient: String,
    loaded: Option<ModuleConfig>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last configuration confirmed by the backend.
    pub fn loaded(&self) -> Option<&ModuleConfig> {
        self.loaded.as_ref()
    }

    /// Replace the form with a configuration confirmed by the backend.
    /// Assigns the provider directly so no reset fires.
    pub fn populate(&mut self, config: ModuleConfig) {
        self.providers = if config.providers.is_empty() {
            provider::summaries()
        } else {
            config.providers.clone()
        };
        self.provider = Some(provider::resolve(&config.provider).key.to_string());
        self.fill_from(&config);
        self.loaded = Some(config);
    }

    pub fn select_provider(&mut self, key: &str) -> Transition {
        let next = provider::resolve(key);
        let previous = self.provider.replace(next.key.to_string());

        match previous {
            None => Transition::Initial,
            Some(prev) if prev == next.key => Transition::Unchanged,
            Some(prev) => {
                log::debug!("Provider changed from {prev} to {}", next.key);
                let loaded = self
                    .loaded
                    .clone()
                    .filter(|c| provider::resolve(&c.provider).key == next.key);
                match loaded {
                    Some(config) => {
                        self.fill_from(&config);
                        Transition::Restored
                    }
                    None => self.reset_for(next),
                }
            }
        }
    }

    /// Payload for `set_config`: optional fields left out when empty.
    pub fn config_payload(&self) -> ConfigPayload {
        ConfigPayload {
            provider: self.provider_key(),
            server: non_empty(&self.server),
            port: PortField::from_input(&self.port),
            login: self.login.clone(),
            password: self.password.clone(),
            tls: self.tls.then_some(true),
            ssl: self.ssl.then_some(true),
            sender: non_empty(&self.sender),
        }
    }

    /// Payload for `test`: every field sent as is.
    pub fn test_payload(&self) -> ConfigPayload {
        ConfigPayload {
            provider: self.provider_key(),
            server: Some(self.server.trim().to_string()),
            port: Some(PortField::from_input(&self.port).unwrap_or(PortField::Text(String::new()))),
            login: self.login.clone(),
            password: self.password.clone(),
            tls: Some(self.tls),
            ssl: Some(self.ssl),
            sender: Some(self.sender.trim().to_string()),
        }
    }

    fn provider_key(&self) -> String {
        self.provider
            .clone()
            .unwrap_or_else(|| provider::custom().key.to_string())
    }

    fn fill_from(&mut self, config: &ModuleConfig) {
        self.server = config.server.clone().unwrap_or_default();
        self.port = config.port.map(|p| p.to_string()).unwrap_or_default();
        self.login = config.login.clone().unwrap_or_default();
        self.password = config.password.clone().unwrap_or_default();
        self.tls = config.tls;
        self.ssl = config.ssl;
        self.sender = config.sender.clone().unwrap_or_default();
    }

    fn reset_for(&mut self, next: &Provider) -> Transition {
        // credentials never carry over to another provider
        self.login.clear();
        self.password.clear();
        self.sender.clear();
        self.recipient.clear();

        self.server = next.server.unwrap_or_default().to_string();
        self.port = next.port.map(|p| p.to_string()).unwrap_or_default();
        self.tls = next.tls;
        self.ssl = next.ssl;

        if next.is_custom() {
            Transition::Cleared
        } else {
            Transition::Prefilled
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
