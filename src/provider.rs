//! Built-in email provider presets.
//!
//! The list is fixed and ordered; `custom` is always last so every stored
//! configuration maps to some provider.

use crate::error::{Result, SettingsError};
use crate::settings::types::ProviderSummary;

pub const CUSTOM_PROVIDER_KEY: &str = "custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provider {
    pub key: &'static str,
    pub label: &'static str,
    pub server: Option<&'static str>,
    pub port: Option<u16>,
    pub tls: bool,
    pub ssl: bool,
}

impl Provider {
    pub fn is_custom(&self) -> bool {
        self.key == CUSTOM_PROVIDER_KEY
    }

    pub fn summary(&self) -> ProviderSummary {
        ProviderSummary {
            key: self.key.to_string(),
            label: self.label.to_string(),
        }
    }
}

static PROVIDERS: [Provider; 4] = [
    Provider {
        key: "gmail",
        label: "Google Gmail",
        server: Some("smtp.gmail.com"),
        port: Some(465),
        tls: false,
        ssl: true,
    },
    Provider {
        key: "yahoo",
        label: "Yahoo! Mail",
        server: Some("smtp.mail.yahoo.com"),
        port: Some(587),
        tls: true,
        ssl: false,
    },
    Provider {
        key: "outlook",
        label: "Outlook",
        server: Some("smtp-mail.outlook.com"),
        port: Some(587),
        tls: true,
        ssl: false,
    },
    Provider {
        key: CUSTOM_PROVIDER_KEY,
        label: "Custom email provider",
        server: None,
        port: None,
        tls: false,
        ssl: false,
    },
];

/// All providers, custom last.
pub fn all() -> &'static [Provider] {
    &PROVIDERS
}

pub fn custom() -> &'static Provider {
    &PROVIDERS[PROVIDERS.len() - 1]
}

pub fn find(key: &str) -> Result<&'static Provider> {
    PROVIDERS
        .iter()
        .find(|p| p.key == key)
        .ok_or_else(|| SettingsError::NotFound(key.to_string()))
}

/// Like [`find`], but unknown keys (e.g. a provider that was removed since
/// the configuration was stored) fall back to the custom provider.
pub fn resolve(key: &str) -> &'static Provider {
    match find(key) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("{e}, falling back to {CUSTOM_PROVIDER_KEY}");
            custom()
        }
    }
}

/// Infer the provider of a configuration that only records its SMTP host.
pub fn by_server(server: Option<&str>) -> &'static Provider {
    let Some(server) = server.map(str::trim).filter(|s| !s.is_empty()) else {
        return custom();
    };
    PROVIDERS
        .iter()
        .find(|p| p.server.is_some_and(|s| s.eq_ignore_ascii_case(server)))
        .unwrap_or_else(custom)
}

pub fn summaries() -> Vec<ProviderSummary> {
    PROVIDERS.iter().map(Provider::summary).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_is_last() {
        let providers = all();
        assert!(providers.last().unwrap().is_custom());
        assert_eq!(providers.iter().filter(|p| p.is_custom()).count(), 1);
    }

    #[test]
    fn test_find_unknown() {
        assert!(matches!(find("hotmail"), Err(SettingsError::NotFound(k)) if k == "hotmail"));
        assert_eq!(find("gmail").unwrap().port, Some(465));
    }

    #[test]
    fn test_resolve_falls_back_to_custom() {
        assert!(resolve("hotmail").is_custom());
        assert_eq!(resolve("yahoo").server, Some("smtp.mail.yahoo.com"));
    }

    #[test]
    fn test_by_server() {
        assert_eq!(by_server(Some("SMTP.gmail.com")).key, "gmail");
        assert!(by_server(Some("mail.example.org")).is_custom());
        assert!(by_server(Some("  ")).is_custom());
        assert!(by_server(None).is_custom());
    }

    #[test]
    fn test_summaries_keep_order() {
        let keys: Vec<String> = summaries().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["gmail", "yahoo", "outlook", "custom"]);
    }
}
