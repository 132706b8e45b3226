//! CLI configuration.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use shop_commerce::webhook::DEFAULT_TOLERANCE_SECS;
use shop_commerce::DEFAULT_BACKEND_URL;

/// Config file names searched for, in order, from the working directory up.
pub const CONFIG_NAMES: [&str; 3] = ["shop.toml", ".shop.toml", "shop.json"];

pub const ENV_BACKEND_URL: &str = "SHOP_BACKEND_URL";
pub const ENV_SITE_ORIGIN: &str = "SHOP_SITE_ORIGIN";
pub const ENV_STORAGE_DIR: &str = "SHOP_STORAGE_DIR";
pub const ENV_WEBHOOK_SECRET: &str = "SHOP_WEBHOOK_SECRET";

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Storefront backend.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Storefront site, for checkout return URLs.
    #[serde(default)]
    pub site: SiteConfig,

    /// Client-side store.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Webhook verification.
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }

    /// Apply `SHOP_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_BACKEND_URL) {
            self.backend.url = url;
        }
        if let Some(origin) = get(ENV_SITE_ORIGIN) {
            self.site.origin = origin;
        }
        if let Some(dir) = get(ENV_STORAGE_DIR) {
            self.storage.dir = Some(dir);
        }
        if let Some(secret) = get(ENV_WEBHOOK_SECRET) {
            self.webhook.secret = Some(secret);
        }
    }

    /// Directory of the file store.
    pub fn storage_dir(&self) -> PathBuf {
        match &self.storage.dir {
            Some(dir) => PathBuf::from(dir),
            None => default_storage_dir(),
        }
    }

    /// Read a value by dot-separated key.
    pub fn get(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["backend", "url"] => Ok(self.backend.url.clone()),
            ["site", "origin"] => Ok(self.site.origin.clone()),
            ["storage", "dir"] => Ok(self.storage_dir().display().to_string()),
            ["webhook", "tolerance_secs"] => Ok(self.webhook.tolerance_secs.to_string()),
            _ => bail!("Unknown config key: {}", key),
        }
    }

    /// Set a value by dot-separated key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["backend", "url"] => self.backend.url = value.to_string(),
            ["site", "origin"] => self.site.origin = value.to_string(),
            ["storage", "dir"] => self.storage.dir = Some(value.to_string()),
            ["webhook", "tolerance_secs"] => {
                self.webhook.tolerance_secs = value
                    .parse()
                    .with_context(|| format!("Not a number of seconds: {}", value))?
            }
            _ => bail!("Unknown or read-only config key: {}", key),
        }

        Ok(())
    }

    /// Problems that make the config unusable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (key, url) in [("backend.url", &self.backend.url), ("site.origin", &self.site.origin)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(format!("{} must be an http(s) URL, got '{}'", key, url));
            }
        }
        errors
    }
}

/// Backend connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
        }
    }
}

/// Storefront site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteConfig {
    #[serde(default = "default_origin")]
    pub origin: String,
}

fn default_origin() -> String {
    "http://localhost:3000".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

/// Client-side store location.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Defaults to `~/.local/share/shop-cli/store`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Webhook verification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookConfig {
    /// Endpoint secret. Normally supplied through the environment.
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,

    /// Allowed signature age; 0 disables the check.
    #[serde(default = "default_tolerance")]
    pub tolerance_secs: u64,
}

impl WebhookConfig {
    pub fn tolerance(&self) -> Option<u64> {
        (self.tolerance_secs > 0).then_some(self.tolerance_secs)
    }
}

fn default_tolerance() -> u64 {
    DEFAULT_TOLERANCE_SECS
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            tolerance_secs: default_tolerance(),
        }
    }
}

/// Get the platform-specific data directory.
fn data_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        PathBuf::from("/tmp")
    }
}

fn default_storage_dir() -> PathBuf {
    data_dir().join("shop-cli").join("store")
}

/// Generate a default shop.toml config file.
pub fn generate_default_config() -> String {
    format!(
        r#"# Storefront client configuration

[backend]
url = "{backend}"

[site]
# Base of the checkout success/cancel pages
origin = "{origin}"

[storage]
# dir = "{storage}"

[webhook]
# The endpoint secret is read from {secret_env}; 0 disables the age check
tolerance_secs = {tolerance}
"#,
        backend = DEFAULT_BACKEND_URL,
        origin = default_origin(),
        storage = default_storage_dir().display(),
        secret_env = ENV_WEBHOOK_SECRET,
        tolerance = DEFAULT_TOLERANCE_SECS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.backend.url, "http://127.0.0.1:8000");
        assert_eq!(config.webhook.tolerance(), Some(300));
        assert!(config.storage_dir().ends_with("shop-cli/store"));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_generated_config_parses() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config: CliConfig = toml::from_str("[site]\norigin = \"https://shop.example\"\n").unwrap();
        assert_eq!(config.site.origin, "https://shop.example");
        assert_eq!(config.backend.url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://api.test"),
            (ENV_STORAGE_DIR, "/tmp/store"),
            (ENV_WEBHOOK_SECRET, "whsec_1"),
            (ENV_SITE_ORIGIN, "  "),
        ]
        .into_iter()
        .collect();

        let mut config = CliConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.backend.url, "http://api.test");
        assert_eq!(config.storage_dir(), PathBuf::from("/tmp/store"));
        assert_eq!(config.webhook.secret.as_deref(), Some("whsec_1"));
        // Blank values are ignored
        assert_eq!(config.site.origin, "http://localhost:3000");
    }

    #[test]
    fn test_secret_never_written() {
        let mut config = CliConfig::default();
        config.webhook.secret = Some("whsec_1".to_string());
        let written = toml::to_string_pretty(&config).unwrap();
        assert!(!written.contains("whsec_1"));
    }

    #[test]
    fn test_get_set() {
        let mut config = CliConfig::default();
        config.set("backend.url", "https://api.shop").unwrap();
        config.set("webhook.tolerance_secs", "0").unwrap();

        assert_eq!(config.get("backend.url").unwrap(), "https://api.shop");
        assert_eq!(config.get("webhook.tolerance_secs").unwrap(), "0");
        assert_eq!(config.webhook.tolerance(), None);
        assert!(config.set("webhook.tolerance_secs", "soon").is_err());
        assert!(config.get("nope.key").is_err());
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.json");
        let path = path.to_str().unwrap();

        let mut config = CliConfig::default();
        config.site.origin = "https://shop.example".to_string();
        config.save(path).unwrap();

        assert_eq!(CliConfig::load(path).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let mut config = CliConfig::default();
        config.backend.url = "localhost:8000".to_string();
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("backend.url"));
    }
}
