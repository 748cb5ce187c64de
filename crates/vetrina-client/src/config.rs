//! # Client Configuration
//!
//! Configuration management for the catalogue client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     VETRINA_BASE_URL=https://catalogue.example.com/api                 │
//! │     VETRINA_API_TOKEN=...                                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/vetrina/client.toml (Linux)                              │
//! │     ~/Library/Application Support/com.vetrina.vetrina/client.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Local development backend, page size 20, English, ascending        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # client.toml
//! [server]
//! base_url = "http://localhost:8888/virtus_pro/api"
//! api_token = "4c8a2f97a3f54d58b5e9e2d6d7c4a1b2"
//! request_timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [paging]
//! page_size = 20
//! default_sort = "asc"
//! default_language = "en"
//! merge_policy = "keep_all"  # keep_all | dedupe_by_key
//!
//! [endpoints]
//! categories = "categories.php"
//! subcategories = "subcategories.php"
//! products = "products.php"
//! product_detail = "product_detail.php"
//! register = "register.php"
//! login = "login.php"
//! forgot_password = "forgot-password.php"
//! reset_password = "reset-password.php"
//! update_profile = "update-profile.php"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use vetrina_core::validation::{validate_language_code, validate_page_size};
use vetrina_core::{MergePolicy, SortOrder, DEFAULT_LANGUAGE_CODE, DEFAULT_PAGE_LIMIT};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Server Settings
// =============================================================================

/// Where the catalogue backend lives and how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Base URL every endpoint path is joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Static API token sent as the `token` form field of every request.
    #[serde(default = "default_api_token")]
    pub api_token: String,

    /// Upper bound for one request, connect included (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8888/virtus_pro/api".to_string()
}

fn default_api_token() -> String {
    "4c8a2f97a3f54d58b5e9e2d6d7c4a1b2".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            base_url: default_base_url(),
            api_token: default_api_token(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Paging Settings
// =============================================================================

/// How streams page through collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingSettings {
    /// Items requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Sort used for product listings unless a caller picks one.
    #[serde(default)]
    pub default_sort: SortOrder,

    /// Storefront language at startup.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// How appended pages merge into loaded items.
    #[serde(default)]
    pub merge_policy: MergePolicy,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_LIMIT
}

fn default_language() -> String {
    DEFAULT_LANGUAGE_CODE.to_string()
}

impl Default for PagingSettings {
    fn default() -> Self {
        PagingSettings {
            page_size: default_page_size(),
            default_sort: SortOrder::default(),
            default_language: default_language(),
            merge_policy: MergePolicy::default(),
        }
    }
}

// =============================================================================
// Endpoint Paths
// =============================================================================

/// Endpoint paths relative to `server.base_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    #[serde(default = "default_categories_path")]
    pub categories: String,

    #[serde(default = "default_subcategories_path")]
    pub subcategories: String,

    #[serde(default = "default_products_path")]
    pub products: String,

    #[serde(default = "default_product_detail_path")]
    pub product_detail: String,

    #[serde(default = "default_register_path")]
    pub register: String,

    #[serde(default = "default_login_path")]
    pub login: String,

    #[serde(default = "default_forgot_password_path")]
    pub forgot_password: String,

    #[serde(default = "default_reset_password_path")]
    pub reset_password: String,

    #[serde(default = "default_update_profile_path")]
    pub update_profile: String,
}

fn default_categories_path() -> String {
    "categories.php".to_string()
}
fn default_subcategories_path() -> String {
    "subcategories.php".to_string()
}
fn default_products_path() -> String {
    "products.php".to_string()
}
fn default_product_detail_path() -> String {
    "product_detail.php".to_string()
}
fn default_register_path() -> String {
    "register.php".to_string()
}
fn default_login_path() -> String {
    "login.php".to_string()
}
fn default_forgot_password_path() -> String {
    "forgot-password.php".to_string()
}
fn default_reset_password_path() -> String {
    "reset-password.php".to_string()
}
fn default_update_profile_path() -> String {
    "update-profile.php".to_string()
}

impl Default for EndpointSettings {
    fn default() -> Self {
        EndpointSettings {
            categories: default_categories_path(),
            subcategories: default_subcategories_path(),
            products: default_products_path(),
            product_detail: default_product_detail_path(),
            register: default_register_path(),
            login: default_login_path(),
            forgot_password: default_forgot_password_path(),
            reset_password: default_reset_password_path(),
            update_profile: default_update_profile_path(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub paging: PagingSettings,

    #[serde(default)]
    pub endpoints: EndpointSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "Base URL must start with http:// or https://, got: {}",
                self.server.base_url
            )));
        }

        if self.server.api_token.trim().is_empty() {
            return Err(ClientError::InvalidConfig("api_token must not be empty".into()));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.server.connect_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        validate_page_size(self.paging.page_size)
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        validate_language_code(&self.paging.default_language)
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        for (name, path) in [
            ("categories", &self.endpoints.categories),
            ("subcategories", &self.endpoints.subcategories),
            ("products", &self.endpoints.products),
            ("product_detail", &self.endpoints.product_detail),
            ("register", &self.endpoints.register),
            ("login", &self.endpoints.login),
            ("forgot_password", &self.endpoints.forgot_password),
            ("reset_password", &self.endpoints.reset_password),
            ("update_profile", &self.endpoints.update_profile),
        ] {
            if path.trim().is_empty() {
                return Err(ClientError::InvalidConfig(format!(
                    "endpoints.{} must not be empty",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup (the process environment in
    /// production, a map in tests).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("VETRINA_BASE_URL") {
            debug!(url = %url, "Overriding base URL from environment");
            self.server.base_url = url;
        }

        // Never log the token itself
        if let Some(token) = lookup("VETRINA_API_TOKEN") {
            debug!("Overriding API token from environment");
            self.server.api_token = token;
        }

        if let Some(size) = lookup("VETRINA_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(s) => self.paging.page_size = s,
                Err(_) => warn!(value = %size, "Ignoring non-numeric VETRINA_PAGE_SIZE"),
            }
        }

        if let Some(lang) = lookup("VETRINA_LANG") {
            debug!(lang = %lang, "Overriding default language from environment");
            self.paging.default_language = lang;
        }

        if let Some(sort) = lookup("VETRINA_SORT") {
            match sort.parse::<SortOrder>() {
                Ok(s) => self.paging.default_sort = s,
                Err(_) => warn!(value = %sort, "Unknown sort order in environment"),
            }
        }

        if let Some(timeout) = lookup("VETRINA_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(t) => self.server.request_timeout_secs = t,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric VETRINA_TIMEOUT_SECS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "vetrina", "vetrina")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Parses the base URL, guaranteeing a trailing slash so endpoint paths
    /// join under it instead of replacing its last segment.
    pub fn base_url(&self) -> ClientResult<Url> {
        let raw = self.server.base_url.trim();
        if raw.is_empty() {
            return Err(ClientError::InvalidUrl("base_url must not be empty".into()));
        }

        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.server.connect_timeout_secs)
    }

    pub fn page_size(&self) -> u32 {
        self.paging.page_size
    }

    /// Returns a copy with the token masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.server.api_token = "********".to_string();
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.server.base_url, "http://localhost:8888/virtus_pro/api");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.paging.page_size, 20);
        assert_eq!(config.paging.default_sort, SortOrder::Asc);
        assert_eq!(config.paging.default_language, "en");
        assert_eq!(config.paging.merge_policy, MergePolicy::KeepAll);
        assert_eq!(config.endpoints.products, "products.php");
        assert_eq!(config.endpoints.forgot_password, "forgot-password.php");
        assert_eq!(config.endpoints.update_profile, "update-profile.php");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::default();
        let url = config.base_url().unwrap();
        assert_eq!(url.as_str(), "http://localhost:8888/virtus_pro/api/");
        assert_eq!(
            url.join("categories.php").unwrap().as_str(),
            "http://localhost:8888/virtus_pro/api/categories.php"
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.server.base_url = "ftp://catalogue".to_string();
        assert!(matches!(config.validate(), Err(ClientError::InvalidUrl(_))));

        config.server.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config = ClientConfig::default();
        config.paging.page_size = 0;
        assert!(matches!(config.validate(), Err(ClientError::InvalidConfig(_))));

        config = ClientConfig::default();
        config.paging.default_language = "xx".to_string();
        assert!(config.validate().is_err());

        config = ClientConfig::default();
        config.server.api_token = "  ".to_string();
        assert!(config.validate().is_err());

        config = ClientConfig::default();
        config.endpoints.categories = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = ClientConfig::default();
        config.apply_overrides(lookup(&[
            ("VETRINA_BASE_URL", "https://catalogue.example.com/api"),
            ("VETRINA_API_TOKEN", "secret"),
            ("VETRINA_PAGE_SIZE", "50"),
            ("VETRINA_LANG", "it"),
            ("VETRINA_SORT", "desc"),
            ("VETRINA_TIMEOUT_SECS", "5"),
        ]));

        assert_eq!(config.server.base_url, "https://catalogue.example.com/api");
        assert_eq!(config.server.api_token, "secret");
        assert_eq!(config.paging.page_size, 50);
        assert_eq!(config.paging.default_language, "it");
        assert_eq!(config.paging.default_sort, SortOrder::Desc);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_overrides_are_ignored() {
        let mut config = ClientConfig::default();
        config.apply_overrides(lookup(&[
            ("VETRINA_PAGE_SIZE", "lots"),
            ("VETRINA_SORT", "sideways"),
        ]));
        assert_eq!(config.paging.page_size, 20);
        assert_eq!(config.paging.default_sort, SortOrder::Asc);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [server]
            base_url = "https://shop.example.com/api/"

            [paging]
            merge_policy = "dedupe_by_key"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.base_url, "https://shop.example.com/api/");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.paging.merge_policy, MergePolicy::DedupeByKey);
        assert_eq!(config.endpoints.product_detail, "product_detail.php");
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&ClientConfig::default()).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[paging]"));
        assert!(toml_str.contains("merge_policy = \"keep_all\""));
    }

    #[test]
    fn test_redacted_hides_token() {
        let config = ClientConfig::default().redacted();
        assert_eq!(config.server.api_token, "********");
    }
}
