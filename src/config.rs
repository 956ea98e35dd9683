//! Layered TOML configuration with validation.

use crate::api::Endpoints;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
/// Variable name the web build of the dashboard used; still honored.
pub const LEGACY_BASE_URL_ENV: &str = "VITE_API_BASE_URL";

const CONFIG_DIR: &str = ".admindesk";

static HTTP_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/]+").unwrap());

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// `[api]` section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Name of the env var holding a bearer token
    #[serde(default)]
    pub token_env: Option<String>,
}

/// `[endpoints]` section: `version` plus per-key path overrides
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EndpointsConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(flatten)]
    pub paths: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfirmConfig {
    #[serde(default)]
    pub assume_yes: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuditConfig {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub confirm: ConfirmConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.admindesk/config.local.toml) > project (.admindesk/config.toml)
    /// > user (~/.admindesk/config.toml) > built-in defaults
    pub fn load() -> Result<Self> {
        Self::load_layered(dirs::home_dir().as_deref(), Path::new("."))
    }

    pub fn load_layered(home: Option<&Path>, project: &Path) -> Result<Self> {
        let mut config = Self::default();

        let mut layers = Vec::new();
        if let Some(home) = home {
            layers.push(home.join(CONFIG_DIR).join("config.toml"));
        }
        layers.push(project.join(CONFIG_DIR).join("config.toml"));
        // Should be gitignored
        layers.push(project.join(CONFIG_DIR).join("config.local.toml"));

        for path in layers {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config layer");
                config.merge(Self::load_from(&path)?);
            }
        }

        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes priority).
    /// Scalars are overridden if set; endpoint overrides merge per key.
    pub fn merge(&mut self, other: Config) {
        if other.api.base_url.is_some() {
            self.api.base_url = other.api.base_url;
        }
        if other.api.timeout_ms.is_some() {
            self.api.timeout_ms = other.api.timeout_ms;
        }
        if other.api.token_env.is_some() {
            self.api.token_env = other.api.token_env;
        }

        if other.endpoints.version.is_some() {
            self.endpoints.version = other.endpoints.version;
        }
        for (key, path) in other.endpoints.paths {
            self.endpoints.paths.insert(key, path);
        }

        if other.confirm.assume_yes.is_some() {
            self.confirm.assume_yes = other.confirm.assume_yes;
        }
        if other.audit.enabled.is_some() {
            self.audit.enabled = other.audit.enabled;
        }
        if other.audit.dir.is_some() {
            self.audit.dir = other.audit.dir;
        }
        if other.profile.path.is_some() {
            self.profile.path = other.profile.path;
        }
    }

    /// Apply the base URL from flags or the environment, which beats every file.
    pub fn override_base_url(&mut self, flag_or_env: Option<String>) {
        let url = flag_or_env.or_else(|| std::env::var(LEGACY_BASE_URL_ENV).ok());
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = Some(url);
        }
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.api.timeout_ms.unwrap_or(30_000)
    }

    /// Bearer token read from the env var named by `api.token_env`.
    pub fn bearer_token(&self) -> Option<String> {
        let var = self.api.token_env.as_ref()?;
        std::env::var(var).ok().filter(|t| !t.is_empty())
    }

    pub fn assume_yes(&self) -> bool {
        self.confirm.assume_yes.unwrap_or(false)
    }

    pub fn audit_enabled(&self) -> bool {
        self.audit.enabled.unwrap_or(true)
    }

    pub fn audit_dir(&self) -> Option<PathBuf> {
        self.audit
            .dir
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(CONFIG_DIR).join("audit")))
    }

    pub fn profile_path(&self) -> Option<PathBuf> {
        self.profile
            .path
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(CONFIG_DIR).join("profile")))
    }

    /// Endpoint table with overrides applied.
    pub fn endpoint_table(&self) -> Result<Endpoints, String> {
        Endpoints::from_overrides(self.endpoints.version.as_deref(), &self.endpoints.paths)
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !HTTP_URL.is_match(self.base_url()) {
            errors.push(ValidationError {
                field: "api.base_url".to_string(),
                message: format!("Expected an http(s) URL, got '{}'", self.base_url()),
            });
        }

        if self.timeout_ms() == 0 {
            errors.push(ValidationError {
                field: "api.timeout_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        match self.endpoint_table() {
            Ok(endpoints) => {
                for (key, path) in endpoints.entries() {
                    if !path.starts_with('/') {
                        errors.push(ValidationError {
                            field: format!("endpoints.{}", key),
                            message: format!("Path must start with '/', got '{}'", path),
                        });
                    } else if Endpoints::is_prefix(key) && !path.ends_with('/') {
                        errors.push(ValidationError {
                            field: format!("endpoints.{}", key),
                            message: format!("Prefix path must end with '/', got '{}'", path),
                        });
                    }
                }
            }
            Err(message) => errors.push(ValidationError {
                field: "endpoints".to_string(),
                message,
            }),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout_ms(), 30_000);
        assert!(!config.assume_yes());
        assert!(config.audit_enabled());
        assert_eq!(config.endpoint_table().unwrap(), Endpoints::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_layers_override_in_order() {
        let home = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        write(
            &home.path().join(".admindesk/config.toml"),
            "[api]\nbase_url = \"https://user.example.com\"\ntimeout_ms = 5000\n\n[endpoints]\nproducts = \"/api/v0/products\"\n",
        );
        write(
            &project.path().join(".admindesk/config.toml"),
            "[api]\nbase_url = \"https://project.example.com\"\n\n[endpoints]\ncreate_product = \"/api/products/add\"\n",
        );
        write(
            &project.path().join(".admindesk/config.local.toml"),
            "[confirm]\nassume_yes = true\n",
        );

        let config = Config::load_layered(Some(home.path()), project.path()).unwrap();
        assert_eq!(config.base_url(), "https://project.example.com");
        assert_eq!(config.timeout_ms(), 5000);
        assert!(config.assume_yes());

        let endpoints = config.endpoint_table().unwrap();
        assert_eq!(endpoints.products, "/api/v0/products");
        assert_eq!(endpoints.create_product, "/api/products/add");
        assert_eq!(endpoints.users, "/api/users");
    }

    #[test]
    fn test_missing_layers_are_skipped() {
        let project = tempfile::tempdir().unwrap();
        let config = Config::load_layered(None, project.path()).unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_malformed_layer_is_an_error() {
        let project = tempfile::tempdir().unwrap();
        write(
            &project.path().join(".admindesk/config.toml"),
            "[api\nbase_url=",
        );
        assert!(Config::load_layered(None, project.path()).is_err());
    }

    #[test]
    fn test_flag_beats_files() {
        let mut config = Config::default();
        config.api.base_url = Some("https://file.example.com".to_string());
        config.override_base_url(Some("https://flag.example.com".to_string()));
        assert_eq!(config.base_url(), "https://flag.example.com");
    }

    #[test]
    fn test_validate_bad_url_and_timeout() {
        let mut config = Config::default();
        config.api.base_url = Some("localhost:3000".to_string());
        config.api.timeout_ms = Some(0);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "api.base_url");
        assert_eq!(errors[1].field, "api.timeout_ms");
    }

    #[test]
    fn test_validate_endpoint_paths() {
        let mut config = Config::default();
        config
            .endpoints
            .paths
            .insert("products".to_string(), "api/products".to_string());
        config
            .endpoints
            .paths
            .insert("user".to_string(), "/api/users".to_string());
        let errors = config.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["endpoints.user", "endpoints.products"]);
        assert!(errors[0].message.contains("end with '/'"));
    }

    #[test]
    fn test_validate_unknown_endpoint_key() {
        let mut config = Config::default();
        config
            .endpoints
            .paths
            .insert("prodcuts".to_string(), "/api/products".to_string());
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("prodcuts"));
    }

    #[test]
    fn test_bearer_token_from_named_env() {
        let mut config = Config::default();
        assert!(config.bearer_token().is_none());
        config.api.token_env = Some("ADMINDESK_TEST_TOKEN_UNSET_VAR".to_string());
        assert!(config.bearer_token().is_none());
    }
}
