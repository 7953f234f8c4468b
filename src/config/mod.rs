//! Configuration loading
//!
//! Settings come from an optional TOML file in the platform config directory
//! and are overridden by environment variables (the way the deployment hands
//! over its secrets).

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::{DEFAULT_AUTHORITY, DEFAULT_SCOPE, DEFAULT_TENANT};
use crate::models::non_blank;

pub const DEFAULT_GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_BIND: &str = "0.0.0.0:8787";

/// Application configuration
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Azure app registration client id
    pub client_id: Option<String>,
    /// Client secret (confidential clients only)
    pub client_secret: Option<String>,
    /// Long-lived refresh token for the site owner's account
    pub refresh_token: Option<String>,
    /// Azure AD tenant (default: consumers)
    pub tenant: Option<String>,
    /// OAuth scopes, space separated
    pub scope: Option<String>,
    /// Trip -> OneDrive share URL mapping (JSON stored as string for TOML compat)
    pub trip_share_urls_json: Option<String>,
    /// Graph API base URL
    pub graph_base_url: Option<String>,
    /// Identity platform base URL
    pub authority_url: Option<String>,
    /// Origin used for photo links instead of the request's Host
    pub public_origin: Option<String>,
    /// Listen address for `serve`
    pub bind: Option<String>,
}

/// Environment variables that override the file, in load order.
const ENV_KEYS: &[&str] = &[
    "MS_CLIENT_ID",
    "MS_CLIENT_SECRET",
    "MS_REFRESH_TOKEN",
    "MS_TENANT",
    "MS_SCOPE",
    "TRIP_SHARE_URLS_JSON",
    "GRAPH_BASE_URL",
    "MS_AUTHORITY_URL",
    "PUBLIC_ORIGIN",
    "WANDER_BIND",
];

fn setting(value: &Option<String>) -> Option<String> {
    non_blank(value.as_deref()).map(String::from)
}

fn setting_or(value: &Option<String>, default: &str) -> String {
    setting(value).unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "wander-photos", "wander-photos")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration: `path` (or the default file, if present), then
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Override settings with non-blank values from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in ENV_KEYS {
            let Some(value) = lookup(key) else { continue };
            if non_blank(Some(value.as_str())).is_none() {
                continue;
            }
            if let Some(field) = self.env_field(key) {
                tracing::debug!("Config override from {}", key);
                *field = Some(value);
            }
        }
    }

    fn env_field(&mut self, key: &str) -> Option<&mut Option<String>> {
        let field = match key {
            "MS_CLIENT_ID" => &mut self.client_id,
            "MS_CLIENT_SECRET" => &mut self.client_secret,
            "MS_REFRESH_TOKEN" => &mut self.refresh_token,
            "MS_TENANT" => &mut self.tenant,
            "MS_SCOPE" => &mut self.scope,
            "TRIP_SHARE_URLS_JSON" => &mut self.trip_share_urls_json,
            "GRAPH_BASE_URL" => &mut self.graph_base_url,
            "MS_AUTHORITY_URL" => &mut self.authority_url,
            "PUBLIC_ORIGIN" => &mut self.public_origin,
            "WANDER_BIND" => &mut self.bind,
            _ => return None,
        };
        Some(field)
    }

    pub fn client_id(&self) -> Option<String> {
        setting(&self.client_id)
    }

    pub fn client_secret(&self) -> Option<String> {
        setting(&self.client_secret)
    }

    pub fn refresh_token(&self) -> Option<String> {
        setting(&self.refresh_token)
    }

    pub fn tenant(&self) -> String {
        setting_or(&self.tenant, DEFAULT_TENANT)
    }

    pub fn scope(&self) -> String {
        setting_or(&self.scope, DEFAULT_SCOPE)
    }

    /// Raw trip mapping, `""` when unset.
    pub fn trip_share_urls_json(&self) -> String {
        setting_or(&self.trip_share_urls_json, "")
    }

    pub fn graph_base_url(&self) -> String {
        setting_or(&self.graph_base_url, DEFAULT_GRAPH_BASE)
    }

    pub fn authority_url(&self) -> String {
        setting_or(&self.authority_url, DEFAULT_AUTHORITY)
    }

    pub fn public_origin(&self) -> Option<String> {
        setting(&self.public_origin)
    }

    pub fn bind(&self) -> String {
        setting_or(&self.bind, DEFAULT_BIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tenant(), "consumers");
        assert_eq!(config.scope(), "Files.Read offline_access");
        assert_eq!(config.graph_base_url(), "https://graph.microsoft.com/v1.0");
        assert_eq!(config.authority_url(), "https://login.microsoftonline.com");
        assert_eq!(config.bind(), "0.0.0.0:8787");
        assert_eq!(config.trip_share_urls_json(), "");
        assert!(config.client_id().is_none());
        assert!(config.public_origin().is_none());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = Config {
            tenant: Some("   ".to_string()),
            client_id: Some("".to_string()),
            refresh_token: Some("  rt  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.tenant(), "consumers");
        assert!(config.client_id().is_none());
        assert_eq!(config.refresh_token().as_deref(), Some("rt"));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config: Config = toml::from_str(
            r#"
            client_id = "from-file"
            tenant = "organizations"
            trip_share_urls_json = '{"peru": "https://1drv.ms/f/s!peru"}'
            "#,
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            ("MS_CLIENT_ID", "from-env"),
            ("MS_REFRESH_TOKEN", "rt-env"),
            ("MS_TENANT", "  "),
        ]
        .into_iter()
        .collect();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.client_id().as_deref(), Some("from-env"));
        assert_eq!(config.refresh_token().as_deref(), Some("rt-env"));
        // Blank env values do not clobber the file.
        assert_eq!(config.tenant(), "organizations");
        assert!(config.trip_share_urls_json().contains("peru"));
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = std::env::temp_dir().join(format!("wander-photos-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.toml");
        fs::write(&path, "client_id = [").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
