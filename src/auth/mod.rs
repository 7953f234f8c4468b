//! Authentication against the Microsoft identity platform
//!
//! The proxy holds a long-lived refresh token (issued out of band for the
//! site owner's OneDrive account) and trades it for short-lived Graph access
//! tokens on demand.

pub mod oauth;
pub mod tokens;

pub use oauth::{status, TokenError, TokenProvider};

use crate::config::Config;

pub const DEFAULT_TENANT: &str = "consumers";
pub const DEFAULT_SCOPE: &str = "Files.Read offline_access";
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Azure AD client configuration for the refresh-token grant
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OAuth2 client ID of the app registration
    pub client_id: Option<String>,
    /// Only for confidential clients
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    /// `consumers` for personal Microsoft accounts
    pub tenant: String,
    /// Space-separated scopes
    pub scope: String,
    /// Identity platform base URL
    pub authority: String,
}

impl AuthConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client_id: config.client_id(),
            client_secret: config.client_secret(),
            refresh_token: config.refresh_token(),
            tenant: config.tenant(),
            scope: config.scope(),
            authority: config.authority_url(),
        }
    }

    pub fn authorize_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/authorize",
            self.authority.trim_end_matches('/'),
            self.tenant
        )
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/'),
            self.tenant
        )
    }
}
