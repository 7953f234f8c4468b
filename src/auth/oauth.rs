//! OAuth2 refresh-token grant for Graph access tokens

use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RefreshToken,
    RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use thiserror::Error;

use super::tokens::{unix_now, StoredToken, TokenCache};
use super::AuthConfig;
use crate::config::Config;
use crate::trips::parse_trip_map;

/// Lifetime assumed when the token endpoint omits `expires_in` or sends
/// something that is not a positive finite number.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("MS_CLIENT_ID and MS_REFRESH_TOKEN must be configured.")]
    MissingCredentials,

    #[error("Invalid token endpoint URL: {0}")]
    InvalidUrl(#[from] oauth2::url::ParseError),

    #[error("Token refresh failed: {0}")]
    Rejected(String),

    #[error("Token refresh succeeded but access_token is missing.")]
    MissingAccessToken,

    #[error("Token refresh returned an unreadable response: {0}")]
    Unreadable(String),

    #[error("Token endpoint request failed: {0}")]
    Transport(String),
}

type HttpError = oauth2::reqwest::Error<reqwest::Error>;
type RefreshError = RequestTokenError<HttpError, BasicErrorResponse>;

impl From<RefreshError> for TokenError {
    fn from(err: RefreshError) -> Self {
        match err {
            RequestTokenError::ServerResponse(resp) => TokenError::Rejected(resp.to_string()),
            RequestTokenError::Request(e) => TokenError::Transport(e.to_string()),
            RequestTokenError::Parse(e, _body) => TokenError::Unreadable(e.to_string()),
            RequestTokenError::Other(msg) => TokenError::Transport(msg),
        }
    }
}

/// `expires_in` as whole seconds, accepting integers, fractions and numeric
/// strings. Zero, negative and non-numeric values count as absent.
fn lenient_expires_in(value: &serde_json::Value) -> Option<u64> {
    let secs = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if secs.is_finite() && secs >= 1.0 {
        Some(secs.min(u64::MAX as f64) as u64)
    } else {
        None
    }
}

/// Rewrite `expires_in` in a token response body into the integer form the
/// oauth2 parser expects, dropping it when unusable.
fn normalize_expires_in(body: Vec<u8>) -> Vec<u8> {
    let parsed = serde_json::from_slice::<serde_json::Value>(&body);
    let Ok(serde_json::Value::Object(mut fields)) = parsed else {
        return body;
    };
    let Some(raw) = fields.get("expires_in") else {
        return body;
    };

    match lenient_expires_in(raw) {
        Some(secs) => {
            fields.insert("expires_in".to_string(), secs.into());
        }
        None => {
            fields.remove("expires_in");
        }
    }
    serde_json::to_vec(&fields).unwrap_or(body)
}

/// `async_http_client` with a forgiving view of `expires_in`.
async fn token_http_client(request: HttpRequest) -> Result<HttpResponse, HttpError> {
    let mut response = async_http_client(request).await?;
    if response.status_code.is_success() {
        response.body = normalize_expires_in(response.body);
    }
    Ok(response)
}

/// Build the OAuth2 client from an AuthConfig
fn build_client(auth_config: &AuthConfig, client_id: &str) -> Result<BasicClient, TokenError> {
    let auth_url = AuthUrl::new(auth_config.authorize_url())?;
    let token_url = TokenUrl::new(auth_config.token_url())?;

    Ok(BasicClient::new(
        ClientId::new(client_id.to_string()),
        auth_config
            .client_secret
            .as_ref()
            .map(|s| ClientSecret::new(s.clone())),
        auth_url,
        Some(token_url),
    )
    .set_auth_type(AuthType::RequestBody))
}

/// Trade the configured refresh token for a new access token.
pub async fn refresh_access_token(
    auth_config: &AuthConfig,
    now: u64,
) -> Result<StoredToken, TokenError> {
    let (client_id, refresh_token) = match (
        auth_config.client_id.as_deref(),
        auth_config.refresh_token.as_deref(),
    ) {
        (Some(id), Some(rt)) => (id, rt),
        _ => return Err(TokenError::MissingCredentials),
    };

    let client = build_client(auth_config, client_id)?;

    tracing::info!("Refreshing Graph access token (tenant {})...", auth_config.tenant);

    let grant = RefreshToken::new(refresh_token.to_string());
    let mut request = client.exchange_refresh_token(&grant);
    for scope in auth_config.scope.split_whitespace() {
        request = request.add_scope(Scope::new(scope.to_string()));
    }

    let token_response = request.request_async(token_http_client).await?;

    let access_token = token_response.access_token().secret().trim().to_string();
    if access_token.is_empty() {
        return Err(TokenError::MissingAccessToken);
    }

    if let Some(rotated) = token_response.refresh_token() {
        if rotated.secret() != refresh_token {
            // Deployment secrets are read-only at runtime; an operator has
            // to install the new refresh token.
            tracing::warn!(
                event = "refresh_token_rotated",
                "Microsoft issued a rotated refresh token. Update MS_REFRESH_TOKEN soon."
            );
        }
    }

    let expires_in = token_response
        .expires_in()
        .map(|d| d.as_secs())
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

    tracing::info!("Graph access token acquired (expires in {}s)", expires_in);
    Ok(StoredToken::new(access_token, expires_in, now))
}

/// Cached access-token source shared by all requests.
pub struct TokenProvider {
    auth_config: AuthConfig,
    cache: TokenCache,
}

impl TokenProvider {
    pub fn new(auth_config: AuthConfig) -> Self {
        Self {
            auth_config,
            cache: TokenCache::new(),
        }
    }

    /// A Graph access token, refreshed when the cached one is within the
    /// expiry margin.
    pub async fn access_token(&self) -> Result<String, TokenError> {
        let now = unix_now();
        self.cache
            .get_or_refresh(now, || refresh_access_token(&self.auth_config, now))
            .await
    }
}

/// Display which credentials and settings are configured. Secret values
/// are never printed.
pub fn status(config: &Config) {
    let auth_config = AuthConfig::from_config(config);
    let presence = |value: &Option<String>| if value.is_some() { "present" } else { "none" };

    match &auth_config.client_id {
        Some(id) => println!("Client ID:   {}", id),
        None => println!("Client ID:   none"),
    }
    println!("Client sec:  {}", presence(&auth_config.client_secret));
    println!("Refresh tok: {}", presence(&auth_config.refresh_token));
    println!("Tenant:      {}", auth_config.tenant);
    println!("Scope:       {}", auth_config.scope);
    println!("Token URL:   {}", auth_config.token_url());
    println!("Graph base:  {}", config.graph_base_url());

    match parse_trip_map(&config.trip_share_urls_json()) {
        Ok(trips) => println!("Trips:       {}", trips.len()),
        Err(e) => println!("Trips:       invalid ({})", e),
    }

    if auth_config.client_id.is_none() || auth_config.refresh_token.is_none() {
        println!("\nSet MS_CLIENT_ID and MS_REFRESH_TOKEN to enable Graph access.");
    }
}
