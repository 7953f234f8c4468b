//! HTTP client for the Microsoft Graph `/shares` API
//!
//! Wraps reqwest::Client with the Graph base URL and bearer auth. Tokens are
//! passed in per call; acquiring them is the caller's job.

use anyhow::{Context, Result};
use url::Url;

use crate::config::Config;

/// Cap on the error text copied from an upstream body.
const ERROR_TEXT_LIMIT: usize = 400;

/// Graph client bound to one API base (normally `https://graph.microsoft.com/v1.0`).
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base: Url,
}

impl GraphClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid Graph base URL: {}", base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("Graph base URL cannot have path segments: {}", base_url);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.graph_base_url())
    }

    /// `<base>/<segments...>`, each segment percent-encoded on its own.
    pub fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET `url` with bearer auth. Non-success statuses are returned as-is.
    pub async fn get(&self, url: &str, token: &str) -> Result<reqwest::Response> {
        tracing::debug!("Graph GET {}", url);

        self.http
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("Graph GET {} failed", url))
    }

    /// GET a binary resource with bearer auth, following redirects.
    pub async fn get_binary(&self, url: &str, token: &str) -> Result<reqwest::Response> {
        tracing::debug!("Graph GET (binary) {}", url);

        self.http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Graph GET {} failed", url))
    }
}

/// Best human-readable detail from a failed upstream response.
///
/// Prefers the nested `error.message` of a JSON error body, then the raw body
/// (truncated), then the status reason phrase.
pub async fn read_error_details(resp: reqwest::Response) -> String {
    let status = resp.status();
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    };

    match resp.text().await {
        Ok(text) => error_details_from_body(&text).unwrap_or_else(fallback),
        Err(_) => fallback(),
    }
}

/// Detail extracted from an error body, or `None` for an empty body.
pub fn error_details_from_body(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(text) {
        let nested = parsed
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .filter(|m| !m.trim().is_empty());
        if let Some(message) = nested {
            return Some(message.to_string());
        }
    }

    Some(text.chars().take(ERROR_TEXT_LIMIT).collect())
}
