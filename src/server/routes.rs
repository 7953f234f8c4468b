//! Request dispatch and endpoint handlers
//!
//! Endpoints are matched on the path suffix so the proxy works the same when
//! mounted under a prefix (`/api/photos`, `/gallery/thumb`, ...).

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::error::{error_message, ApiError, ErrorBody};
use super::response::{
    cached_json_response, json_response, proxy_binary, CONTENT_CACHE_CONTROL,
    PHOTOS_CACHE_CONTROL, THUMB_CACHE_CONTROL,
};
use super::state::AppState;
use crate::api::photos::fetch_photos;
use crate::api::{client::read_error_details, ThumbnailSize};
use crate::models::{text_or, PhotoLinks, PhotoListing};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    Photos,
    Thumb,
    Content,
}

impl Endpoint {
    pub fn from_path(path: &str) -> Option<Self> {
        [
            ("/health", Endpoint::Health),
            ("/photos", Endpoint::Photos),
            ("/thumb", Endpoint::Thumb),
            ("/content", Endpoint::Content),
        ]
        .into_iter()
        .find(|(suffix, _)| path.ends_with(suffix))
        .map(|(_, endpoint)| endpoint)
    }
}

/// Decoded query string; the first occurrence of a key wins.
#[derive(Debug, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
            .into_owned()
            .collect();
        Self(pairs)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Leading integer of `raw` (sign allowed, trailing junk ignored), saturating
/// on overflow.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let digits: Vec<i64> = digits
        .chars()
        .map_while(|c| c.to_digit(10))
        .map(i64::from)
        .collect();
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits
        .into_iter()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(d));
    Some(if negative { -magnitude } else { magnitude })
}

/// `limit` query value clamped to `[1, 200]`, 50 when absent or not a number.
pub fn clamp_limit(raw: Option<&str>) -> usize {
    let limit = raw
        .and_then(parse_leading_int)
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(MIN_LIMIT, MAX_LIMIT);
    limit as usize
}

/// Origin the client reached us on, for building absolute photo links.
fn request_origin(public_origin: Option<String>, uri: &Uri, headers: &HeaderMap) -> String {
    if let Some(origin) = public_origin {
        return origin;
    }

    let header_text = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    };

    let scheme = header_text("x-forwarded-proto")
        .or_else(|| uri.scheme_str().map(String::from))
        .unwrap_or_else(|| "http".to_string());
    let host = header_text(header::HOST.as_str())
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string());

    format!("{}://{}", scheme, host)
}

/// Single entry point for every path and method.
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }

    let params = QueryParams::parse(uri.query());
    let result = match Endpoint::from_path(uri.path()) {
        Some(Endpoint::Health) => Ok(health()),
        Some(Endpoint::Photos) => photos(&state, &params, &uri, &headers).await,
        Some(Endpoint::Thumb) => thumb(&state, &params).await,
        Some(Endpoint::Content) => content(&state, &params).await,
        None => Err(ApiError::NotFound),
    };

    result.unwrap_or_else(IntoResponse::into_response)
}

#[derive(Debug, Serialize)]
struct Health {
    ok: bool,
    now: String,
}

fn health() -> Response {
    let body = Health {
        ok: true,
        now: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    json_response(StatusCode::OK, &body)
}

async fn photos(
    state: &AppState,
    params: &QueryParams,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let trip = text_or(params.get("trip"), "").to_lowercase();
    let limit = clamp_limit(params.get("limit"));

    if trip.is_empty() {
        return Err(ApiError::BadRequest("Missing required query param: trip"));
    }

    let share_url = state
        .trips
        .resolve(&state.config.trip_share_urls_json(), &trip)?
        .ok_or_else(|| ApiError::TripNotConfigured(trip.clone()))?;

    let origin = request_origin(state.config.public_origin(), uri, headers);
    let links = PhotoLinks::new(&origin, uri.path());

    let photos = fetch_photos(&state.graph, &state.tokens, &share_url, limit, &links).await?;
    tracing::info!("Serving {} photos for trip {}", photos.len(), trip);

    Ok(cached_json_response(
        StatusCode::OK,
        &PhotoListing::new(trip, photos),
        PHOTOS_CACHE_CONTROL,
    ))
}

/// `sid` and `id`, both required.
fn item_params(params: &QueryParams) -> Result<(String, String), ApiError> {
    let share_id = text_or(params.get("sid"), "");
    let item_id = text_or(params.get("id"), "");
    if share_id.is_empty() || item_id.is_empty() {
        return Err(ApiError::BadRequest("Missing required params: sid and id"));
    }
    Ok((share_id, item_id))
}

async fn thumb(state: &AppState, params: &QueryParams) -> Result<Response, ApiError> {
    let (share_id, item_id) = item_params(params)?;
    let size = ThumbnailSize::parse(params.get("size"));

    let token = state.tokens.access_token().await?;
    let upstream = state
        .graph
        .item_thumbnail(&token, &share_id, &item_id, size)
        .await?;

    if !upstream.status().is_success() {
        tracing::debug!(
            "No {} thumbnail for {} ({}), serving content",
            size.as_str(),
            item_id,
            upstream.status()
        );
        return item_content(state, &token, &share_id, &item_id).await;
    }

    Ok(proxy_binary(upstream, THUMB_CACHE_CONTROL))
}

async fn content(state: &AppState, params: &QueryParams) -> Result<Response, ApiError> {
    let (share_id, item_id) = item_params(params)?;
    let token = state.tokens.access_token().await?;
    item_content(state, &token, &share_id, &item_id).await
}

async fn item_content(
    state: &AppState,
    token: &str,
    share_id: &str,
    item_id: &str,
) -> Result<Response, ApiError> {
    let upstream = state.graph.item_content(token, share_id, item_id).await?;

    let status = upstream.status();
    if !status.is_success() {
        let message = read_error_details(upstream).await;
        return Err(ApiError::GraphContentFailed {
            status: status.as_u16(),
            message,
        });
    }

    Ok(proxy_binary(upstream, CONTENT_CACHE_CONTROL))
}

/// Turn a handler panic into the same 500 body as any other failure.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        String::new()
    };
    tracing::error!("Handler panicked: {}", message);

    let body = ErrorBody {
        error: "internal_error",
        message: error_message(message),
    };
    json_response(StatusCode::INTERNAL_SERVER_ERROR, &body)
}
