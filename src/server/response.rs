//! Response builders shared by the handlers

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

pub const PHOTOS_CACHE_CONTROL: &str = "public, max-age=300";
pub const CONTENT_CACHE_CONTROL: &str = "public, max-age=300";
pub const THUMB_CACHE_CONTROL: &str = "public, max-age=1800";

/// The permissive CORS set stamped on every response.
pub fn cors_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(CORS_ALLOW_ORIGIN),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ),
    ]
}

/// Pretty-printed JSON body.
pub fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> Response {
    match serde_json::to_string_pretty(payload) {
        Ok(body) => (
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Pretty-printed JSON body with a `Cache-Control` directive.
pub fn cached_json_response<T: Serialize>(
    status: StatusCode,
    payload: &T,
    cache_control: &'static str,
) -> Response {
    let mut resp = json_response(status, payload);
    resp.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    resp
}

/// Stream an upstream binary response through, keeping its status,
/// `Content-Type` and `Content-Length`.
pub fn proxy_binary(upstream: reqwest::Response, cache_control: &'static str) -> Response {
    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::OK);

    let mut builder = Response::builder()
        .status(status)
        .header(header::CACHE_CONTROL, cache_control);

    for name in [header::CONTENT_TYPE, header::CONTENT_LENGTH] {
        let value = upstream
            .headers()
            .get(name.as_str())
            .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok());
        if let Some(value) = value {
            builder = builder.header(name, value);
        }
    }

    match builder.body(Body::from_stream(upstream.bytes_stream())) {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!("Failed to build proxied response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
