use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use super::response::json_response;
use crate::auth::TokenError;
use crate::trips::TripConfigError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("No OneDrive share URL mapped for trip \"{0}\".")]
    TripNotConfigured(String),

    #[error("{message}")]
    GraphContentFailed { status: u16, message: String },

    #[error("Use /photos, /thumb, /content, or /health.")]
    NotFound,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    TripConfig(#[from] TripConfigError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::TripNotConfigured(_) => "trip_not_configured",
            ApiError::GraphContentFailed { .. } => "graph_content_failed",
            ApiError::NotFound => "not_found",
            ApiError::Token(_) | ApiError::TripConfig(_) | ApiError::Internal(_) => {
                "internal_error"
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::TripNotConfigured(_) | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::GraphContentFailed { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Token(_) | ApiError::TripConfig(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Internal errors carry their whole cause chain.
    pub fn message(&self) -> String {
        let message = match self {
            ApiError::Internal(e) => format!("{:#}", e),
            other => other.to_string(),
        };
        error_message(message)
    }
}

/// Message for an error body; never blank.
pub fn error_message(message: String) -> String {
    if message.trim().is_empty() {
        "Unknown error.".to_string()
    } else {
        message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!("{}: {}", self.kind(), message);
        } else {
            tracing::debug!("{}: {}", self.kind(), message);
        }

        let body = ErrorBody {
            error: self.kind(),
            message,
        };
        json_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_statuses() {
        let cases = [
            (ApiError::BadRequest("x"), "bad_request", 400),
            (ApiError::TripNotConfigured("peru".into()), "trip_not_configured", 404),
            (ApiError::NotFound, "not_found", 404),
            (
                ApiError::GraphContentFailed {
                    status: 403,
                    message: "denied".into(),
                },
                "graph_content_failed",
                403,
            ),
            (ApiError::Token(TokenError::MissingCredentials), "internal_error", 500),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                "internal_error",
                500,
            ),
        ];

        for (err, kind, status) in cases {
            assert_eq!(err.kind(), kind);
            assert_eq!(err.status().as_u16(), status);
        }
    }

    #[test]
    fn test_unmirrorable_status_becomes_bad_gateway() {
        let err = ApiError::GraphContentFailed {
            status: 42,
            message: "odd".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_error_message_never_blank() {
        assert_eq!(error_message("".to_string()), "Unknown error.");
        assert_eq!(error_message("  ".to_string()), "Unknown error.");
        assert_eq!(error_message("boom".to_string()), "boom");
    }

    #[test]
    fn test_internal_message_keeps_cause_chain() {
        let err = ApiError::Internal(
            anyhow::anyhow!("connection refused").context("Graph GET https://graph.test/x failed"),
        );
        assert_eq!(
            err.message(),
            "Graph GET https://graph.test/x failed: connection refused"
        );

        let err = ApiError::Internal(anyhow::anyhow!("Graph children fetch failed (403): denied"));
        assert_eq!(err.message(), "Graph children fetch failed (403): denied");
    }

    #[tokio::test]
    async fn test_internal_response_body_has_cause() {
        let err = ApiError::Internal(anyhow::anyhow!("dns error").context("Graph GET failed"));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal_error");
        assert_eq!(json["message"], "Graph GET failed: dns error");
    }

    #[test]
    fn test_trip_not_configured_message() {
        let err = ApiError::TripNotConfigured("peru".into());
        assert_eq!(
            err.to_string(),
            "No OneDrive share URL mapped for trip \"peru\"."
        );
    }
}
