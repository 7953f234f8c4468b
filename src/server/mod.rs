//! HTTP edge proxy
//!
//! Serves `/photos`, `/thumb`, `/content` and `/health` (matched by path
//! suffix) over OneDrive shared folders, stamping permissive CORS headers on
//! every response.

pub mod error;
pub mod response;
pub mod routes;
pub mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::Config;
use response::cors_headers;
use state::AppState;

/// Build the proxy router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    with_layers(Router::new().fallback(routes::dispatch).with_state(state))
}

/// Panic recovery, CORS on every response, request tracing.
fn with_layers(app: Router) -> Router {
    let app = app.layer(CatchPanicLayer::custom(routes::panic_response));

    cors_headers()
        .into_iter()
        .fold(app, |app, (name, value)| {
            app.layer(SetResponseHeaderLayer::overriding(name, value))
        })
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: Config) -> Result<()> {
    let address = config.bind();
    let state = AppState::new(config)?;

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Serving photos on http://{}", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    async fn exploding_handler() -> StatusCode {
        panic!("gallery exploded")
    }

    #[tokio::test]
    async fn test_panicking_handler_gets_json_500_with_cors() {
        let app = with_layers(Router::new().route("/photos", get(exploding_handler)));

        let request = Request::builder()
            .uri("/photos")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(request).await.unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let headers = resp.headers().clone();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET, OPTIONS");
        assert_eq!(
            headers["access-control-allow-headers"],
            "Content-Type, Authorization"
        );
        assert_eq!(headers["content-type"], "application/json; charset=utf-8");

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal_error");
        assert_eq!(json["message"], "gallery exploded");
    }
}
