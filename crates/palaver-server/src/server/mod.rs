use std::sync::Arc;

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use palaver_signaling::{PresenceRegistry, SignalingRelay};

use crate::config::ServerConfig;

mod routes;

/// Server application state.
pub struct AppState {
    /// The signaling relay shared by every connection
    pub relay: Arc<SignalingRelay>,
}

impl AppState {
    pub fn new(relay: Arc<SignalingRelay>) -> Self {
        Self { relay }
    }
}

/// Start the HTTP server.
pub async fn start(config: ServerConfig) -> Result<()> {
    // The registry is owned here, instantiated once for the process lifetime,
    // and reaches the relay by handle rather than through global scope.
    let registry = Arc::new(PresenceRegistry::new());
    let relay = Arc::new(SignalingRelay::new(registry));
    let state = Arc::new(AppState::new(relay));

    let app = create_router(state);

    let addr = config.listen_addr();
    info!("Starting signaling server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
            shutdown.cancel();
        });
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}

/// Create the Axum router with all routes and middleware.
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .merge(routes::websocket::router(state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Browser clients connect from arbitrary origins.
        .layer(CorsLayer::permissive())
}

/// GET /
///
/// Liveness probe for external health monitoring. Everything else about the
/// HTTP surface is left to the framework defaults.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "Health check OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let relay = Arc::new(SignalingRelay::new(Arc::new(PresenceRegistry::new())));
        create_router(Arc::new(AppState::new(relay)))
    }

    #[tokio::test]
    async fn health_endpoint_returns_plain_text_ok() {
        let app = test_router();

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/plain"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Health check OK");
    }

    #[tokio::test]
    async fn unknown_path_falls_through_to_the_default() {
        let app = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_get_method_on_root_is_rejected() {
        let app = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
