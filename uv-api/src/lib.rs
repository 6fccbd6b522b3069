//! HTTP surface for banner integrations.
//!
//! - `GET /banner/uv` evaluates a UV threshold trigger for a city
//! - `GET /health` liveness probe
//!
//! Every response carries permissive CORS headers; `OPTIONS` answers 204.

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, header},
    middleware,
    response::Response,
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uv_core::BannerService;

pub mod error;
pub mod handlers;

#[derive(Debug, Clone)]
pub struct AppState {
    pub banner: BannerService,
    pub default_city: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/banner/uv", get(handlers::banner).options(handlers::preflight))
        .route("/health", get(handlers::health).options(handlers::preflight))
        .fallback(handlers::fallback)
        .layer(middleware::map_response(with_cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the listen socket; `host` may be a hostname or an IPv4/IPv6 literal.
pub async fn bind(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))
}

async fn with_cors(mut res: Response) -> Response {
    let headers = res.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, OPTIONS"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    res
}
