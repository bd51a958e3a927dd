pub mod error;
pub mod handlers;
pub mod origins;
pub mod rate_limiter;
pub mod types;

use crate::governor_conf::get_governor_conf;
use crate::server::handlers::{process_image_handler, server_status_handler};
use crate::server::origins::cors_layer;
use crate::server::types::AppState;
use crate::utils::constants::{PROCESS_ROUTE, SERVER_REQUEST_TIMEOUT_SECS};
use anyhow::Error;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::GovernorLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Relay routes with CORS, body-size and timeout layers. Rate limiting is
/// added separately with [`with_rate_limit`].
pub fn router(state: Arc<AppState>) -> Router {
    let timeout = TimeoutLayer::new(Duration::from_secs(SERVER_REQUEST_TIMEOUT_SECS));
    let cors = cors_layer(&state.config.allowed_origins);
    // tower-http enforces the ceiling; axum's own 2MB default would cut it short
    let request_body_limit = RequestBodyLimitLayer::new(state.config.upload_limit_bytes);

    Router::new()
        .route("/", get(server_status_handler))
        .route(PROCESS_ROUTE, any(process_image_handler))
        .layer(timeout)
        .layer(cors)
        .layer(DefaultBodyLimit::disable())
        .layer(request_body_limit)
        .with_state(state)
}

/// Wraps `router` in a per-client governor. The router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the peer address
/// is available as the key.
pub fn with_rate_limit(
    router: Router,
    burst_per_minute: u32,
    trusted_proxy_hops: usize,
) -> Result<Router, Error> {
    let governor_conf = Arc::new(get_governor_conf(burst_per_minute, trusted_proxy_hops)?);

    let limiter = governor_conf.limiter().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            limiter.retain_recent();
        }
    });

    Ok(router.layer(GovernorLayer {
        config: governor_conf,
    }))
}
