//! HTTP server
//!
//! - Router with the lyrics, cache and admin endpoints
//! - Middleware stack (tracing, compression, CORS)
//! - Background sweep of expired cache entries and rate windows
//! - Graceful shutdown on Ctrl-C / SIGTERM

pub mod error;
pub mod identity;
pub mod response;
pub mod routes;
pub mod state;

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::{NetworkError, Result};
use crate::signal_handler::SignalHandler;
pub use state::AppState;

/// Build the Axum router with all routes and middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(routes::api_info))
        .route("/lyrics", get(routes::lyrics::get_lyrics))
        .route("/lyrics/", get(routes::lyrics::get_lyrics))
        .route("/cache/stats", get(routes::cache::cache_stats))
        .route(
            "/admin/cache/clear",
            get(routes::cache::admin_clear_cache).post(routes::cache::admin_clear_cache),
        )
        .route("/admin/cache/stats", get(routes::cache::admin_cache_stats))
        .fallback(routes::not_found)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drop expired cache entries and rate windows.
pub fn spawn_sweeper(state: Arc<AppState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = state.lyrics.cache().purge_expired();
            let swept = state.limiter.sweep();
            debug!("Sweep removed {} cache entries and {} rate windows", purged, swept);
        }
    })
}

/// Serve until a shutdown signal arrives.
pub async fn start_server(state: AppState) -> Result<()> {
    let addr = state.config.bind_address.clone();
    let sweep_period = state.lyrics.cache().default_ttl();
    let state = Arc::new(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| NetworkError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("Lyrica listening on {}", addr);

    let sweeper = spawn_sweeper(Arc::clone(&state), sweep_period);
    let signals = SignalHandler::new();

    let served = axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(signals.wait_for_shutdown())
    .await;

    sweeper.abort();
    info!("Server stopped");
    served?;
    Ok(())
}
