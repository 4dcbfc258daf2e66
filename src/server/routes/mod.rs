//! API route handlers
//!
//! - `lyrics`: the lookup endpoint
//! - `cache`: public cache stats and the admin cache endpoints

pub mod cache;
pub mod lyrics;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::core::model::ProviderId;
use crate::server::error::ApiError;
use crate::server::response::now_timestamp;
use crate::server::state::AppState;

/// Service info (GET /)
pub async fn api_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let registry = state.lyrics.orchestrator().registry();
    let providers: Vec<_> = ProviderId::ALL
        .iter()
        .map(|id| {
            json!({
                "id": id.number(),
                "name": id.display_name(),
                "timed": id.supports_timestamps(),
                "configured": registry.is_configured(*id),
            })
        })
        .collect();

    Json(json!({
        "api": "Lyrica",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "active",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "endpoints": {
            "lyrics": "/lyrics/?artist=ARTIST&song=SONG&timestamps=true&timed_only=false&pass=false&sequence=1,2,3",
            "cache_stats": "/cache/stats",
            "admin_cache_clear": "/admin/cache/clear?key=ADMIN_KEY",
            "admin_cache_stats": "/admin/cache/stats?key=ADMIN_KEY",
        },
        "providers": providers,
        "timestamp": now_timestamp(),
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}
