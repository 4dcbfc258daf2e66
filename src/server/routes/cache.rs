use axum::extract::rejection::QueryRejection;
use axum::extract::{Query as QueryParams, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::core::infrastructure::PolicyClass;
use crate::server::error::{ApiError, ApiResult};
use crate::server::identity::{admin_key_header, ClientIdentity};
use crate::server::response::{now_timestamp, StatsEnvelope};
use crate::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AdminParams {
    pub key: Option<String>,
}

impl AdminParams {
    /// `key` query parameter first, then the `X-ADMIN-KEY` header.
    fn presented<'a>(&'a self, headers: &'a HeaderMap) -> Option<&'a str> {
        self.key.as_deref().or_else(|| admin_key_header(headers))
    }
}

/// Every admin call spends heavy budget before the key is checked, so
/// wrong keys are throttled too.
fn admit_admin(
    state: &AppState,
    client: &ClientIdentity,
    headers: &HeaderMap,
    params: Result<QueryParams<AdminParams>, QueryRejection>,
) -> ApiResult<()> {
    state.check_rate_limit(client.as_str(), PolicyClass::Heavy)?;
    let QueryParams(params) =
        params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    state.authorize_admin(params.presented(headers))
}

/// Read-only cache stats (GET /cache/stats)
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<StatsEnvelope> {
    Json(StatsEnvelope {
        status: "success",
        stats: state.lyrics.cache().stats(),
    })
}

/// Drop every cached result (GET|POST /admin/cache/clear)
pub async fn admin_clear_cache(
    State(state): State<Arc<AppState>>,
    client: ClientIdentity,
    headers: HeaderMap,
    params: Result<QueryParams<AdminParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    admit_admin(&state, &client, &headers, params)?;

    let removed = state.lyrics.cache().clear();
    info!("Admin cache clear from {}: {} entries removed", client.as_str(), removed);
    Ok(Json(json!({
        "status": "success",
        "details": { "removed": removed },
        "timestamp": now_timestamp(),
    })))
}

/// Cache and limiter internals (GET /admin/cache/stats)
pub async fn admin_cache_stats(
    State(state): State<Arc<AppState>>,
    client: ClientIdentity,
    headers: HeaderMap,
    params: Result<QueryParams<AdminParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    admit_admin(&state, &client, &headers, params)?;

    let cache = state.lyrics.cache();
    Ok(Json(json!({
        "status": "success",
        "cache": cache.stats(),
        "cache_ttl_secs": cache.default_ttl().as_secs(),
        "rate_limit_windows": state.limiter.tracked(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    })))
}
