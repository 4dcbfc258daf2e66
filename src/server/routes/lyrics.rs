use axum::extract::rejection::QueryRejection;
use axum::extract::{Query as QueryParams, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::core::infrastructure::PolicyClass;
use crate::core::model::{parse_sequence, Query, TimingMode, TimestampsPolicy};
use crate::error::LyricaError;
use crate::server::error::{ApiError, ApiResult};
use crate::server::identity::ClientIdentity;
use crate::server::response::SuccessEnvelope;
use crate::server::state::AppState;

/// Raw query string of `GET /lyrics`. Flags are kept as strings so that
/// `true`, `1`, `yes` and `on` all count.
#[derive(Debug, Default, Deserialize)]
pub struct LyricsParams {
    pub artist: Option<String>,
    pub song: Option<String>,
    pub title: Option<String>,
    pub timestamps: Option<String>,
    pub timestamp: Option<String>,
    pub timed_only: Option<String>,
    pub pass: Option<String>,
    pub sequence: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
        .unwrap_or(false)
}

impl LyricsParams {
    fn custom_sequence(&self) -> bool {
        flag(&self.pass)
    }

    /// `timed_only` forces required timing; `timestamps` alone follows the
    /// configured policy.
    pub fn timing(&self, policy: TimestampsPolicy) -> TimingMode {
        if flag(&self.timed_only) {
            TimingMode::Required
        } else if flag(&self.timestamps) || flag(&self.timestamp) {
            policy.timing_mode()
        } else {
            TimingMode::Off
        }
    }

    /// Validate into a [`Query`]. Nothing here touches a provider.
    pub fn to_query(&self, policy: TimestampsPolicy) -> Result<Query, LyricaError> {
        let artist = self.artist.as_deref().unwrap_or_default();
        let title = self
            .song
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.title.as_deref())
            .unwrap_or_default();
        let mut query = Query::new(artist, title)?.with_timing(self.timing(policy));

        if self.custom_sequence() {
            let raw = self
                .sequence
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| {
                    LyricaError::validation("Sequence parameter is required when pass=true")
                })?;
            query = query.with_sequence(parse_sequence(raw)?);
        }
        Ok(query)
    }
}

/// Lyrics lookup (GET /lyrics)
pub async fn get_lyrics(
    State(state): State<Arc<AppState>>,
    client: ClientIdentity,
    params: Result<QueryParams<LyricsParams>, QueryRejection>,
) -> ApiResult<Json<SuccessEnvelope>> {
    let class = match &params {
        Ok(QueryParams(p)) if p.custom_sequence() => PolicyClass::Heavy,
        _ => PolicyClass::General,
    };
    state.check_rate_limit(client.as_str(), class)?;

    let QueryParams(params) =
        params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let query = params.to_query(state.config.timestamps_mode)?;
    info!(
        "Lyrics request from {} for {} - {} ({:?})",
        client.as_str(),
        query.artist(),
        query.title(),
        query.timing()
    );

    let result = state.lyrics.lookup(&query).await.map_err(ApiError::from)?;
    Ok(Json(SuccessEnvelope::from(result.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ProviderId;
    use crate::error::LyricsError;

    fn params(pairs: &[(&str, &str)]) -> LyricsParams {
        let encoded = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let uri: axum::http::Uri = format!("/lyrics?{}", encoded).parse().unwrap();
        QueryParams::<LyricsParams>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_timing_flags() {
        let p = params(&[("artist", "a"), ("song", "b")]);
        assert_eq!(p.timing(TimestampsPolicy::Prefer), TimingMode::Off);
        let p = params(&[("timestamps", "true")]);
        assert_eq!(p.timing(TimestampsPolicy::Prefer), TimingMode::Preferred);
        assert_eq!(p.timing(TimestampsPolicy::Require), TimingMode::Required);
        let p = params(&[("timestamp", "1"), ("timed_only", "yes")]);
        assert_eq!(p.timing(TimestampsPolicy::Prefer), TimingMode::Required);
    }

    #[test]
    fn test_title_alias_and_missing_fields() {
        let q = params(&[("artist", "Adele"), ("title", "Hello")])
            .to_query(TimestampsPolicy::Prefer)
            .unwrap();
        assert_eq!(q.title(), "Hello");

        let err = params(&[("artist", "Adele")]).to_query(TimestampsPolicy::Prefer).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Artist and song name are required");
    }

    #[test]
    fn test_sequence_only_with_pass() {
        let q = params(&[("artist", "a"), ("song", "b"), ("sequence", "2,1")])
            .to_query(TimestampsPolicy::Prefer)
            .unwrap();
        assert_eq!(q.sequence_override(), None);

        let q = params(&[("artist", "a"), ("song", "b"), ("pass", "true"), ("sequence", "2,1")])
            .to_query(TimestampsPolicy::Prefer)
            .unwrap();
        assert_eq!(q.sequence_override(), Some(&[ProviderId::Lrclib, ProviderId::Genius][..]));

        let err = params(&[("artist", "a"), ("song", "b"), ("pass", "true")])
            .to_query(TimestampsPolicy::Prefer)
            .unwrap_err();
        assert!(matches!(err, LyricaError::Validation(_)));

        let err = params(&[("artist", "a"), ("song", "b"), ("pass", "true"), ("sequence", "2,x")])
            .to_query(TimestampsPolicy::Prefer)
            .unwrap_err();
        assert!(matches!(err, LyricaError::Lyrics(LyricsError::InvalidSequence { .. })));
    }
}
