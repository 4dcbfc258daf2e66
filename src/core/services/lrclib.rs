use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::model::ProviderId;
use crate::core::normalizer::RawLyrics;
use crate::core::services::{
    http::api_user_agent, status_error, LyricsProvider, ProviderError, ProviderHit,
};

pub const DEFAULT_INSTANCE: &str = "https://lrclib.net";

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub duration: Option<f64>,
    pub plain_lyrics: Option<String>,
    pub synced_lyrics: Option<String>,
    #[serde(default)]
    pub instrumental: bool,
}

impl SearchResult {
    /// `/api/get` answers with `trackName`, `/api/search` with both.
    pub fn title(&self) -> Option<&str> {
        self.track_name.as_deref().or(self.name.as_deref())
    }
}

#[derive(Clone)]
pub struct LrclibProvider {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibProvider {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let url = format!("{}/api/search", self.base_url);
        let params = [("track_name", title), ("artist_name", artist)];
        info!("Searching LRCLIB API with params: {:?}", params);

        match self.get_with_retry(&url, &params).await? {
            Some(response) => Ok(response.json().await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_lyrics(
        &self,
        track: &SearchResult,
    ) -> Result<Option<SearchResult>, ProviderError> {
        let url = format!("{}/api/get", self.base_url);
        let duration = track.duration.unwrap_or(0.0).round().to_string();
        let params = [
            ("track_name", track.title().unwrap_or_default()),
            ("artist_name", track.artist_name.as_deref().unwrap_or_default()),
            ("album_name", track.album_name.as_deref().unwrap_or_default()),
            ("duration", duration.as_str()),
        ];

        match self.get_with_retry(&url, &params).await? {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }

    /// GET with up to three attempts on 429, 5xx and network errors.
    /// `Ok(None)` means the API answered 404.
    async fn get_with_retry(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<reqwest::Response>, ProviderError> {
        let mut attempt = 0u32;
        let max_attempts = 3u32;
        loop {
            attempt += 1;
            let resp_result = self
                .client
                .get(url)
                .header(reqwest::header::USER_AGENT, api_user_agent())
                .query(params)
                .send()
                .await;

            match resp_result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(Some(response));
                    }
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if (status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
                        && attempt < max_attempts
                    {
                        let backoff = 2u64.pow(attempt - 1) * 300; // 300ms, 600ms
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                        continue;
                    }
                    return Err(status_error(status));
                }
                Err(e) => {
                    if attempt < max_attempts {
                        let backoff = 2u64.pow(attempt - 1) * 300;
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }
}

/// Choose the body to hand to the normalizer.
pub fn hit_from_record(
    record: SearchResult,
    want_timestamps: bool,
) -> Result<ProviderHit, ProviderError> {
    if record.instrumental {
        return Err(ProviderError::NotFound);
    }

    let title = record.title().map(str::to_string);
    let track_duration_ms = record.duration.map(|d| (d * 1000.0) as u64);
    let plain = record.plain_lyrics.filter(|p| !p.trim().is_empty());
    let synced = record.synced_lyrics.filter(|s| !s.trim().is_empty());

    let body = match (synced, plain) {
        (Some(text), plain) if want_timestamps => RawLyrics::Lrc {
            text,
            track_duration_ms,
            plain_fallback: plain,
        },
        (_, Some(plain)) => RawLyrics::Plain(plain),
        (Some(text), None) => RawLyrics::Lrc {
            text,
            track_duration_ms,
            plain_fallback: None,
        },
        (None, None) => return Err(ProviderError::NotFound),
    };

    Ok(ProviderHit::new(body).with_metadata(record.artist_name, title))
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Lrclib
    }

    async fn fetch(
        &self,
        artist: &str,
        title: &str,
        want_timestamps: bool,
    ) -> Result<ProviderHit, ProviderError> {
        let results = self.search(title, artist).await?;
        let Some(track) = results.into_iter().next() else {
            return Err(ProviderError::NotFound);
        };

        // The search record already carries lyrics; the exact lookup is
        // preferred because it resolves the canonical record.
        let record = match self.get_lyrics(&track).await {
            Ok(Some(exact)) => exact,
            Ok(None) => {
                debug!("LRCLIB exact lookup missed, using search record");
                track
            }
            Err(e) => {
                debug!("LRCLIB exact lookup failed ({}), using search record", e);
                track
            }
        };

        hit_from_record(record, want_timestamps)
    }
}
