use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::core::model::ProviderId;
use crate::core::normalizer::RawLyrics;
use crate::core::services::{status_error, LyricsProvider, ProviderError, ProviderHit};

pub const DEFAULT_INSTANCE: &str = "https://api-lyrics.simpmusic.org/v1";

/// SimpMusic lyrics API: search by free text, then fetch by video id.
#[derive(Clone)]
pub struct SimpMusicProvider {
    client: reqwest::Client,
    base_url: String,
}

impl SimpMusicProvider {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let response = self.client.get(url).query(query).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        Ok(response.json().await?)
    }
}

/// First search hit as `(video_id, artist, title)`.
pub fn first_search_hit(search: &Value) -> Option<(String, Option<String>, Option<String>)> {
    let results = match search {
        Value::Object(map) => map.get("data")?,
        other => other,
    };
    let first = results.as_array()?.first()?;
    let video_id = first
        .get("videoId")
        .or_else(|| first.get("id"))
        .and_then(Value::as_str)?
        .to_string();
    let artist = first.get("artistName").and_then(Value::as_str).map(str::to_string);
    let title = first.get("title").and_then(Value::as_str).map(str::to_string);
    Some((video_id, artist, title))
}

/// Lyrics body from a `/{video_id}` response.
pub fn body_from_lyrics(response: &Value, want_timestamps: bool) -> Option<RawLyrics> {
    let data = match response.get("data")? {
        Value::Array(items) => items.first()?,
        other => other,
    };
    if !data.is_object() {
        return None;
    }

    let text = |keys: &[&str]| {
        keys.iter()
            .filter_map(|k| data.get(*k).and_then(Value::as_str))
            .find(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    let plain = text(&["plainLyrics", "lyrics", "plainLyric"]);
    let synced = text(&["syncedLyrics", "lrc", "syncedLyric"]);

    match (synced, plain) {
        (Some(synced), plain) if want_timestamps => Some(RawLyrics::Lrc {
            text: synced,
            track_duration_ms: None,
            plain_fallback: plain,
        }),
        (_, Some(plain)) => Some(RawLyrics::Plain(plain)),
        (Some(synced), None) => Some(RawLyrics::Lrc {
            text: synced,
            track_duration_ms: None,
            plain_fallback: None,
        }),
        (None, None) => None,
    }
}

#[async_trait]
impl LyricsProvider for SimpMusicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::SimpMusic
    }

    async fn fetch(
        &self,
        artist: &str,
        title: &str,
        want_timestamps: bool,
    ) -> Result<ProviderHit, ProviderError> {
        info!("Attempting SimpMusic for {} - {}", artist, title);

        let q = format!("{} {}", title, artist);
        let search = self
            .get_json(&format!("{}/search", self.base_url), &[("q", q.as_str())])
            .await?;
        let (video_id, found_artist, found_title) =
            first_search_hit(&search).ok_or(ProviderError::NotFound)?;

        let lyrics = self
            .get_json(&format!("{}/{}", self.base_url, video_id), &[])
            .await?;
        let body = body_from_lyrics(&lyrics, want_timestamps).ok_or(ProviderError::NotFound)?;

        Ok(ProviderHit::new(body).with_metadata(found_artist, found_title))
    }
}
