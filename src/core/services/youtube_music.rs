//! YouTube Music through the InnerTube JSON API.
//!
//! A lookup takes three calls: `search` resolves a video id, `next` yields the
//! lyrics browse id (`MPLY...`), `browse` returns the lyrics. The Android
//! client context is used for `browse` when timed lines are wanted, since
//! only that client receives `timedLyricsData`.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::core::model::ProviderId;
use crate::core::normalizer::{RawLyrics, RawTimedLine};
use crate::core::services::{status_error, LyricsProvider, ProviderError, ProviderHit};

const API_BASE: &str = "https://music.youtube.com/youtubei/v1";
const WEB_CLIENT_VERSION: &str = "1.20240918.01.00";
const ANDROID_CLIENT_VERSION: &str = "7.21.50";

/// Filter param selecting the "Songs" shelf of a search.
const SONGS_FILTER: &str = "EgWKAQIIAWoMEA4QChADEAQQCRAF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientKind {
    Web,
    Android,
}

pub struct YoutubeMusicProvider {
    client: reqwest::Client,
}

impl YoutubeMusicProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn call(
        &self,
        endpoint: &str,
        kind: ClientKind,
        mut body: Value,
    ) -> Result<Value, ProviderError> {
        body["context"] = context(kind);
        let mut request = self
            .client
            .post(format!("{}/{}", API_BASE, endpoint))
            .query(&[("prettyPrint", "false")])
            .header("Origin", "https://music.youtube.com")
            .json(&body);
        if kind == ClientKind::Android {
            request = request.header(
                reqwest::header::USER_AGENT,
                format!(
                    "com.google.android.apps.youtube.music/{} (Linux; U; Android 14) gzip",
                    ANDROID_CLIENT_VERSION
                ),
            );
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        Ok(response.json().await?)
    }
}

fn context(kind: ClientKind) -> Value {
    let (name, version) = match kind {
        ClientKind::Web => ("WEB_REMIX", WEB_CLIENT_VERSION),
        ClientKind::Android => ("ANDROID_MUSIC", ANDROID_CLIENT_VERSION),
    };
    json!({
        "client": {
            "clientName": name,
            "clientVersion": version,
            "hl": "en",
            "gl": "US",
        }
    })
}

/// Depth-first visit of every object stored under `key`.
fn find_all<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    out.push(v);
                }
                find_all(v, key, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                find_all(item, key, out);
            }
        }
        _ => {}
    }
}

fn find_first<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let mut found = Vec::new();
    find_all(value, key, &mut found);
    found.into_iter().next()
}

fn runs_text(runs: &Value) -> String {
    runs.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|r| r.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongCandidate {
    pub video_id: String,
    pub title: String,
    pub artists: String,
}

/// Song rows of a search response, in display order.
pub fn song_candidates(search: &Value) -> Vec<SongCandidate> {
    let mut renderers = Vec::new();
    find_all(search, "musicResponsiveListItemRenderer", &mut renderers);

    renderers
        .into_iter()
        .filter_map(|item| {
            let video_id = item
                .pointer("/playlistItemData/videoId")
                .and_then(Value::as_str)?
                .to_string();
            let columns = item.get("flexColumns")?.as_array()?;
            let column_text = |i: usize| {
                columns
                    .get(i)
                    .and_then(|c| c.pointer("/musicResponsiveListItemFlexColumnRenderer/text/runs"))
                    .map(runs_text)
                    .unwrap_or_default()
            };
            Some(SongCandidate {
                video_id,
                title: column_text(0),
                artists: column_text(1),
            })
        })
        .collect()
}

/// Prefer a row whose artist column mentions the requested artist.
pub fn pick_candidate(candidates: Vec<SongCandidate>, artist: &str) -> Option<SongCandidate> {
    let wanted = artist.to_lowercase();
    let position = candidates
        .iter()
        .position(|c| c.artists.to_lowercase().contains(&wanted))
        .unwrap_or(0);
    candidates.into_iter().nth(position)
}

/// The `MPLY...` browse id of the lyrics tab in a `next` response.
pub fn lyrics_browse_id(next: &Value) -> Option<String> {
    let mut ids = Vec::new();
    find_all(next, "browseId", &mut ids);
    ids.into_iter()
        .filter_map(Value::as_str)
        .find(|id| id.starts_with("MPLY"))
        .map(str::to_string)
}

fn millis(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Lyrics body of a `browse` response.
pub fn lyrics_body(browse: &Value) -> Option<RawLyrics> {
    if let Some(Value::Array(entries)) = find_first(browse, "timedLyricsData") {
        let lines: Vec<RawTimedLine> = entries
            .iter()
            .filter_map(|entry| {
                let text = entry.get("lyricLine").and_then(Value::as_str)?.to_string();
                let cue = entry.get("cueRange")?;
                Some(RawTimedLine {
                    text,
                    start_ms: millis(cue.get("startTimeMilliseconds"))?,
                    end_ms: millis(cue.get("endTimeMilliseconds")),
                })
            })
            .collect();
        if !lines.is_empty() {
            return Some(RawLyrics::Millis(lines));
        }
    }

    let shelf = find_first(browse, "musicDescriptionShelfRenderer")?;
    let text = runs_text(shelf.pointer("/description/runs")?);
    if text.trim().is_empty() {
        None
    } else {
        Some(RawLyrics::Plain(text))
    }
}

#[async_trait]
impl LyricsProvider for YoutubeMusicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::YoutubeMusic
    }

    async fn fetch(
        &self,
        artist: &str,
        title: &str,
        want_timestamps: bool,
    ) -> Result<ProviderHit, ProviderError> {
        info!("Attempting YouTube Music for {} - {}", artist, title);

        let search = self
            .call(
                "search",
                ClientKind::Web,
                json!({ "query": format!("{} {}", title, artist), "params": SONGS_FILTER }),
            )
            .await?;
        let song = pick_candidate(song_candidates(&search), artist).ok_or(ProviderError::NotFound)?;
        debug!("YouTube Music matched video {}", song.video_id);

        let next = self
            .call("next", ClientKind::Web, json!({ "videoId": song.video_id }))
            .await?;
        let browse_id = lyrics_browse_id(&next).ok_or(ProviderError::NotFound)?;

        let kind = if want_timestamps { ClientKind::Android } else { ClientKind::Web };
        let browse = self.call("browse", kind, json!({ "browseId": browse_id })).await?;
        let body = lyrics_body(&browse).ok_or(ProviderError::NotFound)?;

        let found_title = Some(song.title).filter(|t| !t.is_empty());
        let found_artist = song
            .artists
            .split(" • ")
            .next()
            .map(str::to_string)
            .filter(|a| !a.is_empty());
        Ok(ProviderHit::new(body).with_metadata(found_artist, found_title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(video_id: &str, title: &str, artists: &str) -> Value {
        json!({
            "musicResponsiveListItemRenderer": {
                "playlistItemData": { "videoId": video_id },
                "flexColumns": [
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [{ "text": title }] } } },
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [
                        { "text": artists }, { "text": " • " }, { "text": "Album" }
                    ] } } }
                ]
            }
        })
    }

    #[test]
    fn test_candidates_prefer_matching_artist() {
        let search = json!({
            "contents": { "sectionListRenderer": { "contents": [
                { "musicShelfRenderer": { "contents": [
                    row("aaa", "Hello (Cover)", "Someone Else"),
                    row("bbb", "Hello", "Adele"),
                ] } }
            ] } }
        });
        let candidates = song_candidates(&search);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].artists, "Adele • Album");

        let picked = pick_candidate(candidates.clone(), "adele").unwrap();
        assert_eq!(picked.video_id, "bbb");
        let fallback = pick_candidate(candidates, "Nobody").unwrap();
        assert_eq!(fallback.video_id, "aaa");
        assert_eq!(pick_candidate(Vec::new(), "Adele"), None);
    }

    #[test]
    fn test_lyrics_browse_id() {
        let next = json!({ "tabs": [
            { "endpoint": { "browseEndpoint": { "browseId": "FEmusic_up_next" } } },
            { "endpoint": { "browseEndpoint": { "browseId": "MPLYt_abc" } } }
        ] });
        assert_eq!(lyrics_browse_id(&next).as_deref(), Some("MPLYt_abc"));
        assert_eq!(lyrics_browse_id(&json!({})), None);
    }

    #[test]
    fn test_timed_lyrics_with_string_offsets() {
        let browse = json!({ "contents": { "elementRenderer": { "newElement": { "type": {
            "componentType": { "model": { "timedLyricsModel": { "lyricsData": {
                "timedLyricsData": [
                    { "lyricLine": "Hello", "cueRange": { "startTimeMilliseconds": "1000", "endTimeMilliseconds": "2500" } },
                    { "lyricLine": "World", "cueRange": { "startTimeMilliseconds": 3000 } }
                ]
            } } } }
        } } } } });
        assert_eq!(
            lyrics_body(&browse),
            Some(RawLyrics::Millis(vec![
                RawTimedLine { text: "Hello".into(), start_ms: 1000, end_ms: Some(2500) },
                RawTimedLine { text: "World".into(), start_ms: 3000, end_ms: None },
            ]))
        );
    }

    #[test]
    fn test_plain_description_shelf() {
        let browse = json!({ "contents": { "sectionListRenderer": { "contents": [
            { "musicDescriptionShelfRenderer": { "description": { "runs": [{ "text": "Line one\nLine two" }] } } }
        ] } } });
        assert_eq!(lyrics_body(&browse), Some(RawLyrics::Plain("Line one\nLine two".to_string())));
        assert_eq!(lyrics_body(&json!({ "contents": {} })), None);
    }
}
