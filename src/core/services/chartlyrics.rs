use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

use crate::core::model::ProviderId;
use crate::core::normalizer::RawLyrics;
use crate::core::services::html::fragment_text;
use crate::core::services::{status_error, LyricsProvider, ProviderError, ProviderHit};

const API_URL: &str = "http://api.chartlyrics.com/apiv1.asmx/SearchLyricDirect";

/// ChartLyrics XML API.
pub struct ChartLyricsProvider {
    client: reqwest::Client,
}

impl ChartLyricsProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn element_re(name: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{0}>(.*?)</{0}>", name)).expect("element pattern is valid")
}

fn lyric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| element_re("Lyric"))
}

fn artist_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| element_re("LyricArtist"))
}

fn song_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| element_re("LyricSong"))
}

fn element_text(re: &Regex, xml: &str) -> Option<String> {
    let raw = re.captures(xml)?.get(1)?.as_str();
    let text = fragment_text(raw);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Extract `(lyric, artist, song)` from a `GetLyricResult` document.
pub fn parse_lyric_result(xml: &str) -> Option<(String, Option<String>, Option<String>)> {
    let lyric = element_text(lyric_re(), xml)?;
    Some((lyric, element_text(artist_re(), xml), element_text(song_re(), xml)))
}

#[async_trait]
impl LyricsProvider for ChartLyricsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::ChartLyrics
    }

    async fn fetch(
        &self,
        artist: &str,
        title: &str,
        _want_timestamps: bool,
    ) -> Result<ProviderHit, ProviderError> {
        info!("Attempting ChartLyrics for {} - {}", artist, title);

        let response = self
            .client
            .get(API_URL)
            .query(&[("artist", artist), ("song", title)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }

        let body = response.text().await?;
        let (lyric, found_artist, found_song) =
            parse_lyric_result(&body).ok_or(ProviderError::NotFound)?;
        Ok(ProviderHit::new(RawLyrics::Plain(lyric)).with_metadata(found_artist, found_song))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lyric_result() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<GetLyricResult xmlns="http://api.chartLyrics.com/">
  <TrackId>0</TrackId>
  <LyricSong>Don&apos;t Stop</LyricSong>
  <LyricArtist>Fleetwood Mac</LyricArtist>
  <LyricCovertArtUrl>http://example.com/a.jpg</LyricCovertArtUrl>
  <Lyric>If you wake up &amp; don't want to smile
If it takes just a little while</Lyric>
</GetLyricResult>"#;
        let (lyric, artist, song) = parse_lyric_result(xml).unwrap();
        assert!(lyric.starts_with("If you wake up & don't"));
        assert!(lyric.contains('\n'));
        assert_eq!(artist.as_deref(), Some("Fleetwood Mac"));
        assert_eq!(song.as_deref(), Some("Don't Stop"));
    }

    #[test]
    fn test_empty_lyric_is_none() {
        let xml = "<GetLyricResult><LyricId>0</LyricId><Lyric /></GetLyricResult>";
        assert_eq!(parse_lyric_result(xml), None);
        let xml = "<GetLyricResult><Lyric>   </Lyric></GetLyricResult>";
        assert_eq!(parse_lyric_result(xml), None);
    }
}
