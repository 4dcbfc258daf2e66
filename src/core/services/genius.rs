use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info};

use crate::core::model::ProviderId;
use crate::core::normalizer::{MarkupRules, RawLyrics};
use crate::core::services::html::text_with_breaks;
use crate::core::services::{status_error, LyricsProvider, ProviderError, ProviderHit};

const SEARCH_URL: &str = "https://api.genius.com/search";

#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    pub response: SearchResponse,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub result: SongRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SongRecord {
    pub title: Option<String>,
    pub url: String,
    pub primary_artist: Option<ArtistRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRecord {
    pub name: String,
}

/// Genius: authenticated search API, lyrics scraped from the song page.
pub struct GeniusProvider {
    client: reqwest::Client,
    token: String,
    rules: MarkupRules,
}

impl GeniusProvider {
    pub fn new(client: reqwest::Client, token: String) -> Self {
        Self {
            client,
            token,
            rules: MarkupRules {
                strip_section_headers: true,
                ..MarkupRules::none()
            },
        }
    }

    async fn search(&self, artist: &str, title: &str) -> Result<Vec<SearchHit>, ProviderError> {
        let q = format!("{} {}", title, artist);
        let response = self
            .client
            .get(SEARCH_URL)
            .bearer_auth(&self.token)
            .query(&[("q", q.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        let envelope: SearchEnvelope = response.json().await?;
        Ok(envelope.response.hits)
    }

    async fn page(&self, url: &str) -> Result<String, ProviderError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        Ok(response.text().await?)
    }
}

/// Song hits only; the first whose primary artist mentions `artist`, else the first.
pub fn pick_song(hits: Vec<SearchHit>, artist: &str) -> Option<SongRecord> {
    let wanted = artist.to_lowercase();
    let songs: Vec<SongRecord> = hits
        .into_iter()
        .filter(|h| h.kind.as_deref().map_or(true, |k| k == "song"))
        .map(|h| h.result)
        .collect();
    let position = songs
        .iter()
        .position(|s| {
            s.primary_artist
                .as_ref()
                .is_some_and(|a| a.name.to_lowercase().contains(&wanted))
        })
        .unwrap_or(0);
    songs.into_iter().nth(position)
}

/// Joined text of every lyrics container on a song page.
pub fn extract_lyrics(page: &str) -> Option<String> {
    let document = Html::parse_document(page);
    let selector = Selector::parse(r#"div[data-lyrics-container="true"]"#).ok()?;
    let text = document
        .select(&selector)
        .map(text_with_breaks)
        .collect::<Vec<_>>()
        .join("\n");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl LyricsProvider for GeniusProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Genius
    }

    fn markup_rules(&self) -> &MarkupRules {
        &self.rules
    }

    async fn fetch(
        &self,
        artist: &str,
        title: &str,
        _want_timestamps: bool,
    ) -> Result<ProviderHit, ProviderError> {
        info!("Attempting Genius for {} - {}", artist, title);

        let hits = self.search(artist, title).await?;
        let song = pick_song(hits, artist).ok_or(ProviderError::NotFound)?;
        debug!("Genius matched {}", song.url);

        let page = self.page(&song.url).await?;
        let lyrics = extract_lyrics(&page).ok_or(ProviderError::NotFound)?;

        Ok(ProviderHit::new(RawLyrics::Plain(lyrics))
            .with_metadata(song.primary_artist.map(|a| a.name), song.title))
    }
}
