use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::core::model::ProviderId;
use crate::core::normalizer::{MarkupRules, RawLyrics};
use crate::core::services::{status_error, LyricsProvider, ProviderError, ProviderHit};

const API_BASE: &str = "https://api.lyrics.ovh/v1/";

#[derive(Debug, Deserialize)]
struct OvhResponse {
    lyrics: Option<String>,
    error: Option<String>,
}

pub struct LyricsOvhProvider {
    client: reqwest::Client,
    rules: MarkupRules,
}

impl LyricsOvhProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            rules: MarkupRules {
                leading_header: Regex::new(r"(?i)^paroles de la chanson .+ par ").ok(),
                ..MarkupRules::none()
            },
        }
    }
}

/// `https://api.lyrics.ovh/v1/{artist}/{title}` with both segments escaped.
pub fn lyrics_url(artist: &str, title: &str) -> Result<Url, ProviderError> {
    let mut url = Url::parse(API_BASE).map_err(|e| ProviderError::Unavailable(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ProviderError::Unavailable("base URL cannot hold a path".to_string()))?
        .pop_if_empty()
        .push(artist)
        .push(title);
    Ok(url)
}

#[async_trait]
impl LyricsProvider for LyricsOvhProvider {
    fn id(&self) -> ProviderId {
        ProviderId::LyricsOvh
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
        info!("Attempting Lyrics.ovh for {} - {}", artist, title);

        let response = self.client.get(lyrics_url(artist, title)?).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }

        let data: OvhResponse = response.json().await?;
        match data.lyrics.filter(|l| !l.trim().is_empty()) {
            Some(lyrics) => Ok(ProviderHit::new(RawLyrics::Plain(lyrics))),
            None => {
                if let Some(error) = data.error {
                    info!("Lyrics.ovh: {}", error);
                }
                Err(ProviderError::NotFound)
            }
        }
    }
}
