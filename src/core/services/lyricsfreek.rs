use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::info;

use crate::core::model::ProviderId;
use crate::core::normalizer::{MarkupRules, RawLyrics};
use crate::core::services::html::text_with_breaks;
use crate::core::services::{status_error, LyricsProvider, ProviderError, ProviderHit};

const SITE: &str = "https://www.lyricsfreek.com";
const LYRICS_SELECTORS: [&str; 3] = ["div.lyrics", "div#lyrics", ".lyric-content"];

pub struct LyricsFreekProvider {
    client: reqwest::Client,
    rules: MarkupRules,
}

impl LyricsFreekProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            rules: MarkupRules {
                trailer: Regex::new(r"(?is)\n*Submit Corrections.*").ok(),
                ..MarkupRules::none()
            },
        }
    }
}

fn strip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("static slug pattern is valid"))
}

/// Lowercase, punctuation removed, whitespace runs joined by `-`.
pub fn slug(value: &str) -> String {
    let lowered = value.to_lowercase();
    let cleaned = strip_re().replace_all(&lowered, "");
    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}

pub fn page_url(artist: &str, title: &str) -> String {
    format!("{}/{}/{}-lyrics", SITE, slug(artist), slug(title))
}

/// Lyrics block of a song page, trying the known layouts in order.
pub fn extract_lyrics(page: &str) -> Option<String> {
    let document = Html::parse_document(page);
    LYRICS_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        let element = document.select(&selector).next()?;
        let text = text_with_breaks(element);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    })
}

#[async_trait]
impl LyricsProvider for LyricsFreekProvider {
    fn id(&self) -> ProviderId {
        ProviderId::LyricsFreek
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
        let url = page_url(artist, title);
        info!("Attempting LyricsFreek at {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        let page = response.text().await?;
        let lyrics = extract_lyrics(&page).ok_or(ProviderError::NotFound)?;
        Ok(ProviderHit::new(RawLyrics::Plain(lyrics)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Lyrics;
    use crate::core::normalizer::normalize;

    #[test]
    fn test_slug_and_url() {
        assert_eq!(slug("Guns N' Roses"), "guns-n-roses");
        assert_eq!(slug("  Sweet   Child o' Mine! "), "sweet-child-o-mine");
        assert_eq!(
            page_url("AC/DC", "Back In Black"),
            "https://www.lyricsfreek.com/acdc/back-in-black-lyrics"
        );
    }

    #[test]
    fn test_extract_falls_through_selectors() {
        let page = r#"<html><body><div id="lyrics">First line<br>Second line<br><br>Submit Corrections<br>ad</div></body></html>"#;
        let text = extract_lyrics(page).unwrap();
        let provider = LyricsFreekProvider::new(reqwest::Client::new());
        assert_eq!(
            normalize(RawLyrics::Plain(text), provider.markup_rules()).unwrap(),
            Lyrics::Plain("First line\nSecond line".to_string())
        );
        assert_eq!(extract_lyrics("<div class=\"other\">x</div>"), None);
    }
}
