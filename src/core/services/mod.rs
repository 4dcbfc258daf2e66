//! External lyrics providers
//!
//! Every upstream source implements [`LyricsProvider`]. The registry below is
//! the single ordered table of adapters; adding a provider means one new
//! `ProviderId` variant, one adapter module and one entry in
//! [`ProviderRegistry::from_config`].

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::core::model::ProviderId;
use crate::core::normalizer::{MarkupRules, RawLyrics};

pub mod chartlyrics;
pub mod genius;
pub mod html;
pub mod http;
pub mod lrclib;
pub mod lyricsfreek;
pub mod lyricsovh;
pub mod simpmusic;
pub mod youtube_music;

/// What an adapter found, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderHit {
    /// Artist as reported by the provider, if it reports one.
    pub artist: Option<String>,
    pub title: Option<String>,
    pub body: RawLyrics,
}

impl ProviderHit {
    pub fn new(body: RawLyrics) -> Self {
        Self {
            artist: None,
            title: None,
            body,
        }
    }

    pub fn with_metadata(mut self, artist: Option<String>, title: Option<String>) -> Self {
        self.artist = artist.filter(|a| !a.trim().is_empty());
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// The provider searched and nothing matched.
    #[error("no results")]
    NotFound,

    /// Network, auth or parse failure. Transient.
    #[error("{0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Unavailable("request timed out".to_string())
        } else if err.is_decode() {
            ProviderError::Unavailable(format!("invalid response body: {}", err))
        } else {
            ProviderError::Unavailable(err.to_string())
        }
    }
}

/// Map a non-success HTTP status to a provider error.
pub fn status_error(status: reqwest::StatusCode) -> ProviderError {
    if status == reqwest::StatusCode::NOT_FOUND {
        ProviderError::NotFound
    } else {
        ProviderError::Unavailable(format!("HTTP {}", status))
    }
}

pub static NO_MARKUP: MarkupRules = MarkupRules {
    strip_section_headers: false,
    leading_header: None,
    trailer: None,
};

#[async_trait]
pub trait LyricsProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn supports_timestamps(&self) -> bool {
        self.id().supports_timestamps()
    }

    /// Cleanup the normalizer applies to this provider's bodies.
    fn markup_rules(&self) -> &MarkupRules {
        &NO_MARKUP
    }

    async fn fetch(
        &self,
        artist: &str,
        title: &str,
        want_timestamps: bool,
    ) -> Result<ProviderHit, ProviderError>;
}

/// Adapters keyed by provider id. Ids without an adapter are reported as
/// not configured by the orchestrator.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn LyricsProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any previous one with the same id.
    pub fn register(&mut self, provider: Arc<dyn LyricsProvider>) {
        let id = provider.id();
        self.providers.retain(|p| p.id() != id);
        self.providers.push(provider);
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn LyricsProvider>> {
        self.providers.iter().find(|p| p.id() == id).cloned()
    }

    pub fn is_configured(&self, id: ProviderId) -> bool {
        self.providers.iter().any(|p| p.id() == id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let mut registry = Self::new();

        match config.genius_token.as_deref() {
            Some(token) => registry.register(Arc::new(genius::GeniusProvider::new(
                client.clone(),
                token.to_string(),
            ))),
            None => info!("Genius token not configured; provider 1 disabled"),
        }
        registry.register(Arc::new(lrclib::LrclibProvider::new(
            client.clone(),
            &config.lrclib_instance,
        )));
        registry.register(Arc::new(simpmusic::SimpMusicProvider::new(
            client.clone(),
            &config.simpmusic_instance,
        )));
        registry.register(Arc::new(youtube_music::YoutubeMusicProvider::new(client.clone())));
        registry.register(Arc::new(lyricsovh::LyricsOvhProvider::new(client.clone())));
        registry.register(Arc::new(chartlyrics::ChartLyricsProvider::new(client.clone())));
        registry.register(Arc::new(lyricsfreek::LyricsFreekProvider::new(client)));

        info!("{} lyrics providers configured", registry.len());
        registry
    }
}
