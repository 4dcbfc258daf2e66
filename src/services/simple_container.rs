use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::core::infrastructure::{LyricsCache, RateLimiter, RatePolicy};
use crate::core::orchestrator::{EngineSettings, Orchestrator};
use crate::core::services::{http::build_http_client, ProviderRegistry};
use crate::core::LyricsService;
use crate::error::Result;

pub struct SimpleServices {
    config: Arc<Config>,
}

impl SimpleServices {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn create_registry(&self) -> Result<ProviderRegistry> {
        let client = build_http_client()?;
        Ok(ProviderRegistry::from_config(&self.config, client))
    }

    pub fn create_orchestrator(&self) -> Result<Orchestrator> {
        let settings = EngineSettings::from_config(&self.config)?;
        Ok(Orchestrator::new(self.create_registry()?, settings))
    }

    pub fn create_cache(&self) -> LyricsCache {
        LyricsCache::new(
            Duration::from_secs(self.config.cache_ttl_secs),
            self.config.cache_max_entries,
        )
    }

    pub fn create_rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(
            RatePolicy::new(
                self.config.general_rate_limit,
                Duration::from_secs(self.config.general_window_secs),
            ),
            RatePolicy::new(
                self.config.heavy_rate_limit,
                Duration::from_secs(self.config.heavy_window_secs),
            ),
        )
    }

    pub fn create_lyrics_service(&self) -> Result<LyricsService> {
        Ok(LyricsService::new(
            self.create_orchestrator()?,
            Arc::new(self.create_cache()),
        ))
    }
}
