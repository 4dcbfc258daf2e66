use std::sync::Arc;
use tracing::debug;

use crate::core::infrastructure::cache::{CacheKey, LyricsCache};
use crate::core::model::{LyricsResult, Query};
use crate::core::orchestrator::Orchestrator;
use crate::error::Result;

/// Cache-fronted lookups. Only successes are cached; a failed lookup is
/// retried against the providers next time.
pub struct LyricsService {
    orchestrator: Orchestrator,
    cache: Arc<LyricsCache>,
}

impl LyricsService {
    pub fn new(orchestrator: Orchestrator, cache: Arc<LyricsCache>) -> Self {
        Self { orchestrator, cache }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn cache(&self) -> &Arc<LyricsCache> {
        &self.cache
    }

    pub async fn lookup(&self, query: &Query) -> Result<Arc<LyricsResult>> {
        let key = CacheKey::for_query(query);
        if let Some(cached) = self.cache.lookup(&key) {
            return Ok(cached);
        }

        let result = Arc::new(self.orchestrator.resolve(query).await?);
        self.cache.store_default(key, Arc::clone(&result));
        debug!("Stored result from {} for '{}'", result.source.display_name(), query.title());
        Ok(result)
    }
}
