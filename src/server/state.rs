use std::sync::Arc;
use std::time::Instant;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::core::infrastructure::{Admission, PolicyClass, RateLimiter};
use crate::core::LyricsService;
use crate::error::Result;
use crate::server::error::{ApiError, ApiResult};
use crate::services::SimpleServices;

/// Shared application state
pub struct AppState {
    pub config: Arc<Config>,
    pub lyrics: LyricsService,
    pub limiter: RateLimiter,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<Config>, lyrics: LyricsService, limiter: RateLimiter) -> Self {
        Self {
            config,
            lyrics,
            limiter,
            started_at: Instant::now(),
        }
    }

    pub fn from_services(services: &SimpleServices) -> Result<Self> {
        Ok(Self::new(
            services.config(),
            services.create_lyrics_service()?,
            services.create_rate_limiter(),
        ))
    }

    pub fn check_rate_limit(&self, identity: &str, class: PolicyClass) -> ApiResult<()> {
        match self.limiter.admit(identity, class) {
            Admission::Allowed => Ok(()),
            Admission::Denied { retry_after_secs } => {
                Err(ApiError::RateLimited { retry_after_secs })
            }
        }
    }

    /// Compare a presented admin key against the configured one in constant time.
    pub fn authorize_admin(&self, presented: Option<&str>) -> ApiResult<()> {
        let Some(expected) = self.config.admin_key.as_deref() else {
            return Err(ApiError::AdminDisabled);
        };
        let Some(presented) = presented else {
            return Err(ApiError::Unauthorized);
        };
        if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}
