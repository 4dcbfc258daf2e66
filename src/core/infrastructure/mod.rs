//! Infrastructure and cross-cutting concerns
//!
//! This module contains the shared state the server owns:
//! - Result cache with per-entry expiry
//! - Per-client rate limiting

pub mod cache;
pub mod rate_limit;

pub use cache::{CacheKey, CacheStats, LyricsCache};
pub use rate_limit::{Admission, PolicyClass, RateLimiter, RatePolicy};
