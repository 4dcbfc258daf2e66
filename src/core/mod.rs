//! Core functionality modules
//!
//! This module contains all core business logic organized into logical layers:
//! - `model`: Queries, provider ids and results
//! - `services`: External lyrics providers
//! - `normalizer`: Provider bodies to canonical lyrics
//! - `orchestrator`: Ordered fallback across providers
//! - `infrastructure`: Cross-cutting concerns (cache, rate limiting)
//! - `lyrics`: Cache-fronted lookup used by the CLI and the server

pub mod infrastructure;
pub mod lyrics;
pub mod model;
pub mod normalizer;
pub mod orchestrator;
pub mod services;

pub use lyrics::LyricsService;
