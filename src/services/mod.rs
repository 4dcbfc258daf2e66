//! Service wiring
//!
//! `SimpleServices` turns a loaded [`Config`](crate::config::Config) into the
//! provider registry, orchestrator, cache and rate limiter used by the CLI
//! and the server.

pub mod simple_container;

pub use simple_container::SimpleServices;
