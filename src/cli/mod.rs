//! Command Line Interface module
//!
//! - `lyrics`: one-shot lookup printed as text, JSON or LRC
//! - `serve`: run the HTTP service
//! - `providers`: list provider numbers and their state
//! - `cache`: inspect or clear a running server's cache
//! - `config`: show the effective configuration

pub mod cache;
pub mod config;
pub mod lyrics;
pub mod providers;
pub mod serve;
