//! Error handling for the lyrica service
//!
//! This module provides a hierarchical error system. Provider failures are
//! never surfaced from here: the orchestrator folds them into the attempt
//! log. What remains are the errors a caller can actually observe.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::model::Attempt;

#[derive(Error, Debug)]
pub enum LyricaError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Lyrics error: {0}")]
    Lyrics(#[from] LyricsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid config format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Could not determine platform config directory")]
    NoConfigDir,
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum LyricsError {
    /// Every provider in the resolved sequence failed.
    #[error("No lyrics found for '{title}' by '{artist}'")]
    NotFound {
        artist: String,
        title: String,
        attempts: Vec<Attempt>,
    },

    #[error("Invalid provider sequence: {reason}")]
    InvalidSequence { reason: String },
}

pub type Result<T> = std::result::Result<T, LyricaError>;

impl LyricaError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LyricaError::Validation(msg.into())
    }
}

impl From<toml::de::Error> for LyricaError {
    fn from(err: toml::de::Error) -> Self {
        LyricaError::Config(ConfigError::InvalidFormat(err))
    }
}

impl From<reqwest::Error> for LyricaError {
    fn from(err: reqwest::Error) -> Self {
        LyricaError::Network(NetworkError::Http(err))
    }
}
