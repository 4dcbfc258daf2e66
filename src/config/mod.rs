use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::model::{format_sequence, TimestampsPolicy};
use crate::core::orchestrator::{DEFAULT_PLAIN_SEQUENCE, DEFAULT_TIMED_SEQUENCE};
use crate::core::services::{lrclib, simpmusic};
use crate::error::{ConfigError, Result};

pub mod env;
pub mod validation;

pub use env::{EnvParser, EnvVars};
pub use validation::ConfigValidator;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listen address for `serve`
    pub bind_address: String,

    /// Key for the admin endpoints. Admin endpoints are disabled without it.
    pub admin_key: Option<String>,

    /// Genius API token. Provider 1 is skipped without it.
    pub genius_token: Option<String>,

    /// LRCLIB instance URL
    pub lrclib_instance: String,

    /// SimpMusic lyrics API base URL
    pub simpmusic_instance: String,

    /// Per-provider call timeout (seconds)
    pub provider_timeout_secs: u64,

    /// Budget for a whole lookup across providers (seconds)
    pub request_deadline_secs: u64,

    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,

    /// What `timestamps=true` means when `timed_only` is not given
    pub timestamps_mode: TimestampsPolicy,

    /// Plain lookups allowed per client per window
    pub general_rate_limit: u32,
    pub general_window_secs: u64,

    /// Custom-sequence lookups and cache clears allowed per client per window
    pub heavy_rate_limit: u32,
    pub heavy_window_secs: u64,

    /// Key rate limits on the first `X-Forwarded-For` hop instead of the
    /// peer address. Enable only behind a proxy that sets the header.
    pub trust_forwarded_for: bool,

    /// Default provider order for plain lookups
    pub plain_sequence: String,

    /// Default provider order when timestamps are requested
    pub timed_sequence: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9999".to_string(),
            admin_key: None,
            genius_token: None,
            lrclib_instance: lrclib::DEFAULT_INSTANCE.to_string(),
            simpmusic_instance: simpmusic::DEFAULT_INSTANCE.to_string(),
            provider_timeout_secs: 12,
            request_deadline_secs: 60,
            cache_ttl_secs: 300,
            cache_max_entries: 10_000,
            timestamps_mode: TimestampsPolicy::Prefer,
            general_rate_limit: 15,
            general_window_secs: 60,
            heavy_rate_limit: 5,
            heavy_window_secs: 600,
            trust_forwarded_for: false,
            plain_sequence: format_sequence(&DEFAULT_PLAIN_SEQUENCE),
            timed_sequence: format_sequence(&DEFAULT_TIMED_SEQUENCE),
        }
    }
}

impl Config {
    /// Defaults, then the config file, then `.env` and the process environment.
    ///
    /// An explicit `config_path` must exist; the platform default may be absent.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // .env is optional
        dotenvy::dotenv().ok();

        let mut config = match config_path {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(ConfigError::FileNotFound { path }.into());
                }
                Self::from_file(&path)?
            }
            None => match Self::default_config_path() {
                Ok(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override fields from environment variables (highest priority)
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(addr) = EnvParser::parse_string(EnvVars::BIND_ADDRESS, None)? {
            self.bind_address = addr;
        } else if let Some(port) = EnvParser::parse_u64(EnvVars::LEGACY_PORT, 1, 65535)? {
            self.bind_address = format!("0.0.0.0:{}", port);
        }

        if let Some(key) =
            EnvParser::parse_string_any(&[EnvVars::ADMIN_KEY, EnvVars::LEGACY_ADMIN_KEY])?
        {
            self.admin_key = Some(key);
        }
        if let Some(token) =
            EnvParser::parse_string_any(&[EnvVars::GENIUS_TOKEN, EnvVars::LEGACY_GENIUS_TOKEN])?
        {
            self.genius_token = Some(token);
        }

        if let Some(url) = EnvParser::parse_string(EnvVars::LRCLIB_INSTANCE, None)? {
            self.lrclib_instance = url;
        }
        if let Some(url) = EnvParser::parse_string(EnvVars::SIMPMUSIC_INSTANCE, None)? {
            self.simpmusic_instance = url;
        }

        if let Some(v) = EnvParser::parse_u64(EnvVars::PROVIDER_TIMEOUT_SECS, 1, 120)? {
            self.provider_timeout_secs = v;
        }
        if let Some(v) = EnvParser::parse_u64(EnvVars::REQUEST_DEADLINE_SECS, 1, 600)? {
            self.request_deadline_secs = v;
        }
        if let Some(v) = EnvParser::parse_u64(EnvVars::CACHE_TTL_SECS, 1, 86_400)? {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = EnvParser::parse_usize(EnvVars::CACHE_MAX_ENTRIES, 1, 1_000_000)? {
            self.cache_max_entries = v;
        }

        if let Some(mode) = EnvParser::parse_string(EnvVars::TIMESTAMPS_MODE, None)? {
            self.timestamps_mode = mode.parse().map_err(|_: String| ConfigError::InvalidValue {
                field: EnvVars::TIMESTAMPS_MODE.to_string(),
                value: mode.clone(),
            })?;
        }

        if let Some(v) = EnvParser::parse_u32(EnvVars::GENERAL_RATE_LIMIT, 1, 100_000)? {
            self.general_rate_limit = v;
        }
        if let Some(v) = EnvParser::parse_u64(EnvVars::GENERAL_WINDOW_SECS, 1, 86_400)? {
            self.general_window_secs = v;
        }
        if let Some(v) = EnvParser::parse_u32(EnvVars::HEAVY_RATE_LIMIT, 1, 100_000)? {
            self.heavy_rate_limit = v;
        }
        if let Some(v) = EnvParser::parse_u64(EnvVars::HEAVY_WINDOW_SECS, 1, 86_400)? {
            self.heavy_window_secs = v;
        }

        if let Some(trust) = EnvParser::parse_bool(EnvVars::TRUST_FORWARDED_FOR)? {
            self.trust_forwarded_for = trust;
        }

        if let Some(seq) = EnvParser::parse_string(EnvVars::PLAIN_SEQUENCE, None)? {
            self.plain_sequence = seq;
        }
        if let Some(seq) = EnvParser::parse_string(EnvVars::TIMED_SEQUENCE, None)? {
            self.timed_sequence = seq;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate_bind_address(&self.bind_address)?;
        ConfigValidator::validate_url(&self.lrclib_instance, "LRCLIB")?;
        ConfigValidator::validate_url(&self.simpmusic_instance, "SimpMusic")?;
        ConfigValidator::validate_range(
            self.provider_timeout_secs,
            1,
            120,
            "provider_timeout_secs",
        )?;
        ConfigValidator::validate_range(
            self.request_deadline_secs,
            1,
            600,
            "request_deadline_secs",
        )?;
        ConfigValidator::validate_range(self.cache_ttl_secs, 1, 86_400, "cache_ttl_secs")?;
        ConfigValidator::validate_range(self.cache_max_entries, 1, 1_000_000, "cache_max_entries")?;
        ConfigValidator::validate_range(self.general_rate_limit, 1, 100_000, "general_rate_limit")?;
        ConfigValidator::validate_range(
            self.general_window_secs,
            1,
            86_400,
            "general_window_secs",
        )?;
        ConfigValidator::validate_range(self.heavy_rate_limit, 1, 100_000, "heavy_rate_limit")?;
        ConfigValidator::validate_range(self.heavy_window_secs, 1, 86_400, "heavy_window_secs")?;
        ConfigValidator::validate_sequence(&self.plain_sequence, "plain_sequence")?;
        ConfigValidator::validate_sequence(&self.timed_sequence, "timed_sequence")?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::from)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// TOML rendering with secrets masked, for display.
    pub fn redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        let mask = |v: &mut Option<String>| {
            if v.is_some() {
                *v = Some("********".to_string());
            }
        };
        mask(&mut shown.admin_key);
        mask(&mut shown.genius_token);
        Ok(toml::to_string_pretty(&shown).map_err(ConfigError::from)?)
    }

    fn default_config_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("app", "lyrica", "lyrica").ok_or(ConfigError::NoConfigDir)?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Self::default_config_path()
    }
}
