use std::env;

use crate::error::{LyricaError, Result};

/// Environment variable configuration constants
pub struct EnvVars;

impl EnvVars {
    pub const BIND_ADDRESS: &'static str = "LYRICA_BIND_ADDRESS";
    pub const ADMIN_KEY: &'static str = "LYRICA_ADMIN_KEY";
    pub const GENIUS_TOKEN: &'static str = "LYRICA_GENIUS_TOKEN";
    pub const LRCLIB_INSTANCE: &'static str = "LYRICA_LRCLIB_INSTANCE";
    pub const SIMPMUSIC_INSTANCE: &'static str = "LYRICA_SIMPMUSIC_INSTANCE";
    pub const PROVIDER_TIMEOUT_SECS: &'static str = "LYRICA_PROVIDER_TIMEOUT_SECS";
    pub const REQUEST_DEADLINE_SECS: &'static str = "LYRICA_REQUEST_DEADLINE_SECS";
    pub const CACHE_TTL_SECS: &'static str = "LYRICA_CACHE_TTL_SECS";
    pub const CACHE_MAX_ENTRIES: &'static str = "LYRICA_CACHE_MAX_ENTRIES";
    pub const TIMESTAMPS_MODE: &'static str = "LYRICA_TIMESTAMPS_MODE";
    pub const GENERAL_RATE_LIMIT: &'static str = "LYRICA_GENERAL_RATE_LIMIT";
    pub const GENERAL_WINDOW_SECS: &'static str = "LYRICA_GENERAL_WINDOW_SECS";
    pub const HEAVY_RATE_LIMIT: &'static str = "LYRICA_HEAVY_RATE_LIMIT";
    pub const HEAVY_WINDOW_SECS: &'static str = "LYRICA_HEAVY_WINDOW_SECS";
    pub const PLAIN_SEQUENCE: &'static str = "LYRICA_PLAIN_SEQUENCE";
    pub const TIMED_SEQUENCE: &'static str = "LYRICA_TIMED_SEQUENCE";
    pub const TRUST_FORWARDED_FOR: &'static str = "LYRICA_TRUST_FORWARDED_FOR";
    pub const LOG_JSON: &'static str = "LYRICA_LOG_JSON";

    // Unprefixed names kept for existing deployments
    pub const LEGACY_GENIUS_TOKEN: &'static str = "GENIUS_TOKEN";
    pub const LEGACY_ADMIN_KEY: &'static str = "ADMIN_KEY";
    pub const LEGACY_PORT: &'static str = "PORT";
}

/// Environment variable parsing utilities with validation
pub struct EnvParser;

impl EnvParser {
    /// Parse environment variable as string with validation
    pub fn parse_string(
        var_name: &str,
        validator: Option<fn(&str) -> Result<()>>,
    ) -> Result<Option<String>> {
        match env::var(var_name) {
            Ok(value) => {
                let trimmed = value.trim().to_string();
                if trimmed.is_empty() {
                    return Ok(None);
                }

                if let Some(validate_fn) = validator {
                    validate_fn(&trimmed)?;
                }

                Ok(Some(trimmed))
            }
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(LyricaError::Validation(format!(
                "Environment variable {} contains invalid UTF-8",
                var_name
            ))),
        }
    }

    /// First of several variable names that is set
    pub fn parse_string_any(var_names: &[&str]) -> Result<Option<String>> {
        for name in var_names {
            if let Some(value) = Self::parse_string(name, None)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Parse environment variable as boolean with validation
    pub fn parse_bool(var_name: &str) -> Result<Option<bool>> {
        if let Some(value_str) = Self::parse_string(var_name, None)? {
            match value_str.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(LyricaError::Validation(format!(
                    "Invalid boolean value in {}: '{}'. Use: true/false, 1/0, yes/no, on/off",
                    var_name, value_str
                ))),
            }
        } else {
            Ok(None)
        }
    }

    /// Parse environment variable as u64 with range validation
    pub fn parse_u64(var_name: &str, min: u64, max: u64) -> Result<Option<u64>> {
        if let Some(value_str) = Self::parse_string(var_name, None)? {
            let value = value_str.parse::<u64>().map_err(|_| {
                LyricaError::Validation(format!(
                    "Invalid number in {}: '{}'. Must be a positive integer",
                    var_name, value_str
                ))
            })?;

            if value < min || value > max {
                return Err(LyricaError::Validation(format!(
                    "Value in {} must be between {} and {}, got {}",
                    var_name, min, max, value
                )));
            }

            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    pub fn parse_u32(var_name: &str, min: u32, max: u32) -> Result<Option<u32>> {
        Ok(Self::parse_u64(var_name, min as u64, max as u64)?.map(|v| v as u32))
    }

    pub fn parse_usize(var_name: &str, min: usize, max: usize) -> Result<Option<usize>> {
        Ok(Self::parse_u64(var_name, min as u64, max as u64)?.map(|v| v as usize))
    }

    /// Get all LYRICA environment variables for debugging
    pub fn get_all_lyrica_vars() -> Vec<(String, String)> {
        env::vars()
            .filter(|(key, _)| key.starts_with("LYRICA_"))
            .collect()
    }
}
