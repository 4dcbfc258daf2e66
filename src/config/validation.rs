use std::net::SocketAddr;
use url::Url;

use crate::core::model::parse_sequence;
use crate::error::{LyricaError, Result};

/// Centralized configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate an http(s) URL string
    pub fn validate_url(url: &str, field_name: &str) -> Result<()> {
        let parsed = Url::parse(url).map_err(|e| {
            LyricaError::Validation(format!("Invalid {} URL '{}': {}", field_name, url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LyricaError::Validation(format!(
                "{} URL must use http or https, got: {}",
                field_name, url
            )));
        }
        Ok(())
    }

    /// Validate numeric range
    pub fn validate_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(LyricaError::Validation(format!(
                "{} must be between {} and {}, got {}",
                field_name, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate a comma-separated provider sequence
    pub fn validate_sequence(value: &str, field_name: &str) -> Result<()> {
        parse_sequence(value).map_err(|e| {
            LyricaError::Validation(format!("Invalid {} '{}': {}", field_name, value, e))
        })?;
        Ok(())
    }

    /// Validate a `host:port` listen address
    pub fn validate_bind_address(value: &str) -> Result<()> {
        value.parse::<SocketAddr>().map_err(|e| {
            LyricaError::Validation(format!("Invalid bind address '{}': {}", value, e))
        })?;
        Ok(())
    }
}
