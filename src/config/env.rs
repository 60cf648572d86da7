use std::env;
use std::str::FromStr;

use super::SynthConfig;
use super::merge::merge_config;
use super::utils::parse_bool;
use crate::errors::ConfigError;

pub const TTS_CACHE_DURATION_MINS: &str = "TTS_CACHE_DURATION_MINS";
pub const TTS_CACHE_BACKEND: &str = "TTS_CACHE_BACKEND";
pub const TTS_CACHE_MAX_ENTRIES: &str = "TTS_CACHE_MAX_ENTRIES";
pub const REDIS_URL: &str = "REDIS_URL";
pub const DISABLE_TTS_CACHE: &str = "DISABLE_TTS_CACHE";
pub const DISABLE_TTS_STREAMING: &str = "DISABLE_TTS_STREAMING";
pub const TTS_TRIM_SILENCE: &str = "TTS_TRIM_SILENCE";
pub const TTS_ARTIFACT_DIR: &str = "TTS_ARTIFACT_DIR";
pub const TTS_HTTP_TIMEOUT_SECS: &str = "TTS_HTTP_TIMEOUT_SECS";
pub const TTS_HTTP_PROXY: &str = "TTS_HTTP_PROXY";

/// A set, non-empty environment variable.
pub(super) fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub(super) fn env_bool(name: &str) -> Result<Option<bool>, ConfigError> {
    env_string(name)
        .map(|v| parse_bool(&v).ok_or_else(|| ConfigError::invalid_value(name, v)))
        .transpose()
}

pub(super) fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    env_string(name)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::invalid_value(name, v.clone()))
        })
        .transpose()
}

impl SynthConfig {
    /// Load configuration from environment variables
    ///
    /// Also loads a `.env` file if present. Unset variables take their
    /// defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let config = merge_config(None)?;
        config.validate()?;
        Ok(config)
    }
}
