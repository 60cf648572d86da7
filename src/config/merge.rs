use std::path::PathBuf;

use super::env::{
    DISABLE_TTS_CACHE, DISABLE_TTS_STREAMING, REDIS_URL, TTS_ARTIFACT_DIR, TTS_CACHE_BACKEND,
    TTS_CACHE_DURATION_MINS, TTS_CACHE_MAX_ENTRIES, TTS_HTTP_PROXY, TTS_HTTP_TIMEOUT_SECS,
    TTS_TRIM_SILENCE, env_bool, env_parse, env_string,
};
use super::yaml::YamlConfig;
use super::{CacheBackend, SynthConfig};
use crate::errors::ConfigError;

/// YAML value first, then the environment, then the default.
macro_rules! get_value {
    ($yaml:expr, $env:expr, $default:expr) => {
        match $yaml {
            Some(v) => v,
            None => $env?.unwrap_or($default),
        }
    };
}

/// Like `get_value!` without a default.
macro_rules! get_optional {
    ($yaml:expr, $env:expr) => {
        match $yaml {
            Some(v) => Some(v),
            None => $env,
        }
    };
}

/// Merge YAML configuration with environment variables
///
/// Priority: YAML > ENV > Default. Passing `None` reads the environment only.
pub fn merge_config(yaml: Option<YamlConfig>) -> Result<SynthConfig, ConfigError> {
    let defaults = SynthConfig::default();
    let yaml = yaml.unwrap_or_default();
    let cache = yaml.cache.unwrap_or_default();
    let synthesis = yaml.synthesis.unwrap_or_default();
    let http = yaml.http.unwrap_or_default();

    let cache_backend = match cache.backend {
        Some(raw) => raw.parse::<CacheBackend>()?,
        None => env_parse::<CacheBackend>(TTS_CACHE_BACKEND)?.unwrap_or(defaults.cache_backend),
    };

    let artifact_dir = get_optional!(synthesis.artifact_dir, env_string(TTS_ARTIFACT_DIR))
        .map(PathBuf::from)
        .unwrap_or(defaults.artifact_dir);

    Ok(SynthConfig {
        cache_duration_mins: get_value!(
            cache.duration_mins,
            env_parse(TTS_CACHE_DURATION_MINS),
            defaults.cache_duration_mins
        ),
        cache_backend,
        cache_max_entries: get_value!(
            cache.max_entries,
            env_parse(TTS_CACHE_MAX_ENTRIES),
            defaults.cache_max_entries
        ),
        redis_url: get_optional!(cache.redis_url, env_string(REDIS_URL)),
        disable_cache: get_value!(
            synthesis.disable_cache,
            env_bool(DISABLE_TTS_CACHE),
            defaults.disable_cache
        ),
        disable_streaming: get_value!(
            synthesis.disable_streaming,
            env_bool(DISABLE_TTS_STREAMING),
            defaults.disable_streaming
        ),
        trim_silence: get_value!(
            synthesis.trim_silence,
            env_bool(TTS_TRIM_SILENCE),
            defaults.trim_silence
        ),
        artifact_dir,
        http_timeout_secs: get_value!(
            http.timeout_secs,
            env_parse(TTS_HTTP_TIMEOUT_SECS),
            defaults.http_timeout_secs
        ),
        http_proxy: get_optional!(http.proxy, env_string(TTS_HTTP_PROXY)),
    })
}
