use std::path::Path;

use super::CacheBackend;
use crate::errors::ConfigError;

/// Validate cache settings
///
/// A Redis backend needs a URL, and a zero TTL would expire every entry on
/// write.
pub fn validate_cache(
    backend: CacheBackend,
    duration_mins: u64,
    redis_url: &Option<String>,
) -> Result<(), ConfigError> {
    if duration_mins == 0 {
        return Err(ConfigError::Invalid(
            "cache duration must be at least one minute".to_string(),
        ));
    }

    if backend == CacheBackend::Redis {
        match redis_url.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(ConfigError::Invalid(
                    "Redis cache backend requires REDIS_URL".to_string(),
                ));
            }
            Some(url) if !url.starts_with("redis://") && !url.starts_with("rediss://") => {
                return Err(ConfigError::invalid_value("redis_url", url));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// The artifact directory must already exist.
pub fn validate_artifact_dir(dir: &Path) -> Result<(), ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::Invalid(format!(
            "artifact directory {} does not exist",
            dir.display()
        )));
    }
    Ok(())
}

pub fn validate_http(timeout_secs: u64, proxy: &Option<String>) -> Result<(), ConfigError> {
    if timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "HTTP timeout must be at least one second".to_string(),
        ));
    }
    if let Some(proxy) = proxy
        && url::Url::parse(proxy).is_err()
    {
        return Err(ConfigError::invalid_value("http proxy", proxy.as_str()));
    }
    Ok(())
}
