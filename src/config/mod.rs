//! Configuration for the synthesis cache.
//!
//! Values come from a YAML file and the process environment (a `.env` file is
//! loaded through dotenvy). When both are present YAML wins, then the
//! environment, then the built-in defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable access
//! - `merge`: Merging YAML and environment values
//! - `validation`: Configuration validation logic
//! - `utils`: Parsing helpers
//!
//! # Example
//! ```rust,no_run
//! use voxcache::config::SynthConfig;
//!
//! # fn main() -> Result<(), voxcache::errors::ConfigError> {
//! let config = SynthConfig::from_env()?;
//! let settings = config.synth_settings();
//! println!("cache ttl: {:?}", settings.cache_ttl);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use merge::merge_config;
pub use utils::parse_bool;
pub use yaml::{CacheYaml, HttpYaml, SynthesisYaml, YamlConfig};

use crate::core::cache::CacheConfig;
use crate::core::synth::SynthSettings;
use crate::errors::ConfigError;

/// Which cache service backs the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

impl std::str::FromStr for CacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(ConfigError::invalid_value("cache backend", other)),
        }
    }
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    // Cache
    pub cache_duration_mins: u64,
    pub cache_backend: CacheBackend,
    pub cache_max_entries: u64,
    pub redis_url: Option<String>,

    // Synthesis switches
    pub disable_cache: bool,
    pub disable_streaming: bool,
    pub trim_silence: bool,
    pub artifact_dir: PathBuf,

    // Outbound HTTP
    pub http_timeout_secs: u64,
    pub http_proxy: Option<String>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            cache_duration_mins: 240,
            cache_backend: CacheBackend::Memory,
            cache_max_entries: 100_000,
            redis_url: None,
            disable_cache: false,
            disable_streaming: false,
            trim_silence: false,
            artifact_dir: PathBuf::from("/tmp"),
            http_timeout_secs: 30,
            http_proxy: None,
        }
    }
}

impl SynthConfig {
    /// Loads a YAML file, fills the gaps from the environment and validates
    /// the result.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let yaml = YamlConfig::from_file(path)?;
        let config = merge_config(Some(yaml))?;
        config.validate()?;
        Ok(config)
    }

    /// Lifetime of cached synthesis results.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_duration_mins * 60)
    }

    /// The switches injected into the synthesizer.
    pub fn synth_settings(&self) -> SynthSettings {
        SynthSettings {
            cache_ttl: self.cache_ttl(),
            disable_cache: self.disable_cache,
            disable_streaming: self.disable_streaming,
            trim_silence: self.trim_silence,
        }
    }

    /// Cache service connection settings.
    pub fn cache_config(&self) -> CacheConfig {
        match self.cache_backend {
            CacheBackend::Memory => CacheConfig::Memory {
                max_entries: self.cache_max_entries,
            },
            CacheBackend::Redis => CacheConfig::Redis {
                url: self.redis_url.clone().unwrap_or_default(),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_cache(
            self.cache_backend,
            self.cache_duration_mins,
            &self.redis_url,
        )?;
        validation::validate_artifact_dir(&self.artifact_dir)?;
        validation::validate_http(self.http_timeout_secs, &self.http_proxy)?;
        Ok(())
    }
}
