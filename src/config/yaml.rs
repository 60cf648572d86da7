use serde::Deserialize;
use std::path::Path;

use crate::errors::ConfigError;

/// Complete YAML configuration structure
///
/// All fields are optional; anything missing falls back to the environment
/// and then to defaults.
///
/// # Example YAML structure
/// ```yaml
/// cache:
///   backend: "redis"
///   duration_mins: 240
///   max_entries: 100000
///   redis_url: "redis://127.0.0.1:6379/0"
///
/// synthesis:
///   disable_cache: false
///   disable_streaming: false
///   trim_silence: true
///   artifact_dir: "/var/tmp/tts"
///
/// http:
///   timeout_secs: 30
///   proxy: "http://proxy.internal:3128"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub cache: Option<CacheYaml>,
    pub synthesis: Option<SynthesisYaml>,
    pub http: Option<HttpYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CacheYaml {
    pub backend: Option<String>,
    pub duration_mins: Option<u64>,
    pub max_entries: Option<u64>,
    pub redis_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SynthesisYaml {
    pub disable_cache: Option<bool>,
    pub disable_streaming: Option<bool>,
    pub trim_silence: Option<bool>,
    pub artifact_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct HttpYaml {
    pub timeout_secs: Option<u64>,
    pub proxy: Option<String>,
}

impl YamlConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str_with_path(&content, path)
    }

    fn from_str_with_path(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }
}
