use std::io::Write;
use std::time::Duration;

use serial_test::serial;
use tempfile::NamedTempFile;

use voxcache::config::{CacheBackend, SynthConfig};
use voxcache::{CacheConfig, ConfigError};

fn clear_env() {
    for var in [
        "TTS_CACHE_DURATION_MINS",
        "TTS_CACHE_BACKEND",
        "TTS_CACHE_MAX_ENTRIES",
        "REDIS_URL",
        "DISABLE_TTS_CACHE",
        "DISABLE_TTS_STREAMING",
        "TTS_TRIM_SILENCE",
        "TTS_ARTIFACT_DIR",
        "TTS_HTTP_TIMEOUT_SECS",
        "TTS_HTTP_PROXY",
    ] {
        unsafe {
            std::env::remove_var(var);
        }
    }
}

#[test]
#[serial]
fn test_from_file_merges_environment() {
    clear_env();
    let artifacts = tempfile::tempdir().unwrap();
    unsafe {
        std::env::set_var("DISABLE_TTS_STREAMING", "1");
        std::env::set_var("TTS_CACHE_DURATION_MINS", "5");
    }

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "cache:\n  duration_mins: 30\nsynthesis:\n  artifact_dir: \"{}\"\n",
        artifacts.path().display()
    )
    .unwrap();

    let config = SynthConfig::from_file(file.path()).unwrap();
    assert_eq!(config.cache_ttl(), Duration::from_secs(30 * 60));
    assert!(config.disable_streaming);
    assert_eq!(config.artifact_dir, artifacts.path());

    let settings = config.synth_settings();
    assert!(settings.disable_streaming);
    assert_eq!(settings.cache_ttl, Duration::from_secs(1800));

    clear_env();
}

#[test]
#[serial]
fn test_redis_backend_without_url_is_rejected() {
    clear_env();
    unsafe {
        std::env::set_var("TTS_CACHE_BACKEND", "redis");
    }

    let err = SynthConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    unsafe {
        std::env::set_var("REDIS_URL", "redis://127.0.0.1:6379/0");
    }
    let config = SynthConfig::from_env().unwrap();
    assert_eq!(config.cache_backend, CacheBackend::Redis);
    assert_eq!(
        config.cache_config(),
        CacheConfig::Redis {
            url: "redis://127.0.0.1:6379/0".to_string()
        }
    );

    clear_env();
}

#[test]
#[serial]
fn test_missing_artifact_dir_is_rejected() {
    clear_env();
    unsafe {
        std::env::set_var("TTS_ARTIFACT_DIR", "/nonexistent/voxcache-artifacts");
    }

    assert!(matches!(
        SynthConfig::from_env(),
        Err(ConfigError::Invalid(_))
    ));

    clear_env();
}
