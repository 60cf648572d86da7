//! End-to-end tests of the cache-aside synthesizer against mocked providers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voxcache::core::cache::{CacheError, KeyValueStore, MemoryKeyValueStore};
use voxcache::core::synth::{
    ApiKeyCredentials, CustomCredentials, FsArtifactSink, MemoryStats, ProviderCredentials,
    SpeechSynthesizer, SynthSettings, SynthesisOutput, SynthesisRequest,
};
use voxcache::core::tts::{BackendRegistry, DeepgramBackend};
use voxcache::{PurgeScope, SynthError, purge, size};

const AUDIO: &[u8] = b"ID3\x04\x00fake-mp3-frames";

struct Harness {
    synthesizer: SpeechSynthesizer,
    store: Arc<MemoryKeyValueStore>,
    stats: Arc<MemoryStats>,
    artifacts: TempDir,
}

fn harness(settings: SynthSettings, deepgram_url: Option<String>) -> Harness {
    let store = Arc::new(MemoryKeyValueStore::new(1_000));
    let stats = Arc::new(MemoryStats::new());
    let artifacts = tempfile::tempdir().unwrap();

    let mut registry = BackendRegistry::new();
    if let Some(url) = deepgram_url {
        registry.register(Arc::new(DeepgramBackend::with_url(url)));
    }

    let synthesizer = SpeechSynthesizer::new(
        settings,
        store.clone(),
        Arc::new(FsArtifactSink::new(artifacts.path())),
    )
    .with_registry(registry)
    .with_stats(stats.clone());

    Harness {
        synthesizer,
        store,
        stats,
        artifacts,
    }
}

fn custom_request(server: &MockServer, text: &str) -> SynthesisRequest {
    SynthesisRequest::new("custom", text)
        .with_language("en-US")
        .with_voice("narrator")
        .with_credentials(ProviderCredentials::Custom(CustomCredentials {
            url: format!("{}/tts", server.uri()),
            auth_token: Some("secret-token".to_string()),
        }))
}

fn deepgram_request(text: &str) -> SynthesisRequest {
    SynthesisRequest::new("deepgram", text)
        .with_language("en-US")
        .with_voice("aura-asteria-en")
        .with_credentials(ProviderCredentials::Deepgram(ApiKeyCredentials {
            api_key: "dg-key".to_string(),
        }))
}

async fn mount_custom(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/tts"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(AUDIO),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn artifact_count(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

#[tokio::test]
async fn test_miss_then_hit_calls_provider_once() {
    let server = MockServer::start().await;
    mount_custom(&server, 1).await;
    let h = harness(SynthSettings::default(), None);

    let first = h
        .synthesizer
        .get_or_synthesize(custom_request(&server, "Welcome back"))
        .await
        .unwrap();
    assert!(!first.served_from_cache);
    assert!(first.elapsed.is_some());
    assert!(first.cache_key.starts_with("tts:"));

    let second = h
        .synthesizer
        .get_or_synthesize(custom_request(&server, "Welcome back"))
        .await
        .unwrap();
    assert!(second.served_from_cache);
    assert!(second.elapsed.is_none());
    assert_eq!(second.cache_key, first.cache_key);

    let path = second.artifact_path().unwrap();
    assert_eq!(path.extension().unwrap(), "mp3");
    assert_eq!(std::fs::read(path).unwrap(), AUDIO);

    assert_eq!(h.stats.count("tts.cache.requests", "found:no"), 1.0);
    assert_eq!(h.stats.count("tts.cache.requests", "found:yes"), 1.0);
    assert_eq!(h.stats.count("tts.count", "accepted:yes"), 1.0);
}

#[tokio::test]
async fn test_cache_hit_restores_ttl() {
    let server = MockServer::start().await;
    mount_custom(&server, 1).await;
    let settings = SynthSettings {
        cache_ttl: Duration::from_secs(3600),
        ..Default::default()
    };
    let h = harness(settings, None);

    let first = h
        .synthesizer
        .get_or_synthesize(custom_request(&server, "Refresh me"))
        .await
        .unwrap();

    h.store
        .expire(&first.cache_key, Duration::from_secs(5))
        .await
        .unwrap();

    let second = h
        .synthesizer
        .get_or_synthesize(custom_request(&server, "Refresh me"))
        .await
        .unwrap();
    assert!(second.served_from_cache);

    // The refresh runs in a spawned task.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let ttl = h.store.ttl(&first.cache_key).await.unwrap().unwrap();
    assert!(ttl > Duration::from_secs(3500), "ttl was {ttl:?}");
}

#[tokio::test]
async fn test_aliases_and_case_share_cache_entry() {
    let server = MockServer::start().await;
    mount_custom(&server, 1).await;
    let h = harness(SynthSettings::default(), None);

    let first = h
        .synthesizer
        .get_or_synthesize(custom_request(&server, "Same text"))
        .await
        .unwrap();

    let mut shouted = custom_request(&server, "Same text");
    shouted.provider = "CUSTOM".to_string();
    let second = h.synthesizer.get_or_synthesize(shouted).await.unwrap();

    assert!(second.served_from_cache);
    assert_eq!(first.cache_key, second.cache_key);
}

#[tokio::test]
async fn test_streaming_provider_returns_directive_without_side_effects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(AUDIO))
        .expect(0)
        .mount(&server)
        .await;
    let h = harness(SynthSettings::default(), Some(server.uri()));

    let result = h
        .synthesizer
        .get_or_synthesize(deepgram_request("Stream this, please"))
        .await
        .unwrap();

    let directive = result.directive().expect("streaming directive");
    assert_eq!(directive.get("vendor"), Some("deepgram"));
    assert_eq!(directive.get("voice"), Some("aura-asteria-en"));
    assert_eq!(directive.get("api_key"), Some("dg-key"));
    assert_eq!(directive.get("write_cache_file"), Some("1"));
    assert_eq!(directive.get("cache_key"), Some(result.cache_key.as_str()));
    assert_eq!(directive.text(), "Stream this, please");

    assert!(!result.served_from_cache);
    assert!(h.store.get(&result.cache_key).await.unwrap().is_none());
    assert_eq!(artifact_count(&h.artifacts), 0);
}

#[tokio::test]
async fn test_streaming_directive_without_cache_write_when_lookup_disabled() {
    let h = harness(
        SynthSettings {
            disable_cache: true,
            ..Default::default()
        },
        None,
    );

    let result = h
        .synthesizer
        .get_or_synthesize(deepgram_request("No caching"))
        .await
        .unwrap();

    let directive = result.directive().unwrap();
    assert_eq!(directive.get("write_cache_file"), Some("0"));
    assert_eq!(directive.get("cache_key"), None);
    assert_eq!(h.stats.count("tts.cache.requests", "found:no"), 1.0);
}

#[tokio::test]
async fn test_render_for_caching_forces_mp3_render() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("model", "aura-asteria-en"))
        .and(query_param("encoding", "mp3"))
        .and(header("authorization", "Token dg-key"))
        .and(body_partial_json(serde_json::json!({ "text": "Render me" })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(AUDIO))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(SynthSettings::default(), Some(server.uri()));

    let mut request = deepgram_request("Render me");
    request.render_for_caching = true;
    let result = h.synthesizer.get_or_synthesize(request).await.unwrap();

    match &result.output {
        SynthesisOutput::Audio { format, .. } => {
            assert_eq!(format.extension, "mp3");
            assert_eq!(format.sample_rate, 22050);
        }
        other => panic!("expected audio, got {other:?}"),
    }
    assert!(h.store.get(&result.cache_key).await.unwrap().is_some());
}

#[tokio::test]
async fn test_global_disable_streaming_renders_mp3() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("encoding", "linear16"))
        .and(query_param("sample_rate", "8000"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 320]))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("encoding", "mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(AUDIO))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(
        SynthSettings {
            disable_streaming: true,
            ..Default::default()
        },
        Some(server.uri()),
    );

    let result = h
        .synthesizer
        .get_or_synthesize(deepgram_request("Globally rendered"))
        .await
        .unwrap();
    assert!(result.artifact_path().is_some());
}

#[tokio::test]
async fn test_rendered_format_ignores_response_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("encoding", "mp3"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/wav")
                .set_body_bytes(AUDIO),
        )
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(
        SynthSettings {
            disable_streaming: true,
            ..Default::default()
        },
        Some(server.uri()),
    );

    let result = h
        .synthesizer
        .get_or_synthesize(deepgram_request("Header says wav"))
        .await
        .unwrap();
    match &result.output {
        SynthesisOutput::Audio {
            artifact_path,
            format,
        } => {
            assert_eq!(format.extension, "mp3");
            assert_eq!(format.sample_rate, 22050);
            assert_eq!(artifact_path.extension().unwrap(), "mp3");
        }
        other => panic!("expected audio, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disable_cache_skips_lookup_but_still_writes() {
    let server = MockServer::start().await;
    mount_custom(&server, 2).await;
    let h = harness(SynthSettings::default(), None);

    let first = h
        .synthesizer
        .get_or_synthesize(custom_request(&server, "Always fresh"))
        .await
        .unwrap();
    h.store.del(&[first.cache_key.clone()]).await.unwrap();

    let mut request = custom_request(&server, "Always fresh");
    request.disable_cache = true;
    let second = h.synthesizer.get_or_synthesize(request.clone()).await.unwrap();
    assert!(!second.served_from_cache);
    assert!(h.store.get(&second.cache_key).await.unwrap().is_some());

    // Without the flag the entry written above is served.
    request.disable_cache = false;
    let third = h.synthesizer.get_or_synthesize(request).await.unwrap();
    assert!(third.served_from_cache);
}

#[tokio::test]
async fn test_provider_failure_caches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(SynthSettings::default(), None);

    let err = h
        .synthesizer
        .get_or_synthesize(custom_request(&server, "Doomed"))
        .await
        .unwrap_err();

    match err {
        SynthError::Provider {
            provider, status, ..
        } => {
            assert_eq!(provider, "custom");
            assert_eq!(status, Some(503));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(size(h.store.as_ref(), None).await.unwrap(), 0);
    assert_eq!(artifact_count(&h.artifacts), 0);
    assert_eq!(h.stats.count("tts.count", "accepted:no"), 1.0);
}

#[tokio::test]
async fn test_validation_happens_before_io() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(AUDIO))
        .expect(0)
        .mount(&server)
        .await;
    let h = harness(SynthSettings::default(), Some(server.uri()));

    let mut request = deepgram_request("Missing voice");
    request.voice = None;
    request.render_for_caching = true;
    let err = h.synthesizer.get_or_synthesize(request).await.unwrap_err();
    assert!(matches!(err, SynthError::Validation(_)));

    let err = h
        .synthesizer
        .get_or_synthesize(SynthesisRequest::new("telepathy", "Hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, SynthError::Validation(ref msg) if msg.contains("telepathy")));

    assert!(h.stats.samples().is_empty());
}

#[tokio::test]
async fn test_tenant_purge_leaves_other_tenants() {
    let server = MockServer::start().await;
    mount_custom(&server, 3).await;
    let h = harness(SynthSettings::default(), None);

    for (tenant, text) in [
        ("acme", "First prompt"),
        ("acme", "Second prompt"),
        ("globex", "First prompt"),
    ] {
        h.synthesizer
            .get_or_synthesize(custom_request(&server, text).with_tenant(tenant))
            .await
            .unwrap();
    }
    assert_eq!(size(h.store.as_ref(), None).await.unwrap(), 3);

    let outcome = purge(h.store.as_ref(), &PurgeScope::Tenant("acme".to_string())).await;
    assert_eq!(outcome.purged_count, 2);
    assert!(outcome.error.is_none());
    assert_eq!(size(h.store.as_ref(), None).await.unwrap(), 1);
    assert_eq!(size(h.store.as_ref(), Some("tts:globex:*")).await.unwrap(), 1);
}

#[tokio::test]
async fn test_purge_one_of_missing_item_is_soft_error() {
    let server = MockServer::start().await;
    let h = harness(SynthSettings::default(), None);

    let outcome = purge(
        h.store.as_ref(),
        &PurgeScope::one(custom_request(&server, "Never rendered")),
    )
    .await;
    assert_eq!(outcome.purged_count, 0);
    assert_eq!(outcome.error.as_deref(), Some("Specified item not found"));
}

#[tokio::test]
async fn test_added_file_is_served_without_provider_call() {
    let server = MockServer::start().await;
    mount_custom(&server, 0).await;
    let h = harness(SynthSettings::default(), None);

    let source = tempfile::tempdir().unwrap();
    let file = source.path().join("greeting.r8");
    std::fs::write(&file, vec![7u8; 160]).unwrap();

    let key = h
        .synthesizer
        .add_file_to_cache(&file, custom_request(&server, "Prewarmed greeting"))
        .await
        .unwrap();

    let result = h
        .synthesizer
        .get_or_synthesize(custom_request(&server, "Prewarmed greeting"))
        .await
        .unwrap();
    assert!(result.served_from_cache);
    assert_eq!(result.cache_key, key);
    match result.output {
        SynthesisOutput::Audio {
            artifact_path,
            format,
        } => {
            assert_eq!(format.extension, "r8");
            assert_eq!(format.sample_rate, 8000);
            assert_eq!(std::fs::read(artifact_path).unwrap(), vec![7u8; 160]);
        }
        other => panic!("expected audio, got {other:?}"),
    }
}

#[tokio::test]
async fn test_legacy_base64_entry_is_served_as_mp3() {
    let server = MockServer::start().await;
    mount_custom(&server, 1).await;
    let h = harness(SynthSettings::default(), None);

    let first = h
        .synthesizer
        .get_or_synthesize(custom_request(&server, "Old entry"))
        .await
        .unwrap();
    let legacy = base64::engine::general_purpose::STANDARD.encode(b"legacy-mp3");
    h.store
        .set(&first.cache_key, Bytes::from(legacy), Duration::from_secs(60))
        .await
        .unwrap();

    let result = h
        .synthesizer
        .get_or_synthesize(custom_request(&server, "Old entry"))
        .await
        .unwrap();
    assert!(result.served_from_cache);
    let path = result.artifact_path().unwrap();
    assert_eq!(path.extension().unwrap(), "mp3");
    assert_eq!(std::fs::read(path).unwrap(), b"legacy-mp3");
}

#[tokio::test]
async fn test_salt_prefixes_artifact_name() {
    let server = MockServer::start().await;
    mount_custom(&server, 1).await;
    let h = harness(SynthSettings::default(), None);

    let result = h
        .synthesizer
        .get_or_synthesize(custom_request(&server, "Salted").with_salt("call42-"))
        .await
        .unwrap();
    let name = result
        .artifact_path()
        .unwrap()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(name.starts_with("tts-call42-"), "{name}");
    assert!(name.ends_with(".mp3"));
}

#[tokio::test]
async fn test_artifacts_stay_inside_artifact_dir() {
    let server = MockServer::start().await;
    mount_custom(&server, 1).await;
    let h = harness(SynthSettings::default(), None);

    let request = custom_request(&server, "Escape attempt")
        .with_tenant("../../tenant")
        .with_salt("../salt/");
    let result = h.synthesizer.get_or_synthesize(request).await.unwrap();

    let path = result.artifact_path().unwrap();
    assert_eq!(path.parent().unwrap(), h.artifacts.path());
    assert!(path.exists());
    assert_eq!(artifact_count(&h.artifacts), 1);
}

#[tokio::test]
async fn test_concurrent_identical_requests_all_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(AUDIO)
                .set_delay(Duration::from_millis(20)),
        )
        .mount(&server)
        .await;
    let h = harness(SynthSettings::default(), None);

    let results = futures::future::join_all(
        (0..4).map(|_| h.synthesizer.get_or_synthesize(custom_request(&server, "Rush"))),
    )
    .await;

    let keys: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().cache_key)
        .collect();
    assert!(keys.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(size(h.store.as_ref(), None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_voice_listing_unsupported_provider() {
    let h = harness(SynthSettings::default(), None);
    let err = h
        .synthesizer
        .list_voices(
            "deepgram",
            &ProviderCredentials::Deepgram(ApiKeyCredentials {
                api_key: "dg-key".to_string(),
            }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SynthError::Validation(_)));
}

/// A cache service that is down.
struct UnavailableStore;

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
    async fn ttl(&self, _key: &str) -> Result<Option<Duration>, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
    async fn del(&self, _keys: &[String]) -> Result<u64, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
    fn backend_type(&self) -> &str {
        "unavailable"
    }
}

#[tokio::test]
async fn test_cache_outage_degrades_to_provider_call() {
    let server = MockServer::start().await;
    mount_custom(&server, 2).await;
    let artifacts = tempfile::tempdir().unwrap();
    let synthesizer = SpeechSynthesizer::new(
        SynthSettings::default(),
        Arc::new(UnavailableStore),
        Arc::new(FsArtifactSink::new(artifacts.path())),
    );

    for _ in 0..2 {
        let result = synthesizer
            .get_or_synthesize(custom_request(&server, "Cache is down"))
            .await
            .unwrap();
        assert!(!result.served_from_cache);
        assert!(result.artifact_path().unwrap().exists());
    }

    let outcome = purge(&UnavailableStore, &PurgeScope::All).await;
    assert_eq!(outcome.purged_count, 0);
    assert!(outcome.error.is_some());
}
