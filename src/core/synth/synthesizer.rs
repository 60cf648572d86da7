//! Cache-aside synthesis orchestrator.
//!
//! [`SpeechSynthesizer::get_or_synthesize`] fingerprints a request, serves it
//! from the cache when possible, hands streaming-capable providers off to the
//! real-time engine, and otherwise calls the provider backend, caches the
//! result and writes an audio artifact.
//!
//! Concurrent identical requests are not coalesced: both may miss, both call
//! the provider and both write the same entry. The last write wins.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::artifact::ArtifactSink;
use super::directive::{CACHE_KEY, StreamingDirective, WRITE_CACHE_FILE};
use super::request::{ProviderCredentials, SynthesisOutput, SynthesisRequest, SynthesisResult};
use super::stats::{CACHE_REQUESTS, NoopStats, RESPONSE_TIME, SYNTH_COUNT, StatsSink};
use crate::core::cache::KeyValueStore;
use crate::core::credentials::CredentialCache;
use crate::core::fingerprint::{artifact_file_name, make_synth_key};
use crate::core::format::{
    DEFAULT_MP3_RATE, FormatFlags, MP3_EXTENSION, OutputFormat, rate_for_extension,
    resolve_format,
};
use crate::core::tts::{
    BackendContext, BackendRegistry, BoxedBackend, SpeechProvider, SynthesisBackend,
    check_text_length,
};
use crate::errors::{SynthError, SynthResult};

/// Default lifetime of a cached synthesis result: four hours.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Process-wide switches, built once from configuration and injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthSettings {
    /// TTL applied on every write and restored on every hit.
    pub cache_ttl: Duration,
    /// Skip cache lookups for every request.
    pub disable_cache: bool,
    /// Never hand requests off to the streaming engine.
    pub disable_streaming: bool,
    /// The engine trims leading silence, which needs raw Microsoft audio.
    pub trim_silence: bool,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            disable_cache: false,
            disable_streaming: false,
            trim_silence: false,
        }
    }
}

/// Serialized cache value.
#[derive(Debug, Serialize, Deserialize)]
struct CachedAudio {
    /// Standard base64.
    audio_content: String,
    extension: String,
    sample_rate: u32,
}

fn encode_entry(audio: &[u8], format: &OutputFormat) -> SynthResult<Bytes> {
    let entry = CachedAudio {
        audio_content: base64::engine::general_purpose::STANDARD.encode(audio),
        extension: format.extension.clone(),
        sample_rate: format.sample_rate,
    };
    Ok(Bytes::from(serde_json::to_vec(&entry)?))
}

/// Decodes a cache value. Values that are not a JSON bundle are legacy
/// entries holding bare base64 MP3 audio.
fn decode_entry(raw: &[u8]) -> Option<(Bytes, OutputFormat)> {
    let engine = &base64::engine::general_purpose::STANDARD;

    if let Ok(entry) = serde_json::from_slice::<CachedAudio>(raw) {
        let audio = engine.decode(entry.audio_content).ok()?;
        return Some((
            Bytes::from(audio),
            OutputFormat {
                extension: entry.extension,
                sample_rate: entry.sample_rate,
            },
        ));
    }

    let text = std::str::from_utf8(raw).ok()?;
    let audio = engine.decode(text.trim()).ok()?;
    Some((Bytes::from(audio), OutputFormat::mp3(DEFAULT_MP3_RATE)))
}

fn vendor_tag(provider: SpeechProvider) -> String {
    format!("vendor:{provider}")
}

pub struct SpeechSynthesizer {
    settings: SynthSettings,
    store: Arc<dyn KeyValueStore>,
    registry: BackendRegistry,
    context: BackendContext,
    artifacts: Arc<dyn ArtifactSink>,
    stats: Arc<dyn StatsSink>,
}

impl SpeechSynthesizer {
    /// Creates a synthesizer with every built-in backend, a default HTTP
    /// client and silent stats.
    ///
    /// Provider credentials are cached in the same store as audio.
    pub fn new(
        settings: SynthSettings,
        store: Arc<dyn KeyValueStore>,
        artifacts: Arc<dyn ArtifactSink>,
    ) -> Self {
        let context = BackendContext::new(
            reqwest::Client::new(),
            CredentialCache::new(store.clone()),
        );
        Self {
            settings,
            store,
            registry: BackendRegistry::new(),
            context,
            artifacts,
            stats: Arc::new(NoopStats),
        }
    }

    pub fn with_registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.context.http = http;
        self
    }

    pub fn with_stats(mut self, stats: Arc<dyn StatsSink>) -> Self {
        self.stats = stats;
        self
    }

    pub fn settings(&self) -> &SynthSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn credential_cache(&self) -> &CredentialCache {
        &self.context.credentials
    }

    /// Returns audio for `request`, from the cache when possible.
    ///
    /// Validation happens before any I/O. Cache read failures degrade to a
    /// miss and cache write failures are logged; neither fails the call.
    pub async fn get_or_synthesize(
        &self,
        request: SynthesisRequest,
    ) -> SynthResult<SynthesisResult> {
        let (provider, backend, request) = self.prepare(request)?;
        backend.validate(&request)?;
        check_text_length(provider, &request.text)?;

        let key = make_synth_key(&request.fingerprint_fields());
        let lookup_disabled = request.disable_cache || self.settings.disable_cache;
        debug!(vendor = %provider, key = %key, lookup_disabled, "Synthesis key computed");

        if !lookup_disabled && let Some((audio, format)) = self.lookup(&key).await {
            self.stats.increment(CACHE_REQUESTS, &["found:yes".to_string()]);
            self.refresh_ttl(&key);
            let artifact_path = self
                .write_artifact(&key, request.salt.as_deref(), &format, &audio)
                .await?;
            return Ok(SynthesisResult {
                output: SynthesisOutput::Audio {
                    artifact_path,
                    format,
                },
                cache_key: key,
                served_from_cache: true,
                elapsed: None,
            });
        }
        self.stats.increment(CACHE_REQUESTS, &["found:no".to_string()]);

        let disable_streaming = request.disable_streaming || self.settings.disable_streaming;
        if provider.supports_streaming() && !request.render_for_caching && !disable_streaming {
            let directive = self.streaming_directive(
                backend.as_ref(),
                provider,
                &request,
                &key,
                lookup_disabled,
            );
            debug!(vendor = %provider, key = %key, "Handing synthesis off to the streaming engine");
            return Ok(SynthesisResult {
                output: SynthesisOutput::Streaming(directive),
                cache_key: key,
                served_from_cache: false,
                elapsed: None,
            });
        }

        let format = resolve_format(
            provider,
            FormatFlags {
                render_for_caching: request.render_for_caching,
                disable_streaming,
                trim_silence: self.settings.trim_silence,
            },
        );

        let started = Instant::now();
        let synthesized = match backend.synthesize(&self.context, &request, &format).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!(vendor = %provider, error = %e, "Speech synthesis failed");
                self.stats
                    .increment(SYNTH_COUNT, &[vendor_tag(provider), "accepted:no".to_string()]);
                return Err(e);
            }
        };
        let elapsed = started.elapsed();
        self.stats
            .increment(SYNTH_COUNT, &[vendor_tag(provider), "accepted:yes".to_string()]);
        self.stats.histogram(
            RESPONSE_TIME,
            elapsed.as_secs_f64() * 1000.0,
            &[vendor_tag(provider)],
        );
        info!(
            vendor = %provider,
            chars = request.text.chars().count(),
            rtt_ms = elapsed.as_millis() as u64,
            "Synthesized speech"
        );

        let format = synthesized.format_override.unwrap_or(format);
        self.persist(&key, &synthesized.audio, &format).await;
        let artifact_path = self
            .write_artifact(&key, request.salt.as_deref(), &format, &synthesized.audio)
            .await?;

        Ok(SynthesisResult {
            output: SynthesisOutput::Audio {
                artifact_path,
                format,
            },
            cache_key: key,
            served_from_cache: false,
            elapsed: Some(elapsed),
        })
    }

    /// Stores an existing audio file under the fingerprint of `request`.
    ///
    /// The format comes from the file extension (`mp3` when absent). Returns
    /// the cache key.
    pub async fn add_file_to_cache(
        &self,
        path: impl AsRef<Path>,
        request: SynthesisRequest,
    ) -> SynthResult<String> {
        let path = path.as_ref();
        let (_, _, request) = self.prepare(request)?;
        let key = make_synth_key(&request.fingerprint_fields());

        let audio = tokio::fs::read(path).await?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(MP3_EXTENSION)
            .to_ascii_lowercase();
        let format = OutputFormat {
            sample_rate: rate_for_extension(&extension),
            extension,
        };

        self.store
            .set(&key, encode_entry(&audio, &format)?, self.settings.cache_ttl)
            .await?;
        debug!(path = %path.display(), key = %key, "Added audio file to cache");
        Ok(key)
    }

    /// Lists the voices a provider offers for `credentials`.
    pub async fn list_voices(
        &self,
        provider: &str,
        credentials: &ProviderCredentials,
    ) -> SynthResult<serde_json::Value> {
        let (_, backend) = self.registry.resolve(provider)?;
        backend.list_voices(&self.context, credentials).await
    }

    /// Resolves the backend and applies its defaults, canonicalizing the
    /// provider name so aliases share cache entries.
    fn prepare(
        &self,
        mut request: SynthesisRequest,
    ) -> SynthResult<(SpeechProvider, BoxedBackend, SynthesisRequest)> {
        let (provider, backend) = self.registry.resolve(&request.provider)?;
        request.provider = provider.as_str().to_string();
        backend.normalize(&mut request);
        Ok((provider, backend, request))
    }

    async fn lookup(&self, key: &str) -> Option<(Bytes, OutputFormat)> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed; treating as miss");
                return None;
            }
        };
        let decoded = decode_entry(&raw);
        if decoded.is_none() {
            warn!(key = %key, "Undecodable cache entry; treating as miss");
        }
        decoded
    }

    fn refresh_ttl(&self, key: &str) {
        let store = self.store.clone();
        let key = key.to_string();
        let ttl = self.settings.cache_ttl;
        tokio::spawn(async move {
            if let Err(e) = store.expire(&key, ttl).await {
                info!(key = %key, error = %e, "Error extending cache entry TTL");
            }
        });
    }

    async fn persist(&self, key: &str, audio: &[u8], format: &OutputFormat) {
        let entry = match encode_entry(audio, format) {
            Ok(entry) => entry,
            Err(e) => {
                error!(key = %key, error = %e, "Failed to encode cache entry");
                return;
            }
        };
        if let Err(e) = self.store.set(key, entry, self.settings.cache_ttl).await {
            error!(key = %key, error = %e, "Cache write failed");
        }
    }

    async fn write_artifact(
        &self,
        key: &str,
        salt: Option<&str>,
        format: &OutputFormat,
        audio: &[u8],
    ) -> SynthResult<std::path::PathBuf> {
        let file_name = artifact_file_name(key, salt, &format.extension);
        self.artifacts
            .write(&file_name, audio)
            .await
            .map_err(SynthError::from)
    }

    fn streaming_directive(
        &self,
        backend: &dyn SynthesisBackend,
        provider: SpeechProvider,
        request: &SynthesisRequest,
        key: &str,
        caching_disabled: bool,
    ) -> StreamingDirective {
        let mut directive = StreamingDirective::new(request.text.as_str());
        directive
            .push("vendor", provider.as_str())
            .push_opt("voice", request.voice_or_deployment())
            .push_opt("language", request.language.as_deref())
            .push_opt("model", request.model.as_deref())
            .push_opt("engine", request.engine.as_deref())
            .push_opt("instructions", request.instructions.as_deref());
        backend.streaming_params(request, &mut directive);

        if caching_disabled {
            directive.push(WRITE_CACHE_FILE, "0");
        } else {
            directive.push(WRITE_CACHE_FILE, "1").push(CACHE_KEY, key);
        }
        directive
    }
}
