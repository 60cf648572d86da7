//! # Synthesis backend abstraction
//!
//! Every speech provider is one [`SynthesisBackend`] implementation. A backend
//! validates its own preconditions before any I/O, performs a single synthesis
//! round trip (fetching session credentials through the shared
//! [`CredentialCache`] when the provider needs them) and maps provider error
//! shapes onto [`SynthError`].
//!
//! ```rust,ignore
//! use voxcache::core::tts::{BackendRegistry, SpeechProvider};
//!
//! let registry = BackendRegistry::new();
//! let (provider, backend) = registry.resolve("polly")?;
//! assert_eq!(provider, SpeechProvider::Aws);
//! backend.validate(&request)?;
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::core::credentials::CredentialCache;
use crate::core::format::OutputFormat;
use crate::core::synth::{ProviderCredentials, StreamingDirective, SynthesisRequest};
use crate::errors::{SynthError, SynthResult};

/// Supported speech providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeechProvider {
    Google,
    Aws,
    Microsoft,
    Ibm,
    Nuance,
    Nvidia,
    WellSaid,
    ElevenLabs,
    Deepgram,
    PlayHt,
    RimeLabs,
    Cartesia,
    OpenAi,
    Verbio,
    Custom,
}

impl SpeechProvider {
    pub const ALL: [SpeechProvider; 15] = [
        Self::Google,
        Self::Aws,
        Self::Microsoft,
        Self::Ibm,
        Self::Nuance,
        Self::Nvidia,
        Self::WellSaid,
        Self::ElevenLabs,
        Self::Deepgram,
        Self::PlayHt,
        Self::RimeLabs,
        Self::Cartesia,
        Self::OpenAi,
        Self::Verbio,
        Self::Custom,
    ];

    /// Canonical discriminator, also used as the stats `vendor` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Aws => "aws",
            Self::Microsoft => "microsoft",
            Self::Ibm => "ibm",
            Self::Nuance => "nuance",
            Self::Nvidia => "nvidia",
            Self::WellSaid => "wellsaid",
            Self::ElevenLabs => "elevenlabs",
            Self::Deepgram => "deepgram",
            Self::PlayHt => "playht",
            Self::RimeLabs => "rimelabs",
            Self::Cartesia => "cartesia",
            Self::OpenAi => "openai",
            Self::Verbio => "verbio",
            Self::Custom => "custom",
        }
    }

    /// Providers the real-time engine can drive directly.
    pub fn supports_streaming(&self) -> bool {
        matches!(
            self,
            Self::Microsoft
                | Self::Deepgram
                | Self::ElevenLabs
                | Self::RimeLabs
                | Self::PlayHt
                | Self::Cartesia
                | Self::OpenAi
        )
    }

    /// Providers that accept `<speak>` markup.
    pub fn supports_markup(&self) -> bool {
        matches!(
            self,
            Self::Google
                | Self::Aws
                | Self::Microsoft
                | Self::Ibm
                | Self::Nuance
                | Self::Nvidia
                | Self::Custom
        )
    }

    /// Hard ceiling on input length in characters, where the provider has one.
    pub fn max_text_chars(&self) -> Option<usize> {
        match self {
            Self::OpenAi => Some(4096),
            Self::Verbio => Some(2000),
            _ => None,
        }
    }
}

impl fmt::Display for SpeechProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeechProvider {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let canonical = match lowered.as_str() {
            "polly" => "aws",
            "azure" => "microsoft",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == canonical)
            .ok_or_else(|| SynthError::unsupported_provider(s))
    }
}

/// Audio returned by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub audio: Bytes,
    /// Format reported by the provider when it differs from the static policy.
    pub format_override: Option<OutputFormat>,
}

impl SynthesizedAudio {
    pub fn new(audio: impl Into<Bytes>) -> Self {
        Self {
            audio: audio.into(),
            format_override: None,
        }
    }
}

/// Shared collaborators handed to every backend call.
#[derive(Clone)]
pub struct BackendContext {
    pub http: reqwest::Client,
    pub credentials: CredentialCache,
}

impl BackendContext {
    pub fn new(http: reqwest::Client, credentials: CredentialCache) -> Self {
        Self { http, credentials }
    }
}

/// One provider's synthesis capability.
///
/// Implementations hold configuration only; nothing mutable is shared across
/// calls.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    fn provider(&self) -> SpeechProvider;

    /// Fills provider defaults before the request is fingerprinted.
    fn normalize(&self, _request: &mut SynthesisRequest) {}

    /// Checks required parameters and credentials. Performs no I/O.
    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()>;

    /// Performs one synthesis round trip.
    async fn synthesize(
        &self,
        ctx: &BackendContext,
        request: &SynthesisRequest,
        format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio>;

    /// Adds the provider-specific parameters the real-time engine needs.
    fn streaming_params(&self, _request: &SynthesisRequest, _directive: &mut StreamingDirective) {}

    /// Lists the voices available to `credentials`.
    async fn list_voices(
        &self,
        _ctx: &BackendContext,
        _credentials: &ProviderCredentials,
    ) -> SynthResult<serde_json::Value> {
        Err(SynthError::Validation(format!(
            "Voice listing is not supported for {}",
            self.provider()
        )))
    }
}

pub type BoxedBackend = Arc<dyn SynthesisBackend>;

/// Returns `value` when present and non-empty, else a validation error.
pub(crate) fn require<'a>(
    provider: SpeechProvider,
    value: Option<&'a str>,
    field: &str,
) -> SynthResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| SynthError::Validation(format!("{provider} requires {field}")))
}

/// Error for a credential set that belongs to another provider.
pub(crate) fn credentials_mismatch(
    provider: SpeechProvider,
    credentials: &ProviderCredentials,
) -> SynthError {
    SynthError::Validation(format!(
        "{provider} requires {provider} credentials, got {}",
        credentials.vendor()
    ))
}

/// Enforces the provider's input length ceiling.
pub(crate) fn check_text_length(provider: SpeechProvider, text: &str) -> SynthResult<()> {
    if let Some(max) = provider.max_text_chars()
        && text.chars().count() > max
    {
        return Err(SynthError::Validation(format!(
            "{provider} accepts at most {max} characters of text"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_aliases_and_case() {
        assert_eq!("polly".parse::<SpeechProvider>().unwrap(), SpeechProvider::Aws);
        assert_eq!(
            "Azure".parse::<SpeechProvider>().unwrap(),
            SpeechProvider::Microsoft
        );
        assert_eq!(
            " ElevenLabs ".parse::<SpeechProvider>().unwrap(),
            SpeechProvider::ElevenLabs
        );
        let err = "acme".parse::<SpeechProvider>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_round_trip_discriminators() {
        for provider in SpeechProvider::ALL {
            assert_eq!(provider.as_str().parse::<SpeechProvider>().unwrap(), provider);
        }
    }

    #[test]
    fn test_capabilities() {
        assert!(SpeechProvider::Deepgram.supports_streaming());
        assert!(!SpeechProvider::Google.supports_streaming());
        assert!(SpeechProvider::Nuance.supports_markup());
        assert!(!SpeechProvider::WellSaid.supports_markup());
    }

    #[test]
    fn test_text_length_ceiling() {
        let long = "a".repeat(4097);
        assert!(check_text_length(SpeechProvider::OpenAi, &long).is_err());
        assert!(check_text_length(SpeechProvider::OpenAi, &long[..4096]).is_ok());
        assert!(check_text_length(SpeechProvider::Verbio, &long[..2001]).is_err());
        assert!(check_text_length(SpeechProvider::Google, &long).is_ok());
    }

    #[test]
    fn test_require_rejects_blank() {
        assert!(require(SpeechProvider::Aws, Some("  "), "voice").is_err());
        assert!(require(SpeechProvider::Aws, None, "voice").is_err());
        assert_eq!(
            require(SpeechProvider::Aws, Some("Joanna"), "voice").unwrap(),
            "Joanna"
        );
    }
}
