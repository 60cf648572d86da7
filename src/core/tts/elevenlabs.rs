//! ElevenLabs text-to-speech REST adapter.

use async_trait::async_trait;
use serde_json::json;

use super::base::{
    BackendContext, SpeechProvider, SynthesisBackend, SynthesizedAudio, credentials_mismatch,
    require,
};
use super::markup::text_for_provider;
use super::provider::send_audio_request;
use crate::core::format::OutputFormat;
use crate::core::synth::{
    ApiKeyCredentials, ProviderCredentials, StreamingDirective, SynthesisRequest,
};
use crate::errors::SynthResult;

pub const ELEVENLABS_TTS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_turbo_v2_5";

pub struct ElevenLabsBackend {
    base_url: String,
}

impl ElevenLabsBackend {
    pub fn new() -> Self {
        Self::with_base_url(ELEVENLABS_TTS_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&ApiKeyCredentials> {
        match credentials {
            ProviderCredentials::ElevenLabs(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::ElevenLabs, other)),
        }
    }

    /// ElevenLabs names formats as `<codec>_<rate>[_<bitrate>]`.
    fn output_format(format: &OutputFormat) -> String {
        if format.is_raw() {
            format!("pcm_{}", format.sample_rate)
        } else {
            format!("mp3_{}_128", format.sample_rate)
        }
    }

    fn model(request: &SynthesisRequest) -> &str {
        request
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_ELEVENLABS_MODEL)
    }
}

impl Default for ElevenLabsBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for ElevenLabsBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::ElevenLabs
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::ElevenLabs, request.voice.as_deref(), "voice")?;
        let creds = Self::credentials(&request.credentials)?;
        require(SpeechProvider::ElevenLabs, Some(creds.api_key.as_str()), "an api key")?;
        Ok(())
    }

    async fn synthesize(
        &self,
        ctx: &BackendContext,
        request: &SynthesisRequest,
        format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio> {
        let creds = Self::credentials(&request.credentials)?;
        let voice = request.voice.as_deref().unwrap_or_default();
        let accept = if format.is_raw() { "audio/pcm" } else { "audio/mpeg" };

        let http_request = ctx
            .http
            .post(format!("{}/{}", self.base_url, urlencoding::encode(voice)))
            .query(&[("output_format", Self::output_format(format))])
            .header("xi-api-key", &creds.api_key)
            .header("Accept", accept)
            .json(&json!({
                "text": text_for_provider(SpeechProvider::ElevenLabs, &request.text),
                "model_id": Self::model(request),
            }));

        send_audio_request(SpeechProvider::ElevenLabs, http_request).await
    }

    fn streaming_params(&self, request: &SynthesisRequest, directive: &mut StreamingDirective) {
        if let ProviderCredentials::ElevenLabs(creds) = &request.credentials {
            directive
                .push("api_key", creds.api_key.as_str())
                .push("model_id", Self::model(request));
        }
    }
}
