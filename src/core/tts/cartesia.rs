//! Cartesia Sonic adapter (`/tts/bytes`).

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

pub const CARTESIA_TTS_URL: &str = "https://api.cartesia.ai/tts/bytes";
pub const CARTESIA_API_VERSION: &str = "2025-04-16";
pub const DEFAULT_CARTESIA_MODEL: &str = "sonic-3";

pub struct CartesiaBackend {
    url: String,
}

impl CartesiaBackend {
    pub fn new() -> Self {
        Self::with_url(CARTESIA_TTS_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&ApiKeyCredentials> {
        match credentials {
            ProviderCredentials::Cartesia(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::Cartesia, other)),
        }
    }

    fn model(request: &SynthesisRequest) -> &str {
        request
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_CARTESIA_MODEL)
    }

    fn output_format(format: &OutputFormat) -> serde_json::Value {
        if format.is_raw() {
            json!({
                "container": "raw",
                "encoding": "pcm_s16le",
                "sample_rate": format.sample_rate,
            })
        } else {
            json!({
                "container": "mp3",
                "bit_rate": 128000,
                "sample_rate": format.sample_rate,
            })
        }
    }

    fn build_request_body(request: &SynthesisRequest, format: &OutputFormat) -> serde_json::Value {
        let mut body = json!({
            "model_id": Self::model(request),
            "transcript": text_for_provider(SpeechProvider::Cartesia, &request.text),
            "voice": { "mode": "id", "id": request.voice },
            "output_format": Self::output_format(format),
        });
        if let Some(language) = request.language.as_deref().filter(|l| !l.is_empty()) {
            // Cartesia takes ISO 639-1 codes.
            let code = language.split(['-', '_']).next().unwrap_or(language);
            body["language"] = json!(code.to_ascii_lowercase());
        }
        body
    }
}

impl Default for CartesiaBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for CartesiaBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::Cartesia
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::Cartesia, request.voice.as_deref(), "voice")?;
        let creds = Self::credentials(&request.credentials)?;
        require(SpeechProvider::Cartesia, Some(creds.api_key.as_str()), "an api key")?;
        Ok(())
    }

    async fn synthesize(
        &self,
        ctx: &BackendContext,
        request: &SynthesisRequest,
        format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio> {
        let creds = Self::credentials(&request.credentials)?;
        let http_request = ctx
            .http
            .post(&self.url)
            .header("X-API-Key", &creds.api_key)
            .header("Cartesia-Version", CARTESIA_API_VERSION)
            .json(&Self::build_request_body(request, format));

        send_audio_request(SpeechProvider::Cartesia, http_request).await
    }

    fn streaming_params(&self, request: &SynthesisRequest, directive: &mut StreamingDirective) {
        if let ProviderCredentials::Cartesia(creds) = &request.credentials {
            directive
                .push("api_key", creds.api_key.as_str())
                .push("model_id", Self::model(request));
        }
    }
}
