//! Rime Labs adapter.

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

pub const RIMELABS_TTS_URL: &str = "https://users.rime.ai/v1/rime-tts";
pub const DEFAULT_RIMELABS_MODEL: &str = "mistv2";

pub struct RimeLabsBackend {
    url: String,
}

impl RimeLabsBackend {
    pub fn new() -> Self {
        Self::with_url(RIMELABS_TTS_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&ApiKeyCredentials> {
        match credentials {
            ProviderCredentials::RimeLabs(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::RimeLabs, other)),
        }
    }

    fn model(request: &SynthesisRequest) -> &str {
        request
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_RIMELABS_MODEL)
    }
}

impl Default for RimeLabsBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for RimeLabsBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::RimeLabs
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::RimeLabs, request.voice.as_deref(), "voice")?;
        let creds = Self::credentials(&request.credentials)?;
        require(SpeechProvider::RimeLabs, Some(creds.api_key.as_str()), "an api key")?;
        Ok(())
    }

    async fn synthesize(
        &self,
        ctx: &BackendContext,
        request: &SynthesisRequest,
        format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio> {
        let creds = Self::credentials(&request.credentials)?;
        let accept = if format.is_raw() { "audio/pcm" } else { "audio/mp3" };

        let http_request = ctx
            .http
            .post(&self.url)
            .bearer_auth(&creds.api_key)
            .header("Accept", accept)
            .json(&json!({
                "text": text_for_provider(SpeechProvider::RimeLabs, &request.text),
                "speaker": request.voice,
                "modelId": Self::model(request),
                "samplingRate": format.sample_rate,
            }));

        send_audio_request(SpeechProvider::RimeLabs, http_request).await
    }

    fn streaming_params(&self, request: &SynthesisRequest, directive: &mut StreamingDirective) {
        if let ProviderCredentials::RimeLabs(creds) = &request.credentials {
            directive
                .push("api_key", creds.api_key.as_str())
                .push("model_id", Self::model(request));
        }
    }
}
