//! PlayHT streaming REST adapter.

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
    PlayHtCredentials, ProviderCredentials, StreamingDirective, SynthesisRequest,
};
use crate::errors::SynthResult;

pub const PLAYHT_TTS_URL: &str = "https://api.play.ht/api/v2/tts/stream";

pub struct PlayHtBackend {
    url: String,
}

impl PlayHtBackend {
    pub fn new() -> Self {
        Self::with_url(PLAYHT_TTS_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&PlayHtCredentials> {
        match credentials {
            ProviderCredentials::PlayHt(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::PlayHt, other)),
        }
    }

    fn build_request_body(request: &SynthesisRequest, format: &OutputFormat) -> serde_json::Value {
        let mut body = json!({
            "text": text_for_provider(SpeechProvider::PlayHt, &request.text),
            "voice": request.voice,
            "output_format": if format.is_raw() { "raw" } else { "mp3" },
            "sample_rate": format.sample_rate,
        });
        if let Some(engine) = request.engine.as_deref().filter(|e| !e.is_empty()) {
            body["voice_engine"] = json!(engine);
        }
        if let Some(language) = request.language.as_deref().filter(|l| !l.is_empty()) {
            body["language"] = json!(language);
        }
        body
    }
}

impl Default for PlayHtBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for PlayHtBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::PlayHt
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::PlayHt, request.voice.as_deref(), "voice")?;
        let creds = Self::credentials(&request.credentials)?;
        require(SpeechProvider::PlayHt, Some(creds.api_key.as_str()), "an api key")?;
        require(SpeechProvider::PlayHt, Some(creds.user_id.as_str()), "a user id")?;
        Ok(())
    }

    async fn synthesize(
        &self,
        ctx: &BackendContext,
        request: &SynthesisRequest,
        format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio> {
        let creds = Self::credentials(&request.credentials)?;
        let accept = if format.is_raw() { "audio/raw" } else { "audio/mpeg" };

        let http_request = ctx
            .http
            .post(&self.url)
            .header("AUTHORIZATION", &creds.api_key)
            .header("X-USER-ID", &creds.user_id)
            .header("Accept", accept)
            .json(&Self::build_request_body(request, format));

        send_audio_request(SpeechProvider::PlayHt, http_request).await
    }

    fn streaming_params(&self, request: &SynthesisRequest, directive: &mut StreamingDirective) {
        if let ProviderCredentials::PlayHt(creds) = &request.credentials {
            directive
                .push("api_key", creds.api_key.as_str())
                .push("user_id", creds.user_id.as_str())
                .push_opt("voice_engine", request.engine.as_deref());
        }
    }
}
