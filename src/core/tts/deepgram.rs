//! Deepgram Aura adapter. The voice name doubles as the Deepgram model.

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

pub const DEEPGRAM_TTS_URL: &str = "https://api.deepgram.com/v1/speak";

pub struct DeepgramBackend {
    url: String,
}

impl DeepgramBackend {
    pub fn new() -> Self {
        Self::with_url(DEEPGRAM_TTS_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&ApiKeyCredentials> {
        match credentials {
            ProviderCredentials::Deepgram(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::Deepgram, other)),
        }
    }

    fn query(request: &SynthesisRequest, format: &OutputFormat) -> Vec<(&'static str, String)> {
        let mut query = vec![("model", request.voice.clone().unwrap_or_default())];
        if format.is_raw() {
            query.push(("encoding", "linear16".to_string()));
            query.push(("container", "none".to_string()));
            query.push(("sample_rate", format.sample_rate.to_string()));
        } else {
            query.push(("encoding", "mp3".to_string()));
        }
        query
    }
}

impl Default for DeepgramBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for DeepgramBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::Deepgram
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::Deepgram, request.voice.as_deref(), "voice")?;
        let creds = Self::credentials(&request.credentials)?;
        require(SpeechProvider::Deepgram, Some(creds.api_key.as_str()), "an api key")?;
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
            .query(&Self::query(request, format))
            .header("Authorization", format!("Token {}", creds.api_key))
            .json(&json!({
                "text": text_for_provider(SpeechProvider::Deepgram, &request.text),
            }));

        send_audio_request(SpeechProvider::Deepgram, http_request).await
    }

    fn streaming_params(&self, request: &SynthesisRequest, directive: &mut StreamingDirective) {
        if let ProviderCredentials::Deepgram(creds) = &request.credentials {
            directive.push("api_key", creds.api_key.as_str());
        }
    }
}
