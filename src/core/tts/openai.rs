//! OpenAI speech adapter (`/v1/audio/speech`).

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

pub const OPENAI_API_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini-tts";

pub struct OpenAiBackend {
    base_url: String,
}

impl OpenAiBackend {
    pub fn new() -> Self {
        Self::with_base_url(OPENAI_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&ApiKeyCredentials> {
        match credentials {
            ProviderCredentials::OpenAi(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::OpenAi, other)),
        }
    }

    fn model(request: &SynthesisRequest) -> &str {
        request
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_OPENAI_MODEL)
    }

    fn build_request_body(request: &SynthesisRequest, format: &OutputFormat) -> serde_json::Value {
        let mut body = json!({
            "model": Self::model(request),
            "input": text_for_provider(SpeechProvider::OpenAi, &request.text),
            "voice": request.voice,
            "response_format": if format.is_raw() { "pcm" } else { "mp3" },
        });
        if let Some(instructions) = request.instructions.as_deref().filter(|i| !i.is_empty()) {
            body["instructions"] = json!(instructions);
        }
        body
    }
}

impl Default for OpenAiBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for OpenAiBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::OpenAi
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::OpenAi, request.voice.as_deref(), "voice")?;
        let creds = Self::credentials(&request.credentials)?;
        require(SpeechProvider::OpenAi, Some(creds.api_key.as_str()), "an api key")?;
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
            .post(format!("{}/v1/audio/speech", self.base_url))
            .bearer_auth(&creds.api_key)
            .json(&Self::build_request_body(request, format));

        send_audio_request(SpeechProvider::OpenAi, http_request).await
    }

    fn streaming_params(&self, request: &SynthesisRequest, directive: &mut StreamingDirective) {
        if let ProviderCredentials::OpenAi(creds) = &request.credentials {
            directive
                .push("api_key", creds.api_key.as_str())
                .push("model", Self::model(request));
        }
    }
}
