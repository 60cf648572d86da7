//! Customer-hosted synthesis endpoint.
//!
//! The endpoint receives `{language, voice, type, text}` and answers with audio.
//! A `Content-Type` of `audio/wav` or `audio/l16;rate=N` overrides the default
//! MP3 format.

use async_trait::async_trait;
use serde_json::json;

use super::base::{
    BackendContext, SpeechProvider, SynthesisBackend, SynthesizedAudio, credentials_mismatch,
    require,
};
use super::markup::is_markup;
use super::provider::send_audio_request_with_content_type;
use crate::core::format::OutputFormat;
use crate::core::synth::{CustomCredentials, ProviderCredentials, SynthesisRequest};
use crate::errors::SynthResult;

#[derive(Default)]
pub struct CustomBackend;

impl CustomBackend {
    pub fn new() -> Self {
        Self
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&CustomCredentials> {
        match credentials {
            ProviderCredentials::Custom(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::Custom, other)),
        }
    }
}

#[async_trait]
impl SynthesisBackend for CustomBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::Custom
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        let creds = Self::credentials(&request.credentials)?;
        require(SpeechProvider::Custom, Some(creds.url.as_str()), "a url")?;
        Ok(())
    }

    async fn synthesize(
        &self,
        ctx: &BackendContext,
        request: &SynthesisRequest,
        _format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio> {
        let creds = Self::credentials(&request.credentials)?;
        let mut http_request = ctx.http.post(&creds.url).json(&json!({
            "language": request.language,
            "voice": request.voice,
            "type": if is_markup(&request.text) { "ssml" } else { "text" },
            "text": request.text,
        }));
        if let Some(token) = creds.auth_token.as_deref().filter(|t| !t.is_empty()) {
            http_request = http_request.bearer_auth(token);
        }

        send_audio_request_with_content_type(SpeechProvider::Custom, http_request).await
    }
}
