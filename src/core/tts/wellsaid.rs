//! WellSaid Labs adapter. English only.

use async_trait::async_trait;
use serde_json::json;

use super::base::{
    BackendContext, SpeechProvider, SynthesisBackend, SynthesizedAudio, credentials_mismatch,
    require,
};
use super::markup::text_for_provider;
use super::provider::send_audio_request;
use crate::core::format::OutputFormat;
use crate::core::synth::{ApiKeyCredentials, ProviderCredentials, SynthesisRequest};
use crate::errors::SynthResult;

pub const WELLSAID_TTS_URL: &str = "https://api.wellsaidlabs.com/v1/tts/stream";
const WELLSAID_LANGUAGE: &str = "en-US";

pub struct WellSaidBackend {
    url: String,
}

impl WellSaidBackend {
    pub fn new() -> Self {
        Self::with_url(WELLSAID_TTS_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&ApiKeyCredentials> {
        match credentials {
            ProviderCredentials::WellSaid(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::WellSaid, other)),
        }
    }
}

impl Default for WellSaidBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for WellSaidBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::WellSaid
    }

    fn normalize(&self, request: &mut SynthesisRequest) {
        request.language = Some(WELLSAID_LANGUAGE.to_string());
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::WellSaid, request.voice.as_deref(), "voice")?;
        let creds = Self::credentials(&request.credentials)?;
        require(SpeechProvider::WellSaid, Some(creds.api_key.as_str()), "an api key")?;
        Ok(())
    }

    async fn synthesize(
        &self,
        ctx: &BackendContext,
        request: &SynthesisRequest,
        _format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio> {
        let creds = Self::credentials(&request.credentials)?;
        let text = text_for_provider(SpeechProvider::WellSaid, &request.text);

        let http_request = ctx
            .http
            .post(&self.url)
            .header("X-Api-Key", &creds.api_key)
            .header("Accept", "audio/mpeg")
            .json(&json!({
                "text": text,
                "speaker_id": request.voice,
            }));

        send_audio_request(SpeechProvider::WellSaid, http_request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::MemoryKeyValueStore;
    use crate::core::credentials::CredentialCache;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(text: &str) -> SynthesisRequest {
        SynthesisRequest::new("wellsaid", text)
            .with_voice("3")
            .with_credentials(ProviderCredentials::WellSaid(ApiKeyCredentials {
                api_key: "ws-key".to_string(),
            }))
    }

    #[test]
    fn test_normalize_forces_english() {
        let mut req = request("Hi").with_language("de-DE");
        WellSaidBackend::new().normalize(&mut req);
        assert_eq!(req.language.as_deref(), Some("en-US"));
    }

    #[tokio::test]
    async fn test_markup_is_stripped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "ws-key"))
            .and(body_json(json!({ "text": "Hello there", "speaker_id": "3" })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 4]))
            .expect(1)
            .mount(&server)
            .await;

        let backend = WellSaidBackend::with_url(server.uri());
        let ctx = BackendContext::new(
            reqwest::Client::new(),
            CredentialCache::new(Arc::new(MemoryKeyValueStore::default())),
        );
        let audio = backend
            .synthesize(
                &ctx,
                &request("<speak>Hello <break/>there</speak>"),
                &OutputFormat::mp3(22050),
            )
            .await
            .unwrap();
        assert_eq!(audio.audio.len(), 4);
    }
}
