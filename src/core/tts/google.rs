//! Google Cloud Text-to-Speech REST adapter.
//!
//! Authenticates with either a plain API key (`?key=`) or a service account,
//! whose access token is obtained through the credential cache. Responses
//! carry base64 audio in `audioContent`.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::base::{
    BackendContext, SpeechProvider, SynthesisBackend, SynthesizedAudio, credentials_mismatch,
    require,
};
use super::markup::is_markup;
use super::provider::send_json_request;
use crate::core::format::OutputFormat;
use crate::core::providers::google::{GOOGLE_TTS_ENDPOINT, ServiceAccountKey, access_token};
use crate::core::synth::{GoogleCredentials, ProviderCredentials, SynthesisRequest};
use crate::errors::{SynthError, SynthResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

enum GoogleAuth {
    ApiKey(String),
    Bearer(String),
}

impl GoogleAuth {
    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::ApiKey(key) => request.query(&[("key", key)]),
            Self::Bearer(token) => request.bearer_auth(token),
        }
    }
}

pub struct GoogleBackend {
    base_url: String,
}

impl GoogleBackend {
    pub fn new() -> Self {
        Self::with_base_url(GOOGLE_TTS_ENDPOINT)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&GoogleCredentials> {
        match credentials {
            ProviderCredentials::Google(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::Google, other)),
        }
    }

    async fn authorize(
        &self,
        ctx: &BackendContext,
        creds: &GoogleCredentials,
    ) -> SynthResult<GoogleAuth> {
        if let Some(source) = creds.service_account.as_deref().filter(|s| !s.is_empty()) {
            let key = ServiceAccountKey::load(source)?;
            let token = access_token(&ctx.http, &ctx.credentials, &key).await?;
            return Ok(GoogleAuth::Bearer(token));
        }
        let key = require(
            SpeechProvider::Google,
            creds.api_key.as_deref(),
            "an api key or service account",
        )?;
        Ok(GoogleAuth::ApiKey(key.to_string()))
    }

    fn build_request_body(request: &SynthesisRequest, format: &OutputFormat) -> serde_json::Value {
        let input = if is_markup(&request.text) {
            json!({ "ssml": request.text })
        } else {
            json!({ "text": request.text })
        };

        let mut voice = serde_json::Map::new();
        voice.insert("languageCode".to_string(), json!(request.language));
        if let Some(name) = request.voice.as_deref().filter(|v| !v.is_empty()) {
            voice.insert("name".to_string(), json!(name));
        }
        if let Some(gender) = request.gender.as_deref().filter(|g| !g.is_empty()) {
            voice.insert("ssmlGender".to_string(), json!(gender.to_ascii_uppercase()));
        }

        json!({
            "input": input,
            "voice": voice,
            "audioConfig": {
                "audioEncoding": "MP3",
                "sampleRateHertz": format.sample_rate,
            }
        })
    }
}

impl Default for GoogleBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for GoogleBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::Google
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::Google, request.language.as_deref(), "language")?;
        let creds = Self::credentials(&request.credentials)?;
        if creds.service_account.as_deref().is_none_or(str::is_empty) {
            require(
                SpeechProvider::Google,
                creds.api_key.as_deref(),
                "an api key or service account",
            )?;
        }
        Ok(())
    }

    async fn synthesize(
        &self,
        ctx: &BackendContext,
        request: &SynthesisRequest,
        format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio> {
        let auth = self.authorize(ctx, Self::credentials(&request.credentials)?).await?;
        let http_request = auth.apply(
            ctx.http
                .post(format!("{}/v1/text:synthesize", self.base_url))
                .json(&Self::build_request_body(request, format)),
        );

        let response: SynthesizeResponse =
            send_json_request(SpeechProvider::Google, http_request).await?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(response.audio_content)
            .map_err(|e| SynthError::provider("google", format!("invalid audioContent: {e}")))?;
        Ok(SynthesizedAudio::new(audio))
    }

    async fn list_voices(
        &self,
        ctx: &BackendContext,
        credentials: &ProviderCredentials,
    ) -> SynthResult<serde_json::Value> {
        let auth = self.authorize(ctx, Self::credentials(credentials)?).await?;
        let request = auth.apply(ctx.http.get(format!("{}/v1/voices", self.base_url)));
        send_json_request(SpeechProvider::Google, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SynthesisRequest {
        SynthesisRequest::new("google", "Hello")
            .with_language("en-US")
            .with_voice("en-US-Wavenet-D")
            .with_credentials(ProviderCredentials::Google(GoogleCredentials {
                api_key: Some("key".to_string()),
                service_account: None,
            }))
    }

    #[test]
    fn test_validate_requires_language_and_credentials() {
        let backend = GoogleBackend::new();
        assert!(backend.validate(&request()).is_ok());

        let mut missing_language = request();
        missing_language.language = None;
        assert!(backend.validate(&missing_language).is_err());

        let wrong_creds = request().with_credentials(ProviderCredentials::None);
        assert!(backend.validate(&wrong_creds).is_err());
    }

    #[test]
    fn test_request_body_plain_and_ssml() {
        let mut req = request();
        req.gender = Some("female".to_string());
        let body = GoogleBackend::build_request_body(&req, &OutputFormat::mp3(24000));
        assert_eq!(body["input"]["text"], "Hello");
        assert_eq!(body["voice"]["name"], "en-US-Wavenet-D");
        assert_eq!(body["voice"]["ssmlGender"], "FEMALE");
        assert_eq!(body["audioConfig"]["audioEncoding"], "MP3");
        assert_eq!(body["audioConfig"]["sampleRateHertz"], 24000);

        req.text = "<speak>Hi</speak>".to_string();
        let body = GoogleBackend::build_request_body(&req, &OutputFormat::mp3(24000));
        assert_eq!(body["input"]["ssml"], "<speak>Hi</speak>");
    }

    #[tokio::test]
    async fn test_synthesize_with_api_key() {
        use crate::core::cache::MemoryKeyValueStore;
        use crate::core::credentials::CredentialCache;
        use std::sync::Arc;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text:synthesize"))
            .and(query_param("key", "key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "audioContent": base64::engine::general_purpose::STANDARD.encode(b"mp3-bytes"),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = BackendContext::new(
            reqwest::Client::new(),
            CredentialCache::new(Arc::new(MemoryKeyValueStore::default())),
        );
        let audio = GoogleBackend::with_base_url(server.uri())
            .synthesize(&ctx, &request(), &OutputFormat::mp3(24000))
            .await
            .unwrap();
        assert_eq!(audio.audio.as_ref(), b"mp3-bytes");
        assert!(audio.format_override.is_none());
    }
}
