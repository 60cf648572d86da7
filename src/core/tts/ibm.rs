//! IBM Watson Text to Speech adapter.

use async_trait::async_trait;
use serde_json::json;

use super::base::{
    BackendContext, SpeechProvider, SynthesisBackend, SynthesizedAudio, credentials_mismatch,
    require,
};
use super::provider::{send_audio_request, send_json_request};
use crate::core::format::OutputFormat;
use crate::core::providers::ibm::{IBM_IAM_TOKEN_URL, access_token, watson_tts_url};
use crate::core::synth::{IbmCredentials, ProviderCredentials, SynthesisRequest};
use crate::errors::SynthResult;

pub struct IbmBackend {
    service_url: Option<String>,
    token_url: String,
}

impl IbmBackend {
    pub fn new() -> Self {
        Self {
            service_url: None,
            token_url: IBM_IAM_TOKEN_URL.to_string(),
        }
    }

    pub fn with_endpoints(service_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            service_url: Some(service_url.into()),
            token_url: token_url.into(),
        }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&IbmCredentials> {
        match credentials {
            ProviderCredentials::Ibm(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::Ibm, other)),
        }
    }

    fn validate_credentials(creds: &IbmCredentials) -> SynthResult<()> {
        require(SpeechProvider::Ibm, Some(creds.api_key.as_str()), "an api key")?;
        require(SpeechProvider::Ibm, Some(creds.region.as_str()), "a region")?;
        Ok(())
    }

    fn service_url(&self, creds: &IbmCredentials) -> String {
        self.service_url
            .clone()
            .unwrap_or_else(|| watson_tts_url(&creds.region))
    }

    async fn bearer(&self, ctx: &BackendContext, creds: &IbmCredentials) -> SynthResult<String> {
        access_token(&ctx.http, &ctx.credentials, &self.token_url, &creds.api_key).await
    }
}

impl Default for IbmBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for IbmBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::Ibm
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::Ibm, request.voice.as_deref(), "voice")?;
        Self::validate_credentials(Self::credentials(&request.credentials)?)
    }

    async fn synthesize(
        &self,
        ctx: &BackendContext,
        request: &SynthesisRequest,
        _format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio> {
        let creds = Self::credentials(&request.credentials)?;
        let token = self.bearer(ctx, creds).await?;
        let voice = request.voice.as_deref().unwrap_or_default();

        let http_request = ctx
            .http
            .post(format!("{}/v1/synthesize", self.service_url(creds)))
            .query(&[("voice", voice)])
            .bearer_auth(token)
            .header("Accept", "audio/mp3")
            .json(&json!({ "text": request.text }));

        send_audio_request(SpeechProvider::Ibm, http_request).await
    }

    async fn list_voices(
        &self,
        ctx: &BackendContext,
        credentials: &ProviderCredentials,
    ) -> SynthResult<serde_json::Value> {
        let creds = Self::credentials(credentials)?;
        Self::validate_credentials(creds)?;
        let token = self.bearer(ctx, creds).await?;
        let request = ctx
            .http
            .get(format!("{}/v1/voices", self.service_url(creds)))
            .bearer_auth(token);
        send_json_request(SpeechProvider::Ibm, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::MemoryKeyValueStore;
    use crate::core::credentials::CredentialCache;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> SynthesisRequest {
        SynthesisRequest::new("ibm", "Hello")
            .with_voice("en-US_AllisonV3Voice")
            .with_credentials(ProviderCredentials::Ibm(IbmCredentials {
                api_key: "apikey".to_string(),
                region: "us-south".to_string(),
            }))
    }

    #[test]
    fn test_validate_requires_region() {
        let backend = IbmBackend::new();
        assert!(backend.validate(&request()).is_ok());

        let req = request().with_credentials(ProviderCredentials::Ibm(IbmCredentials {
            api_key: "apikey".to_string(),
            region: String::new(),
        }));
        assert!(backend.validate(&req).is_err());
    }

    #[tokio::test]
    async fn test_synthesize_fetches_token_then_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "iam-token",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/synthesize"))
            .and(query_param("voice", "en-US_AllisonV3Voice"))
            .and(header("authorization", "Bearer iam-token"))
            .and(body_json(serde_json::json!({ "text": "Hello" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mp3")
                    .set_body_bytes(vec![7u8; 16]),
            )
            .expect(2)
            .mount(&server)
            .await;

        let backend = IbmBackend::with_endpoints(
            server.uri(),
            format!("{}/identity/token", server.uri()),
        );
        let ctx = BackendContext::new(
            reqwest::Client::new(),
            CredentialCache::new(Arc::new(MemoryKeyValueStore::default())),
        );

        for _ in 0..2 {
            let audio = backend
                .synthesize(&ctx, &request(), &OutputFormat::mp3(22050))
                .await
                .unwrap();
            assert_eq!(audio.audio.len(), 16);
            assert!(audio.format_override.is_none());
        }
    }
}
