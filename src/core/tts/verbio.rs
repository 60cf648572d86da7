//! Verbio Speech Center adapter.

use async_trait::async_trait;
use serde_json::json;

use super::base::{
    BackendContext, SpeechProvider, SynthesisBackend, SynthesizedAudio, credentials_mismatch,
    require,
};
use super::markup::text_for_provider;
use super::provider::{send_audio_request, send_json_request};
use crate::core::format::OutputFormat;
use crate::core::providers::verbio::{VERBIO_API_URL, VERBIO_TOKEN_URL, access_token};
use crate::core::synth::{ProviderCredentials, SynthesisRequest, VerbioCredentials};
use crate::errors::SynthResult;

pub struct VerbioBackend {
    api_url: String,
    token_url: String,
}

impl VerbioBackend {
    pub fn new() -> Self {
        Self::with_endpoints(VERBIO_API_URL, VERBIO_TOKEN_URL)
    }

    pub fn with_endpoints(api_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token_url: token_url.into(),
        }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&VerbioCredentials> {
        match credentials {
            ProviderCredentials::Verbio(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::Verbio, other)),
        }
    }

    fn validate_credentials(creds: &VerbioCredentials) -> SynthResult<()> {
        require(SpeechProvider::Verbio, Some(creds.client_id.as_str()), "a client id")?;
        require(SpeechProvider::Verbio, Some(creds.client_secret.as_str()), "a client secret")?;
        Ok(())
    }

    async fn bearer(&self, ctx: &BackendContext, creds: &VerbioCredentials) -> SynthResult<String> {
        access_token(
            &ctx.http,
            &ctx.credentials,
            &self.token_url,
            &creds.client_id,
            &creds.client_secret,
        )
        .await
    }
}

impl Default for VerbioBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for VerbioBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::Verbio
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::Verbio, request.voice.as_deref(), "voice")?;
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

        let http_request = ctx
            .http
            .post(format!("{}/synthesize", self.api_url))
            .bearer_auth(token)
            .header("User-Agent", "voxcache")
            .json(&json!({
                "voice_id": request.voice,
                "output_sample_rate": "8k",
                "output_encoding": "pcm16",
                "text": text_for_provider(SpeechProvider::Verbio, &request.text),
            }));

        send_audio_request(SpeechProvider::Verbio, http_request).await
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
            .get(format!("{}/voices", self.api_url))
            .bearer_auth(token);
        send_json_request(SpeechProvider::Verbio, request).await
    }
}
