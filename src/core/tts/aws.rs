//! Amazon Polly adapter.
//!
//! Calls the Polly `SynthesizeSpeech` REST operation with SigV4 signing.
//! With `use_session_token` the long-lived keys are first exchanged for an STS
//! session, which is cached through the credential cache.

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use super::base::{
    BackendContext, SpeechProvider, SynthesisBackend, SynthesizedAudio, credentials_mismatch,
    require,
};
use super::markup::is_markup;
use super::provider::{send_audio_request, send_json_request};
use crate::core::format::OutputFormat;
use crate::core::providers::aws::{AwsSigner, polly_url, session_credentials, sigv4, sts_url};
use crate::core::synth::{AwsCredentials, ProviderCredentials, SynthesisRequest};
use crate::errors::{SynthError, SynthResult};

/// Resolved signing keys for one call.
struct SigningKeys {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

pub struct PollyBackend {
    endpoint_override: Option<String>,
    sts_override: Option<String>,
}

impl PollyBackend {
    pub fn new() -> Self {
        Self {
            endpoint_override: None,
            sts_override: None,
        }
    }

    /// Sends Polly and STS calls to fixed endpoints instead of the regional ones.
    pub fn with_endpoints(polly: impl Into<String>, sts: impl Into<String>) -> Self {
        Self {
            endpoint_override: Some(polly.into()),
            sts_override: Some(sts.into()),
        }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&AwsCredentials> {
        match credentials {
            ProviderCredentials::Aws(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::Aws, other)),
        }
    }

    fn validate_credentials(creds: &AwsCredentials) -> SynthResult<()> {
        require(SpeechProvider::Aws, Some(creds.access_key_id.as_str()), "an access key id")?;
        require(
            SpeechProvider::Aws,
            Some(creds.secret_access_key.as_str()),
            "a secret access key",
        )?;
        require(SpeechProvider::Aws, Some(creds.region.as_str()), "a region")?;
        Ok(())
    }

    fn base_url(&self, region: &str) -> String {
        self.endpoint_override
            .clone()
            .unwrap_or_else(|| polly_url(region))
    }

    async fn signing_keys(
        &self,
        ctx: &BackendContext,
        creds: &AwsCredentials,
    ) -> SynthResult<SigningKeys> {
        if !creds.use_session_token {
            return Ok(SigningKeys {
                access_key_id: creds.access_key_id.clone(),
                secret_access_key: creds.secret_access_key.clone(),
                session_token: creds.session_token.clone(),
            });
        }

        let sts = self
            .sts_override
            .clone()
            .unwrap_or_else(|| sts_url(&creds.region));
        let session = session_credentials(
            &ctx.http,
            &ctx.credentials,
            &sts,
            &creds.access_key_id,
            &creds.secret_access_key,
            &creds.region,
        )
        .await?;
        Ok(SigningKeys {
            access_key_id: session.access_key_id,
            secret_access_key: session.secret_access_key,
            session_token: Some(session.session_token),
        })
    }

    fn signed_request(
        ctx: &BackendContext,
        method: reqwest::Method,
        url: &str,
        body: Option<Vec<u8>>,
        keys: &SigningKeys,
        region: &str,
    ) -> SynthResult<reqwest::RequestBuilder> {
        let parsed = Url::parse(url)
            .map_err(|e| SynthError::Validation(format!("Invalid Polly endpoint '{url}': {e}")))?;
        let signer = AwsSigner {
            access_key_id: &keys.access_key_id,
            secret_access_key: &keys.secret_access_key,
            session_token: keys.session_token.as_deref(),
            region,
            service: "polly",
        };

        let payload = body.unwrap_or_default();
        let headers: &[(&str, &str)] = if payload.is_empty() {
            &[]
        } else {
            &[("content-type", "application/json")]
        };
        let signed = signer.sign(method.as_str(), &parsed, headers, &payload, chrono::Utc::now());

        let mut request = ctx.http.request(method, parsed);
        if !payload.is_empty() {
            request = request.header("Content-Type", "application/json").body(payload);
        }
        Ok(sigv4::apply(request, signed))
    }

    fn build_request_body(request: &SynthesisRequest, format: &OutputFormat) -> serde_json::Value {
        let mut body = json!({
            "OutputFormat": "mp3",
            "SampleRate": format.sample_rate.to_string(),
            "Text": request.text,
            "TextType": if is_markup(&request.text) { "ssml" } else { "text" },
            "VoiceId": request.voice,
        });
        if let Some(engine) = request.engine.as_deref().filter(|e| !e.is_empty()) {
            body["Engine"] = json!(engine);
        }
        if let Some(language) = request.language.as_deref().filter(|l| !l.is_empty()) {
            body["LanguageCode"] = json!(language);
        }
        body
    }
}

impl Default for PollyBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for PollyBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::Aws
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::Aws, request.voice.as_deref(), "voice")?;
        Self::validate_credentials(Self::credentials(&request.credentials)?)
    }

    async fn synthesize(
        &self,
        ctx: &BackendContext,
        request: &SynthesisRequest,
        format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio> {
        let creds = Self::credentials(&request.credentials)?;
        let keys = self.signing_keys(ctx, creds).await?;
        let body = serde_json::to_vec(&Self::build_request_body(request, format))?;
        let url = format!("{}/v1/speech", self.base_url(&creds.region));

        let http_request = Self::signed_request(
            ctx,
            reqwest::Method::POST,
            &url,
            Some(body),
            &keys,
            &creds.region,
        )?;
        send_audio_request(SpeechProvider::Aws, http_request).await
    }

    async fn list_voices(
        &self,
        ctx: &BackendContext,
        credentials: &ProviderCredentials,
    ) -> SynthResult<serde_json::Value> {
        let creds = Self::credentials(credentials)?;
        Self::validate_credentials(creds)?;
        let keys = self.signing_keys(ctx, creds).await?;
        let url = format!("{}/v1/voices", self.base_url(&creds.region));
        let request =
            Self::signed_request(ctx, reqwest::Method::GET, &url, None, &keys, &creds.region)?;
        send_json_request(SpeechProvider::Aws, request).await
    }
}
