//! Nuance Mix TTSaaS adapter (gRPC `UnarySynthesize`).
//!
//! Hosted Mix requires an OAuth bearer token; an on-premises `nuance_tts_uri`
//! is called without authentication.

use async_trait::async_trait;
use tonic::metadata::MetadataValue;
use tracing::debug;

use super::base::{
    BackendContext, SpeechProvider, SynthesisBackend, SynthesizedAudio, credentials_mismatch,
    require,
};
use super::markup::is_markup;
use super::proto::{
    NUANCE_UNARY_SYNTHESIZE, NuanceAudioFormat, NuanceAudioParameters, NuanceInput, NuancePcm,
    NuanceSsml, NuanceSynthesisRequest, NuanceText, NuanceUnarySynthesisResponse, NuanceVoice,
};
use crate::core::format::OutputFormat;
use crate::core::providers::grpc::{create_grpc_channel, unary};
use crate::core::providers::nuance::{
    NUANCE_TOKEN_URL, NUANCE_TTS_ENDPOINT, NUANCE_TTS_SCOPE, access_token,
};
use crate::core::synth::{NuanceCredentials, ProviderCredentials, SynthesisRequest};
use crate::errors::{SynthError, SynthResult};

pub const DEFAULT_NUANCE_MODEL: &str = "enhanced";

/// Status code Nuance reports for a successful synthesis.
const NUANCE_STATUS_OK: u32 = 200;

pub struct NuanceBackend {
    endpoint: String,
    token_url: String,
}

impl NuanceBackend {
    pub fn new() -> Self {
        Self::with_endpoints(NUANCE_TTS_ENDPOINT, NUANCE_TOKEN_URL)
    }

    pub fn with_endpoints(endpoint: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token_url: token_url.into(),
        }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&NuanceCredentials> {
        match credentials {
            ProviderCredentials::Nuance(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::Nuance, other)),
        }
    }

    fn on_prem_uri(creds: &NuanceCredentials) -> Option<&str> {
        creds.nuance_tts_uri.as_deref().filter(|u| !u.is_empty())
    }

    fn build_request(request: &SynthesisRequest, format: &OutputFormat) -> NuanceSynthesisRequest {
        let input = if is_markup(&request.text) {
            NuanceInput {
                text: None,
                ssml: Some(NuanceSsml {
                    text: request.text.clone(),
                }),
            }
        } else {
            NuanceInput {
                text: Some(NuanceText {
                    text: request.text.clone(),
                }),
                ssml: None,
            }
        };

        NuanceSynthesisRequest {
            voice: Some(NuanceVoice {
                name: request.voice.clone().unwrap_or_default(),
                model: request
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_NUANCE_MODEL.to_string()),
            }),
            audio_params: Some(NuanceAudioParameters {
                audio_format: Some(NuanceAudioFormat {
                    pcm: Some(NuancePcm {
                        sample_rate_hz: format.sample_rate,
                    }),
                }),
            }),
            input: Some(input),
        }
    }
}

impl Default for NuanceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for NuanceBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::Nuance
    }

    fn normalize(&self, request: &mut SynthesisRequest) {
        if request.model.as_deref().is_none_or(str::is_empty) {
            request.model = Some(DEFAULT_NUANCE_MODEL.to_string());
        }
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::Nuance, request.voice.as_deref(), "voice")?;
        let creds = Self::credentials(&request.credentials)?;
        if Self::on_prem_uri(creds).is_none() {
            require(SpeechProvider::Nuance, creds.client_id.as_deref(), "a client id")?;
            require(SpeechProvider::Nuance, creds.secret.as_deref(), "a secret")?;
        }
        Ok(())
    }

    async fn synthesize(
        &self,
        ctx: &BackendContext,
        request: &SynthesisRequest,
        format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio> {
        let creds = Self::credentials(&request.credentials)?;
        let mut grpc_request = tonic::Request::new(Self::build_request(request, format));

        let endpoint = match Self::on_prem_uri(creds) {
            Some(uri) => uri.to_string(),
            None => {
                let token = access_token(
                    &ctx.http,
                    &ctx.credentials,
                    &self.token_url,
                    creds.client_id.as_deref().unwrap_or_default(),
                    creds.secret.as_deref().unwrap_or_default(),
                    NUANCE_TTS_SCOPE,
                )
                .await?;
                let value = MetadataValue::try_from(format!("Bearer {token}")).map_err(|e| {
                    SynthError::credential("nuance", format!("invalid access token: {e}"))
                })?;
                grpc_request.metadata_mut().insert("authorization", value);
                self.endpoint.clone()
            }
        };

        let channel = create_grpc_channel("nuance", &endpoint).await?;
        let response: NuanceUnarySynthesisResponse =
            unary("nuance", channel, NUANCE_UNARY_SYNTHESIZE, grpc_request).await?;

        if let Some(status) = response.status.as_ref()
            && status.code != NUANCE_STATUS_OK
        {
            return Err(SynthError::provider_status(
                "nuance",
                status.code as u16,
                format!("{} {}", status.message, status.details).trim().to_string(),
            ));
        }
        if response.audio.is_empty() {
            return Err(SynthError::provider("nuance", "empty audio response"));
        }

        debug!(bytes = response.audio.len(), "Received Nuance audio");
        Ok(SynthesizedAudio::new(response.audio))
    }
}
