//! Nvidia Riva adapter (gRPC, linear PCM).

use async_trait::async_trait;

use super::base::{
    BackendContext, SpeechProvider, SynthesisBackend, SynthesizedAudio, credentials_mismatch,
    require,
};
use super::proto::{
    RIVA_LINEAR_PCM, RIVA_SYNTHESIZE, RivaSynthesizeSpeechRequest, RivaSynthesizeSpeechResponse,
};
use crate::core::format::OutputFormat;
use crate::core::providers::grpc::{create_grpc_channel, unary};
use crate::core::synth::{NvidiaCredentials, ProviderCredentials, SynthesisRequest};
use crate::errors::{SynthError, SynthResult};

#[derive(Default)]
pub struct NvidiaBackend;

impl NvidiaBackend {
    pub fn new() -> Self {
        Self
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&NvidiaCredentials> {
        match credentials {
            ProviderCredentials::Nvidia(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::Nvidia, other)),
        }
    }

    fn build_request(
        request: &SynthesisRequest,
        format: &OutputFormat,
    ) -> RivaSynthesizeSpeechRequest {
        RivaSynthesizeSpeechRequest {
            text: request.text.clone(),
            language_code: request.language.clone().unwrap_or_default(),
            encoding: RIVA_LINEAR_PCM,
            sample_rate_hz: format.sample_rate as i32,
            voice_name: request.voice.clone().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl SynthesisBackend for NvidiaBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::Nvidia
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        require(SpeechProvider::Nvidia, request.voice.as_deref(), "voice")?;
        require(SpeechProvider::Nvidia, request.language.as_deref(), "language")?;
        let creds = Self::credentials(&request.credentials)?;
        require(SpeechProvider::Nvidia, Some(creds.riva_uri.as_str()), "a Riva URI")?;
        Ok(())
    }

    async fn synthesize(
        &self,
        _ctx: &BackendContext,
        request: &SynthesisRequest,
        format: &OutputFormat,
    ) -> SynthResult<SynthesizedAudio> {
        let creds = Self::credentials(&request.credentials)?;
        let channel = create_grpc_channel("nvidia", &creds.riva_uri).await?;
        let response: RivaSynthesizeSpeechResponse = unary(
            "nvidia",
            channel,
            RIVA_SYNTHESIZE,
            tonic::Request::new(Self::build_request(request, format)),
        )
        .await?;

        if response.audio.is_empty() {
            return Err(SynthError::provider("nvidia", "empty audio response"));
        }
        Ok(SynthesizedAudio::new(response.audio))
    }
}
