//! Microsoft Azure Speech REST adapter.
//!
//! The REST endpoint only accepts SSML, so plain text is escaped and wrapped
//! and caller markup is rebuilt around the required `<voice>` element.

use async_trait::async_trait;

use super::base::{
    BackendContext, SpeechProvider, SynthesisBackend, SynthesizedAudio, credentials_mismatch,
    require,
};
use super::markup::{escape_xml, is_markup, speak_body};
use super::provider::send_audio_request;
use crate::core::format::OutputFormat;
use crate::core::providers::azure::{
    AZURE_MP3_16KHZ, AZURE_OUTPUT_FORMAT_HEADER, AZURE_RAW_8KHZ, AZURE_SUBSCRIPTION_KEY_HEADER,
    tts_rest_url,
};
use crate::core::synth::{
    MicrosoftCredentials, ProviderCredentials, StreamingDirective, SynthesisRequest,
};
use crate::errors::SynthResult;

const SSML_NAMESPACE: &str = "http://www.w3.org/2001/10/synthesis";
const MSTTS_NAMESPACE: &str = "https://www.w3.org/2001/mstts";

pub struct MicrosoftBackend {
    endpoint_override: Option<String>,
}

impl MicrosoftBackend {
    pub fn new() -> Self {
        Self {
            endpoint_override: None,
        }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint_override: Some(endpoint.into()),
        }
    }

    fn credentials(credentials: &ProviderCredentials) -> SynthResult<&MicrosoftCredentials> {
        match credentials {
            ProviderCredentials::Microsoft(creds) => Ok(creds),
            other => Err(credentials_mismatch(SpeechProvider::Microsoft, other)),
        }
    }

    fn endpoint(&self, request: &SynthesisRequest, creds: &MicrosoftCredentials) -> String {
        let base = self
            .endpoint_override
            .clone()
            .or_else(|| creds.custom_endpoint.clone().filter(|e| !e.is_empty()))
            .unwrap_or_else(|| tts_rest_url(&creds.region));

        match request.deployment_id.as_deref().filter(|d| !d.is_empty()) {
            Some(deployment) => {
                let separator = if base.contains('?') { '&' } else { '?' };
                format!(
                    "{base}{separator}deploymentId={}",
                    urlencoding::encode(deployment)
                )
            }
            None => base,
        }
    }

    /// Builds the SSML document sent to the service.
    fn build_ssml(request: &SynthesisRequest) -> String {
        let language = request.language.as_deref().unwrap_or("en-US");
        let voice = request.voice.as_deref().unwrap_or_default();

        let body = if is_markup(&request.text) {
            let inner = speak_body(&request.text);
            if inner.contains("<voice") {
                return request.text.clone();
            }
            inner.to_string()
        } else {
            escape_xml(&request.text)
        };

        format!(
            "<speak version='1.0' xmlns='{SSML_NAMESPACE}' xmlns:mstts='{MSTTS_NAMESPACE}' \
             xml:lang='{language}'><voice name='{voice}'>{body}</voice></speak>"
        )
    }
}

impl Default for MicrosoftBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for MicrosoftBackend {
    fn provider(&self) -> SpeechProvider {
        SpeechProvider::Microsoft
    }

    fn validate(&self, request: &SynthesisRequest) -> SynthResult<()> {
        if request.deployment_id.as_deref().is_none_or(str::is_empty) {
            require(SpeechProvider::Microsoft, request.language.as_deref(), "language")?;
            require(SpeechProvider::Microsoft, request.voice.as_deref(), "voice")?;
        }
        let creds = Self::credentials(&request.credentials)?;
        require(SpeechProvider::Microsoft, Some(creds.api_key.as_str()), "an api key")?;
        if creds.custom_endpoint.as_deref().is_none_or(str::is_empty) {
            require(SpeechProvider::Microsoft, Some(creds.region.as_str()), "a region")?;
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
        let output_format = if format.is_raw() {
            AZURE_RAW_8KHZ
        } else {
            AZURE_MP3_16KHZ
        };

        let http_request = ctx
            .http
            .post(self.endpoint(request, creds))
            .header(AZURE_SUBSCRIPTION_KEY_HEADER, &creds.api_key)
            .header(AZURE_OUTPUT_FORMAT_HEADER, output_format)
            .header("Content-Type", "application/ssml+xml")
            .header("User-Agent", "voxcache")
            .body(Self::build_ssml(request));

        send_audio_request(SpeechProvider::Microsoft, http_request).await
    }

    fn streaming_params(&self, request: &SynthesisRequest, directive: &mut StreamingDirective) {
        if let ProviderCredentials::Microsoft(creds) = &request.credentials {
            directive
                .push("api_key", creds.api_key.as_str())
                .push("region", creds.region.as_str())
                .push_opt("custom_endpoint", creds.custom_endpoint.as_deref())
                .push_opt("deployment_id", request.deployment_id.as_deref());
        }
    }
}
