use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::directive::StreamingDirective;
use crate::core::fingerprint::FingerprintFields;
use crate::core::format::OutputFormat;

/// Google Cloud Text-to-Speech credentials.
///
/// Either a plain API key or a service account key (JSON content or a path
/// to the JSON file). The service account wins when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleCredentials {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub service_account: Option<String>,
}

/// AWS Polly credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    /// Pre-issued session token, sent as-is when present.
    #[serde(default)]
    pub session_token: Option<String>,
    /// Exchange the long-lived keys for an STS session before synthesizing.
    #[serde(default)]
    pub use_session_token: bool,
}

/// Microsoft Azure Speech credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicrosoftCredentials {
    pub api_key: String,
    pub region: String,
    /// Full endpoint override for custom neural voices.
    #[serde(default)]
    pub custom_endpoint: Option<String>,
}

/// IBM Watson credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbmCredentials {
    pub api_key: String,
    pub region: String,
}

/// Nuance Mix credentials, or an on-premises endpoint that needs none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NuanceCredentials {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub nuance_tts_uri: Option<String>,
}

/// Nvidia Riva endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NvidiaCredentials {
    pub riva_uri: String,
}

/// Credentials made of a single API key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyCredentials {
    pub api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayHtCredentials {
    pub api_key: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbioCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// A customer-hosted synthesis endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCredentials {
    pub url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Provider-tagged credential set.
///
/// Each adapter asks only for its own variant, so a request carries exactly
/// the fields its provider needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "vendor", rename_all = "lowercase")]
pub enum ProviderCredentials {
    #[default]
    None,
    Google(GoogleCredentials),
    #[serde(alias = "polly")]
    Aws(AwsCredentials),
    #[serde(alias = "azure")]
    Microsoft(MicrosoftCredentials),
    Ibm(IbmCredentials),
    Nuance(NuanceCredentials),
    Nvidia(NvidiaCredentials),
    WellSaid(ApiKeyCredentials),
    ElevenLabs(ApiKeyCredentials),
    Deepgram(ApiKeyCredentials),
    PlayHt(PlayHtCredentials),
    RimeLabs(ApiKeyCredentials),
    Cartesia(ApiKeyCredentials),
    OpenAi(ApiKeyCredentials),
    Verbio(VerbioCredentials),
    Custom(CustomCredentials),
}

impl ProviderCredentials {
    /// Discriminator of the variant, `none` when no credentials were given.
    pub fn vendor(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Google(_) => "google",
            Self::Aws(_) => "aws",
            Self::Microsoft(_) => "microsoft",
            Self::Ibm(_) => "ibm",
            Self::Nuance(_) => "nuance",
            Self::Nvidia(_) => "nvidia",
            Self::WellSaid(_) => "wellsaid",
            Self::ElevenLabs(_) => "elevenlabs",
            Self::Deepgram(_) => "deepgram",
            Self::PlayHt(_) => "playht",
            Self::RimeLabs(_) => "rimelabs",
            Self::Cartesia(_) => "cartesia",
            Self::OpenAi(_) => "openai",
            Self::Verbio(_) => "verbio",
            Self::Custom(_) => "custom",
        }
    }
}

/// A request to turn text into speech.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Tenant owning the cache entry; scopes purges.
    #[serde(default)]
    pub tenant: Option<String>,
    /// Provider discriminator (`google`, `aws`, `polly`, ...).
    pub provider: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
    /// Custom voice deployment; stands in for the voice when no voice is set.
    #[serde(default)]
    pub deployment_id: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Plain text or `<speak>` markup.
    pub text: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub credentials: ProviderCredentials,
    /// Skip the cache lookup; a rendered result is still written.
    #[serde(default)]
    pub disable_cache: bool,
    /// Render audio for storage even when the provider could stream.
    #[serde(default)]
    pub render_for_caching: bool,
    #[serde(default)]
    pub disable_streaming: bool,
    /// Distinguishes artifacts of concurrent callers with identical text.
    #[serde(default)]
    pub salt: Option<String>,
}

impl SynthesisRequest {
    pub fn new(provider: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_credentials(mut self, credentials: ProviderCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Voice identifier used for keying: the voice, else the deployment id.
    pub fn voice_or_deployment(&self) -> Option<&str> {
        self.voice.as_deref().or(self.deployment_id.as_deref())
    }

    pub fn fingerprint_fields(&self) -> FingerprintFields<'_> {
        FingerprintFields {
            tenant: self.tenant.as_deref(),
            provider: &self.provider,
            language: self.language.as_deref(),
            voice: self.voice_or_deployment(),
            engine: self.engine.as_deref(),
            model: self.model.as_deref(),
            text: &self.text,
            instructions: self.instructions.as_deref(),
        }
    }
}

/// What a synthesis call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutput {
    /// Rendered audio written to an artifact file.
    Audio {
        artifact_path: PathBuf,
        format: OutputFormat,
    },
    /// Deferred synthesis handed to the real-time engine.
    Streaming(StreamingDirective),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub output: SynthesisOutput,
    /// Cache fingerprint of the request.
    pub cache_key: String,
    pub served_from_cache: bool,
    /// Provider round trip time; set only when the provider was called.
    pub elapsed: Option<Duration>,
}

impl SynthesisResult {
    pub fn artifact_path(&self) -> Option<&PathBuf> {
        match &self.output {
            SynthesisOutput::Audio { artifact_path, .. } => Some(artifact_path),
            SynthesisOutput::Streaming(_) => None,
        }
    }

    pub fn directive(&self) -> Option<&StreamingDirective> {
        match &self.output {
            SynthesisOutput::Streaming(directive) => Some(directive),
            SynthesisOutput::Audio { .. } => None,
        }
    }
}
