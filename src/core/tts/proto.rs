//! Protobuf messages for the gRPC speech services.
//!
//! Only the fields this crate sends or reads are declared; unknown fields
//! in responses are skipped by the decoder.

/// `nuance.tts.v1.Synthesizer/UnarySynthesize`
pub const NUANCE_UNARY_SYNTHESIZE: &str = "/nuance.tts.v1.Synthesizer/UnarySynthesize";

/// `nvidia.riva.tts.RivaSpeechSynthesis/Synthesize`
pub const RIVA_SYNTHESIZE: &str = "/nvidia.riva.tts.RivaSpeechSynthesis/Synthesize";

/// Riva `AudioEncoding.LINEAR_PCM`.
pub const RIVA_LINEAR_PCM: i32 = 1;

#[derive(Clone, PartialEq, prost::Message)]
pub struct NuanceVoice {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub model: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NuancePcm {
    #[prost(uint32, tag = "1")]
    pub sample_rate_hz: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NuanceAudioFormat {
    #[prost(message, optional, tag = "1")]
    pub pcm: Option<NuancePcm>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NuanceAudioParameters {
    #[prost(message, optional, tag = "1")]
    pub audio_format: Option<NuanceAudioFormat>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NuanceText {
    #[prost(string, tag = "1")]
    pub text: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NuanceSsml {
    #[prost(string, tag = "1")]
    pub text: String,
}

/// Exactly one of `text` or `ssml` is set.
#[derive(Clone, PartialEq, prost::Message)]
pub struct NuanceInput {
    #[prost(message, optional, tag = "1")]
    pub text: Option<NuanceText>,
    #[prost(message, optional, tag = "2")]
    pub ssml: Option<NuanceSsml>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NuanceSynthesisRequest {
    #[prost(message, optional, tag = "1")]
    pub voice: Option<NuanceVoice>,
    #[prost(message, optional, tag = "2")]
    pub audio_params: Option<NuanceAudioParameters>,
    #[prost(message, optional, tag = "3")]
    pub input: Option<NuanceInput>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NuanceStatus {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(string, tag = "3")]
    pub details: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NuanceUnarySynthesisResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<NuanceStatus>,
    #[prost(bytes = "vec", tag = "3")]
    pub audio: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RivaSynthesizeSpeechRequest {
    #[prost(string, tag = "1")]
    pub text: String,
    #[prost(string, tag = "2")]
    pub language_code: String,
    #[prost(int32, tag = "3")]
    pub encoding: i32,
    #[prost(int32, tag = "4")]
    pub sample_rate_hz: i32,
    #[prost(string, tag = "5")]
    pub voice_name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RivaSynthesizeSpeechResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub audio: Vec<u8>,
}
