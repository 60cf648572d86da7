//! Azure Speech Services endpoints and authentication headers.

/// The HTTP header name for Azure subscription key authentication.
pub const AZURE_SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Header selecting the synthesized audio format.
pub const AZURE_OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";

/// 8 kHz 16-bit mono headerless PCM.
pub const AZURE_RAW_8KHZ: &str = "raw-8khz-16bit-mono-pcm";

/// 16 kHz mono MP3.
pub const AZURE_MP3_16KHZ: &str = "audio-16khz-32kbitrate-mono-mp3";

/// Text-to-speech REST endpoint for a region.
///
/// Format: `https://<region>.tts.speech.microsoft.com/cognitiveservices/v1`
pub fn tts_rest_url(region: &str) -> String {
    format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1")
}

/// Voice list endpoint for a region.
pub fn voices_list_url(region: &str) -> String {
    format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/voices/list")
}
