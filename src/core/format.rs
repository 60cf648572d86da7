//! Output format policy.
//!
//! Every provider resolves to a container extension and sample rate before
//! any artifact path is built, so the cached bundle and the artifact on disk
//! always agree.

use serde::{Deserialize, Serialize};

use crate::core::tts::SpeechProvider;

/// Extension used for MP3 payloads.
pub const MP3_EXTENSION: &str = "mp3";
/// Extension used for WAV payloads.
pub const WAV_EXTENSION: &str = "wav";
/// Nominal rate assumed for MP3 audio whose rate is unknown.
pub const DEFAULT_MP3_RATE: u32 = 22050;

/// Container extension and sample rate of a synthesized payload.
///
/// Raw 16-bit linear PCM uses `r<kHz>` extensions (`r8` for 8000 Hz).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat {
    pub extension: String,
    pub sample_rate: u32,
}

impl OutputFormat {
    /// Raw linear PCM at `sample_rate`.
    pub fn raw(sample_rate: u32) -> Self {
        Self {
            extension: format!("r{}", sample_rate / 1000),
            sample_rate,
        }
    }

    pub fn mp3(sample_rate: u32) -> Self {
        Self {
            extension: MP3_EXTENSION.to_string(),
            sample_rate,
        }
    }

    pub fn wav(sample_rate: u32) -> Self {
        Self {
            extension: WAV_EXTENSION.to_string(),
            sample_rate,
        }
    }

    /// Returns true for headerless linear PCM.
    pub fn is_raw(&self) -> bool {
        raw_rate(&self.extension).is_some()
    }
}

/// Mode flags that influence format selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatFlags {
    /// Audio is being rendered for storage rather than live playback.
    pub render_for_caching: bool,
    /// Per-request flag OR the process-wide switch.
    pub disable_streaming: bool,
    pub trim_silence: bool,
}

impl FormatFlags {
    fn wants_telephony_pcm(&self) -> bool {
        !self.render_for_caching && !self.disable_streaming
    }
}

/// Resolves the format a provider will produce under the given flags.
pub fn resolve_format(provider: SpeechProvider, flags: FormatFlags) -> OutputFormat {
    use SpeechProvider::*;

    match provider {
        Nuance | Nvidia | Verbio => OutputFormat::raw(8000),
        Microsoft => {
            if flags.wants_telephony_pcm() || flags.trim_silence {
                OutputFormat::raw(8000)
            } else {
                OutputFormat::mp3(16000)
            }
        }
        Deepgram | ElevenLabs | RimeLabs | PlayHt | Cartesia => {
            if flags.wants_telephony_pcm() {
                OutputFormat::raw(8000)
            } else {
                match provider {
                    ElevenLabs | Cartesia => OutputFormat::mp3(44100),
                    _ => OutputFormat::mp3(DEFAULT_MP3_RATE),
                }
            }
        }
        Google | OpenAi => OutputFormat::mp3(24000),
        Aws | Ibm | WellSaid | Custom => OutputFormat::mp3(DEFAULT_MP3_RATE),
    }
}

/// Maps a response content type onto a format, when it names one.
///
/// Recognizes `audio/wav`, `audio/x-wav` and `audio/l16;rate=<hz>`;
/// anything else is left to the static policy.
pub fn format_from_content_type(content_type: &str) -> Option<OutputFormat> {
    let lowered = content_type.to_ascii_lowercase();
    let mut parts = lowered.split(';').map(str::trim);
    let mime = parts.next()?;

    match mime {
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some(OutputFormat::wav(8000)),
        "audio/l16" => {
            let rate = parts
                .filter_map(|param| param.strip_prefix("rate="))
                .find_map(|value| value.trim().parse::<u32>().ok())
                .unwrap_or(8000);
            Some(OutputFormat::raw(rate))
        }
        _ => None,
    }
}

fn raw_rate(extension: &str) -> Option<u32> {
    extension
        .strip_prefix('r')
        .and_then(|khz| khz.parse::<u32>().ok())
        .map(|khz| khz * 1000)
}

/// Sample rate implied by a file extension.
///
/// `rN` maps to N kHz; compressed and unknown containers fall back to the
/// nominal MP3 rate.
pub fn rate_for_extension(extension: &str) -> u32 {
    raw_rate(extension).unwrap_or(DEFAULT_MP3_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAMING: FormatFlags = FormatFlags {
        render_for_caching: false,
        disable_streaming: false,
        trim_silence: false,
    };
    const RENDER: FormatFlags = FormatFlags {
        render_for_caching: true,
        disable_streaming: false,
        trim_silence: false,
    };

    #[test]
    fn test_fixed_rate_pcm_providers() {
        for provider in [SpeechProvider::Nuance, SpeechProvider::Nvidia, SpeechProvider::Verbio] {
            assert_eq!(resolve_format(provider, RENDER), OutputFormat::raw(8000));
            assert_eq!(resolve_format(provider, STREAMING), OutputFormat::raw(8000));
        }
    }

    #[test]
    fn test_microsoft_policy() {
        assert_eq!(
            resolve_format(SpeechProvider::Microsoft, STREAMING).extension,
            "r8"
        );
        assert_eq!(
            resolve_format(SpeechProvider::Microsoft, RENDER),
            OutputFormat::mp3(16000)
        );
        let trimmed = FormatFlags {
            trim_silence: true,
            ..RENDER
        };
        assert_eq!(
            resolve_format(SpeechProvider::Microsoft, trimmed),
            OutputFormat::raw(8000)
        );
    }

    #[test]
    fn test_streaming_capable_providers_render_to_mp3() {
        assert_eq!(
            resolve_format(SpeechProvider::ElevenLabs, RENDER),
            OutputFormat::mp3(44100)
        );
        assert_eq!(
            resolve_format(SpeechProvider::Cartesia, RENDER),
            OutputFormat::mp3(44100)
        );
        assert_eq!(
            resolve_format(SpeechProvider::Deepgram, RENDER),
            OutputFormat::mp3(22050)
        );
        let disabled = FormatFlags {
            disable_streaming: true,
            ..STREAMING
        };
        assert_eq!(
            resolve_format(SpeechProvider::PlayHt, disabled),
            OutputFormat::mp3(22050)
        );
        assert_eq!(
            resolve_format(SpeechProvider::RimeLabs, STREAMING),
            OutputFormat::raw(8000)
        );
    }

    #[test]
    fn test_compressed_providers() {
        assert_eq!(
            resolve_format(SpeechProvider::Google, STREAMING),
            OutputFormat::mp3(24000)
        );
        assert_eq!(
            resolve_format(SpeechProvider::OpenAi, RENDER),
            OutputFormat::mp3(24000)
        );
        assert_eq!(
            resolve_format(SpeechProvider::Aws, RENDER),
            OutputFormat::mp3(22050)
        );
    }

    #[test]
    fn test_content_type_override() {
        assert_eq!(
            format_from_content_type("audio/wav"),
            Some(OutputFormat::wav(8000))
        );
        assert_eq!(
            format_from_content_type("audio/L16; rate=16000"),
            Some(OutputFormat::raw(16000))
        );
        assert_eq!(format_from_content_type("audio/mpeg"), None);
    }

    #[test]
    fn test_rate_for_extension() {
        assert_eq!(rate_for_extension("r8"), 8000);
        assert_eq!(rate_for_extension("r16"), 16000);
        assert_eq!(rate_for_extension("mp3"), 22050);
        assert!(OutputFormat::raw(24000).is_raw());
        assert!(!OutputFormat::mp3(24000).is_raw());
    }
}
