//! Synthesis requests, results and the cache-aside orchestrator.

pub mod artifact;
pub mod directive;
pub mod request;
pub mod stats;
pub mod synthesizer;

pub use artifact::{ArtifactSink, FsArtifactSink};
pub use directive::{CACHE_KEY, StreamingDirective, WRITE_CACHE_FILE};
pub use request::{
    ApiKeyCredentials, AwsCredentials, CustomCredentials, GoogleCredentials, IbmCredentials,
    MicrosoftCredentials, NuanceCredentials, NvidiaCredentials, PlayHtCredentials,
    ProviderCredentials, SynthesisOutput, SynthesisRequest, SynthesisResult, VerbioCredentials,
};
pub use stats::{MemoryStats, NoopStats, StatSample, StatsSink};
pub use synthesizer::{DEFAULT_CACHE_TTL, SpeechSynthesizer, SynthSettings};
