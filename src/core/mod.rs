pub mod admin;
pub mod cache;
pub mod credentials;
pub mod fingerprint;
pub mod format;
pub mod providers;
pub mod synth;
pub mod tts;

pub use admin::{PurgeOutcome, PurgeScope, purge, size};
pub use cache::{CacheConfig, KeyValueStore, MemoryKeyValueStore, create_store};
pub use credentials::CredentialCache;
pub use format::OutputFormat;
pub use synth::{
    FsArtifactSink, ProviderCredentials, SpeechSynthesizer, StreamingDirective, SynthSettings,
    SynthesisOutput, SynthesisRequest, SynthesisResult,
};
pub use tts::{BackendRegistry, SpeechProvider, SynthesisBackend};
