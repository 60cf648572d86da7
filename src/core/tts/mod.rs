//! Speech provider backends and the registry that selects them.

pub mod aws;
mod base;
pub mod cartesia;
pub mod custom;
pub mod deepgram;
pub mod elevenlabs;
pub mod google;
pub mod ibm;
pub mod markup;
pub mod microsoft;
pub mod nuance;
pub mod nvidia;
pub mod openai;
pub mod playht;
pub mod proto;
pub mod provider;
pub mod rimelabs;
pub mod verbio;
pub mod wellsaid;

pub use aws::PollyBackend;
pub use base::{
    BackendContext, BoxedBackend, SpeechProvider, SynthesisBackend, SynthesizedAudio,
};
pub(crate) use base::check_text_length;
pub use cartesia::{CARTESIA_TTS_URL, CartesiaBackend};
pub use custom::CustomBackend;
pub use deepgram::{DEEPGRAM_TTS_URL, DeepgramBackend};
pub use elevenlabs::{ELEVENLABS_TTS_URL, ElevenLabsBackend};
pub use google::GoogleBackend;
pub use ibm::IbmBackend;
pub use microsoft::MicrosoftBackend;
pub use nuance::NuanceBackend;
pub use nvidia::NvidiaBackend;
pub use openai::OpenAiBackend;
pub use playht::{PLAYHT_TTS_URL, PlayHtBackend};
pub use rimelabs::{RIMELABS_TTS_URL, RimeLabsBackend};
pub use verbio::VerbioBackend;
pub use wellsaid::{WELLSAID_TTS_URL, WellSaidBackend};

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::SynthResult;

/// Creates the default backend for a provider.
pub fn create_backend(provider: SpeechProvider) -> BoxedBackend {
    match provider {
        SpeechProvider::Google => Arc::new(GoogleBackend::new()),
        SpeechProvider::Aws => Arc::new(PollyBackend::new()),
        SpeechProvider::Microsoft => Arc::new(MicrosoftBackend::new()),
        SpeechProvider::Ibm => Arc::new(IbmBackend::new()),
        SpeechProvider::Nuance => Arc::new(NuanceBackend::new()),
        SpeechProvider::Nvidia => Arc::new(NvidiaBackend::new()),
        SpeechProvider::WellSaid => Arc::new(WellSaidBackend::new()),
        SpeechProvider::ElevenLabs => Arc::new(ElevenLabsBackend::new()),
        SpeechProvider::Deepgram => Arc::new(DeepgramBackend::new()),
        SpeechProvider::PlayHt => Arc::new(PlayHtBackend::new()),
        SpeechProvider::RimeLabs => Arc::new(RimeLabsBackend::new()),
        SpeechProvider::Cartesia => Arc::new(CartesiaBackend::new()),
        SpeechProvider::OpenAi => Arc::new(OpenAiBackend::new()),
        SpeechProvider::Verbio => Arc::new(VerbioBackend::new()),
        SpeechProvider::Custom => Arc::new(CustomBackend::new()),
    }
}

/// Lookup table from provider to backend.
///
/// [`BackendRegistry::new`] registers every built-in backend; individual
/// entries can be replaced with [`BackendRegistry::with_backend`], which is
/// how tests point a provider at a mock server.
#[derive(Clone)]
pub struct BackendRegistry {
    backends: HashMap<SpeechProvider, BoxedBackend>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        let backends = SpeechProvider::ALL
            .into_iter()
            .map(|provider| (provider, create_backend(provider)))
            .collect();
        Self { backends }
    }

    /// A registry with no backends.
    pub fn empty() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Registers `backend` under its own provider, replacing any previous one.
    pub fn register(&mut self, backend: BoxedBackend) {
        self.backends.insert(backend.provider(), backend);
    }

    pub fn with_backend(mut self, backend: BoxedBackend) -> Self {
        self.register(backend);
        self
    }

    pub fn get(&self, provider: SpeechProvider) -> Option<&BoxedBackend> {
        self.backends.get(&provider)
    }

    /// Resolves a provider discriminator (case-insensitive, aliases allowed).
    ///
    /// Unknown names and providers without a registered backend are
    /// rejected with a validation error.
    pub fn resolve(&self, name: &str) -> SynthResult<(SpeechProvider, BoxedBackend)> {
        let provider: SpeechProvider = name.parse()?;
        self.get(provider)
            .cloned()
            .map(|backend| (provider, backend))
            .ok_or_else(|| crate::errors::SynthError::unsupported_provider(name))
    }

    /// Registered providers in declaration order.
    pub fn providers(&self) -> Vec<SpeechProvider> {
        SpeechProvider::ALL
            .into_iter()
            .filter(|p| self.backends.contains_key(p))
            .collect()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
