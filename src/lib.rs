//! Cache-aside text-to-speech synthesis.
//!
//! A [`SpeechSynthesizer`] fingerprints each request, serves previously
//! rendered audio from a key-value cache and otherwise either hands the
//! request to an external streaming engine or renders it through one of the
//! provider adapters, persisting the result for next time.

pub mod config;
pub mod core;
pub mod errors;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::SynthConfig;
pub use core::*;
pub use errors::{ConfigError, SynthError, SynthResult};
