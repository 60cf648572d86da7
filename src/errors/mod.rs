pub mod config_error;
pub mod synth_error;

pub use config_error::ConfigError;
pub use synth_error::{SynthError, SynthResult};
