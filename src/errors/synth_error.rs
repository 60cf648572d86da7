use crate::core::cache::CacheError;

/// Error taxonomy surfaced by the synthesis and credential layers.
///
/// Validation and provider errors propagate to the caller unchanged. Cache
/// service failures are normally absorbed by the orchestrator and only reach
/// callers through the administrative operations.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// A precondition failed before any I/O was attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The provider rejected the request or could not be reached.
    #[error("Synthesis failed for {provider}{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// Obtaining session credentials for a provider failed.
    #[error("Credential error for {provider}: {message}")]
    Credential { provider: String, message: String },

    #[error("Cache service error: {0}")]
    CacheService(#[from] CacheError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SynthError {
    /// Shorthand for a provider failure without an HTTP or gRPC status.
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            status: None,
            message: message.into(),
        }
    }

    /// Shorthand for a provider failure carrying a status code.
    pub fn provider_status(provider: &str, status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn credential(provider: &str, message: impl Into<String>) -> Self {
        Self::Credential {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Maps a transport-level `reqwest` failure into a provider error.
    pub fn from_transport(provider: &str, err: reqwest::Error) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message: format!("request failed: {err}"),
        }
    }

    /// The provider discriminator did not resolve to a registered backend.
    pub fn unsupported_provider(name: &str) -> Self {
        Self::Validation(format!("Unsupported speech provider: {name}"))
    }

    /// Returns true for errors raised before any network or cache I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type for synthesis operations
pub type SynthResult<T> = Result<T, SynthError>;
