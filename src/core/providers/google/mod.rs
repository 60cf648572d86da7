//! Google Cloud provider infrastructure.

pub mod auth;

pub use auth::{ServiceAccountKey, access_token, sign_assertion};

/// The default OAuth2 scope for Google Cloud APIs.
pub const GOOGLE_CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Token endpoint used when a key does not name one.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google Cloud Text-to-Speech API endpoint.
pub const GOOGLE_TTS_ENDPOINT: &str = "https://texttospeech.googleapis.com";
