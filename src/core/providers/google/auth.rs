//! Google service account authentication.
//!
//! A service account key is exchanged for an OAuth2 access token through the
//! JWT bearer grant: a short RS256-signed assertion is posted to the key's
//! `token_uri`. Tokens are cached per service account through the
//! [`CredentialCache`].
//!
//! Keys are accepted either as JSON content (detected by a leading `{`) or
//! as a path to the JSON key file.

use std::path::Path;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::credentials::{CredentialCache, FetchedCredential, ProviderCredential};
use crate::core::fingerprint::credential_scope_key;
use crate::core::providers::{into_bearer, request_token};
use crate::errors::{SynthError, SynthResult};

use super::{GOOGLE_CLOUD_PLATFORM_SCOPE, GOOGLE_TOKEN_URL};

const PROVIDER: &str = "google";
/// Lifetime requested for each signed assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a service account key file this crate uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    /// Parses JSON content, or reads the file the value points at.
    pub fn load(source: &str) -> SynthResult<Self> {
        let trimmed = source.trim_start();
        let content = if trimmed.starts_with('{') {
            trimmed.to_string()
        } else {
            if source.contains("..") {
                return Err(SynthError::Validation(
                    "Invalid credential file path: path traversal not allowed".to_string(),
                ));
            }
            if !Path::new(source).exists() {
                return Err(SynthError::Validation(format!(
                    "Credential file not found: {source}"
                )));
            }
            std::fs::read_to_string(source)?
        };

        serde_json::from_str(&content).map_err(|e| {
            SynthError::Validation(format!("Invalid service account key: {e}"))
        })
    }

    fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(GOOGLE_TOKEN_URL)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

/// Signs the JWT bearer assertion for `key`.
pub fn sign_assertion(key: &ServiceAccountKey, issued_at: i64) -> SynthResult<String> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: GOOGLE_CLOUD_PLATFORM_SCOPE,
        aud: key.token_uri(),
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SynthError::credential(PROVIDER, format!("invalid private key: {e}")))?;

    jsonwebtoken::encode(&header, &claims, &encoding_key)
        .map_err(|e| SynthError::credential(PROVIDER, format!("failed to sign assertion: {e}")))
}

/// Returns an access token for the service account, cache-aside.
pub async fn access_token(
    http: &reqwest::Client,
    cache: &CredentialCache,
    key: &ServiceAccountKey,
) -> SynthResult<String> {
    let scope = credential_scope_key(PROVIDER, &[&key.client_email, &key.private_key]);

    let cached = cache
        .get_or_fetch(&scope, move || async move {
            let assertion = sign_assertion(key, chrono::Utc::now().timestamp())?;
            let token: TokenResponse = request_token(
                PROVIDER,
                http.post(key.token_uri()).form(&[
                    ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                    ("assertion", assertion.as_str()),
                ]),
            )
            .await?;
            debug!(client_email = %key.client_email, "Fetched Google access token");
            Ok(FetchedCredential::expiring_in(
                ProviderCredential::bearer(PROVIDER, token.access_token),
                token.expires_in,
            ))
        })
        .await?;

    into_bearer(PROVIDER, cached)
}
