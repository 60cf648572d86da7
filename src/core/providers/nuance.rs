//! Nuance Mix OAuth client-credentials flow.

use serde::Deserialize;
use tracing::debug;

use super::{into_bearer, request_token};
use crate::core::credentials::{CredentialCache, FetchedCredential, ProviderCredential};
use crate::core::fingerprint::credential_scope_key;
use crate::errors::SynthResult;

const PROVIDER: &str = "nuance";

pub const NUANCE_TOKEN_URL: &str = "https://auth.crt.nuance.com/oauth2/token";
/// Hosted Nuance Mix TTS gRPC endpoint.
pub const NUANCE_TTS_ENDPOINT: &str = "https://tts.api.nuance.com";
pub const NUANCE_TTS_SCOPE: &str = "tts";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Basic authorization value; Nuance expects the client id URL-encoded.
pub fn basic_auth_header(client_id: &str, secret: &str) -> String {
    use base64::Engine;

    let raw = format!("{}:{}", urlencoding::encode(client_id), secret);
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(raw)
    )
}

/// Returns a Nuance access token for `scope`, cache-aside.
pub async fn access_token(
    http: &reqwest::Client,
    cache: &CredentialCache,
    token_url: &str,
    client_id: &str,
    secret: &str,
    scope: &str,
) -> SynthResult<String> {
    let scope_key = credential_scope_key(PROVIDER, &[client_id, secret, scope]);

    let cached = cache
        .get_or_fetch(&scope_key, move || async move {
            let token: TokenResponse = request_token(
                PROVIDER,
                http.post(token_url)
                    .header("Authorization", basic_auth_header(client_id, secret))
                    .form(&[("grant_type", "client_credentials"), ("scope", scope)]),
            )
            .await?;
            debug!(
                client_id = %client_id,
                expires_in = token.expires_in,
                "Fetched Nuance access token"
            );
            Ok(FetchedCredential::expiring_in(
                ProviderCredential::bearer(PROVIDER, token.access_token),
                token.expires_in,
            ))
        })
        .await?;

    into_bearer(PROVIDER, cached)
}
