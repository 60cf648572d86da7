//! Verbio Speech Center token flow.
//!
//! Verbio reports an absolute expiry (`expiration_time`, epoch seconds)
//! rather than a lifetime.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{into_bearer, request_token};
use crate::core::credentials::{CredentialCache, FetchedCredential, ProviderCredential};
use crate::core::fingerprint::credential_scope_key;
use crate::errors::SynthResult;

const PROVIDER: &str = "verbio";

pub const VERBIO_TOKEN_URL: &str = "https://auth.speechcenter.verbio.com:444/api/v1/token";
pub const VERBIO_API_URL: &str = "https://us.rest.speechcenter.verbio.com/api/v1";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expiration_time: i64,
}

/// Returns a Verbio access token, cache-aside.
pub async fn access_token(
    http: &reqwest::Client,
    cache: &CredentialCache,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
) -> SynthResult<String> {
    let scope_key = credential_scope_key(PROVIDER, &[client_id, client_secret]);

    let cached = cache
        .get_or_fetch(&scope_key, move || async move {
            let token: TokenResponse = request_token(
                PROVIDER,
                http.post(token_url)
                    .header("User-Agent", "voxcache")
                    .json(&json!({
                        "client_id": client_id,
                        "client_secret": client_secret,
                    })),
            )
            .await?;
            let remaining = token.expiration_time - chrono::Utc::now().timestamp();
            debug!(client_id = %client_id, remaining, "Fetched Verbio access token");
            Ok(FetchedCredential::expiring_in(
                ProviderCredential::bearer(PROVIDER, token.access_token),
                remaining,
            ))
        })
        .await?;

    into_bearer(PROVIDER, cached)
}
