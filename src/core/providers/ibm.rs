//! IBM Cloud IAM token exchange and Watson endpoints.

use serde::Deserialize;
use tracing::debug;

use super::{into_bearer, request_token};
use crate::core::credentials::{CredentialCache, FetchedCredential, ProviderCredential};
use crate::core::fingerprint::credential_scope_key;
use crate::errors::SynthResult;

const PROVIDER: &str = "ibm";

pub const IBM_IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Base URL of the Watson Text to Speech service in `region`.
pub fn watson_tts_url(region: &str) -> String {
    format!("https://api.{region}.text-to-speech.watson.cloud.ibm.com")
}

/// Exchanges an API key for an IAM access token, cache-aside.
pub async fn access_token(
    http: &reqwest::Client,
    cache: &CredentialCache,
    token_url: &str,
    api_key: &str,
) -> SynthResult<String> {
    let scope_key = credential_scope_key(PROVIDER, &[api_key]);

    let cached = cache
        .get_or_fetch(&scope_key, move || async move {
            let token: TokenResponse = request_token(
                PROVIDER,
                http.post(token_url)
                    .header("Accept", "application/json")
                    .form(&[
                        ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
                        ("apikey", api_key),
                    ]),
            )
            .await?;
            debug!(expires_in = token.expires_in, "Fetched IBM IAM token");
            Ok(FetchedCredential::expiring_in(
                ProviderCredential::bearer(PROVIDER, token.access_token),
                token.expires_in,
            ))
        })
        .await?;

    into_bearer(PROVIDER, cached)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watson_tts_url() {
        assert_eq!(
            watson_tts_url("us-south"),
            "https://api.us-south.text-to-speech.watson.cloud.ibm.com"
        );
    }
}
