//! STS `GetSessionToken` exchange.
//!
//! Sessions are requested for one hour and cached ten minutes short of that,
//! so a session is never handed out right before it lapses.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::sigv4::{self, AwsSigner};
use crate::core::credentials::{
    CredentialCache, CredentialMaterial, FetchedCredential, ProviderCredential,
};
use crate::core::fingerprint::credential_scope_key;
use crate::core::providers::request_token;
use crate::errors::{SynthError, SynthResult};

const PROVIDER: &str = "aws";

pub const SESSION_DURATION_SECS: i64 = 3600;
/// Cache lifetime of a session.
pub const SESSION_CACHE_SECS: i64 = SESSION_DURATION_SECS - 600;

/// Regional STS endpoint.
pub fn sts_url(region: &str) -> String {
    format!("https://sts.{region}.amazonaws.com/")
}

/// Temporary credentials issued by STS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSessionTokenResult {
    credentials: StsCredentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSessionTokenResponse {
    get_session_token_result: GetSessionTokenResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StsEnvelope {
    get_session_token_response: GetSessionTokenResponse,
}

/// Returns session credentials for the long-lived key pair, cache-aside.
pub async fn session_credentials(
    http: &reqwest::Client,
    cache: &CredentialCache,
    endpoint: &str,
    access_key_id: &str,
    secret_access_key: &str,
    region: &str,
) -> SynthResult<SessionCredentials> {
    let scope_key = credential_scope_key(PROVIDER, &[access_key_id, secret_access_key]);

    let cached = cache
        .get_or_fetch(&scope_key, move || async move {
            let mut url = Url::parse(endpoint).map_err(|e| {
                SynthError::Validation(format!("Invalid STS endpoint '{endpoint}': {e}"))
            })?;
            url.query_pairs_mut()
                .append_pair("Action", "GetSessionToken")
                .append_pair("DurationSeconds", &SESSION_DURATION_SECS.to_string())
                .append_pair("Version", "2011-06-15");

            let signer = AwsSigner {
                access_key_id,
                secret_access_key,
                session_token: None,
                region,
                service: "sts",
            };
            let signed = signer.sign(
                "GET",
                &url,
                &[("accept", "application/json")],
                b"",
                chrono::Utc::now(),
            );
            let request = sigv4::apply(
                http.get(url.clone()).header("Accept", "application/json"),
                signed,
            );

            let envelope: StsEnvelope = request_token(PROVIDER, request).await?;
            let creds = envelope
                .get_session_token_response
                .get_session_token_result
                .credentials;
            debug!(access_key_id = %access_key_id, "Fetched STS session credentials");

            Ok(FetchedCredential {
                credential: ProviderCredential {
                    provider: PROVIDER.to_string(),
                    material: CredentialMaterial::SessionKeys {
                        access_key_id: creds.access_key_id,
                        secret_access_key: creds.secret_access_key,
                        session_token: creds.session_token,
                    },
                },
                ttl_secs: SESSION_CACHE_SECS,
            })
        })
        .await?;

    match cached.credential.material {
        CredentialMaterial::SessionKeys {
            access_key_id,
            secret_access_key,
            session_token,
        } => Ok(SessionCredentials {
            access_key_id,
            secret_access_key,
            session_token,
        }),
        CredentialMaterial::BearerToken { .. } => Err(SynthError::credential(
            PROVIDER,
            "cached credential is not a session key triple",
        )),
    }
}
