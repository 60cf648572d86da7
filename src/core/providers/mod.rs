//! Provider infrastructure shared by the synthesis backends.
//!
//! Session-credential clients (OAuth client credentials, IAM, STS, service
//! account exchange), request signing and gRPC channel setup live here; the
//! synthesis adapters in [`crate::core::tts`] build on them.

pub mod aws;
pub mod azure;
pub mod google;
pub mod grpc;
pub mod ibm;
pub mod nuance;
pub mod verbio;

use serde::de::DeserializeOwned;
use tracing::error;

use crate::core::credentials::CachedCredential;
use crate::errors::{SynthError, SynthResult};

pub use grpc::{create_grpc_channel, status_error};

/// Sends a token request and decodes the JSON response.
///
/// Every failure is reported as a credential error for `provider`.
pub(crate) async fn request_token<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> SynthResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| SynthError::credential(provider, format!("token request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(
            vendor = %provider,
            status = status.as_u16(),
            body = %body,
            "Token request rejected"
        );
        return Err(SynthError::credential(
            provider,
            format!("token endpoint returned {}", status.as_u16()),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| SynthError::credential(provider, format!("invalid token response: {e}")))
}

/// Extracts the bearer token from a cached credential.
pub(crate) fn into_bearer(provider: &str, cached: CachedCredential) -> SynthResult<String> {
    cached
        .credential
        .bearer_token()
        .map(str::to_string)
        .ok_or_else(|| SynthError::credential(provider, "cached credential is not a bearer token"))
}
