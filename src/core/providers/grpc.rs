//! gRPC channel setup and status mapping for the gRPC-based providers.

use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, ClientTlsConfig};
use tracing::{debug, error};

use crate::errors::{SynthError, SynthResult};

/// Opens a channel to `endpoint`.
///
/// `https://` endpoints get TLS with the bundled web PKI roots; anything else
/// (on-premises deployments) connects in plaintext. Endpoints without a scheme
/// are treated as plaintext `host:port`.
pub async fn create_grpc_channel(provider: &str, endpoint: &str) -> SynthResult<Channel> {
    let uri = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    };

    let mut builder = Channel::from_shared(uri.clone()).map_err(|e| {
        error!(error = %e, endpoint = %endpoint, "Invalid gRPC endpoint");
        SynthError::Validation(format!("Invalid {provider} endpoint '{endpoint}': {e}"))
    })?;

    if uri.starts_with("https://") {
        builder = builder
            .tls_config(ClientTlsConfig::new().with_webpki_roots())
            .map_err(|e| {
                SynthError::provider(provider, format!("failed to configure TLS: {e}"))
            })?;
    }

    let channel = builder.connect().await.map_err(|e| {
        error!(error = %e, endpoint = %endpoint, "Failed to connect gRPC channel");
        SynthError::provider(provider, format!("failed to connect to '{endpoint}': {e}"))
    })?;

    debug!(vendor = %provider, endpoint = %endpoint, "Connected gRPC channel");
    Ok(channel)
}

/// Performs one unary call on `path` and returns the decoded response.
pub async fn unary<Req, Resp>(
    provider: &str,
    channel: Channel,
    path: &'static str,
    request: tonic::Request<Req>,
) -> SynthResult<Resp>
where
    Req: prost::Message + Send + Sync + 'static,
    Resp: prost::Message + Default + Send + Sync + 'static,
{
    let mut grpc = tonic::client::Grpc::new(channel);
    grpc.ready()
        .await
        .map_err(|e| SynthError::provider(provider, format!("service was not ready: {e}")))?;

    let codec: ProstCodec<Req, Resp> = ProstCodec::default();
    grpc.unary(request, PathAndQuery::from_static(path), codec)
        .await
        .map(tonic::Response::into_inner)
        .map_err(|status| status_error(provider, status))
}

/// Maps a gRPC status onto a provider error.
///
/// The gRPC code is reported in place of an HTTP status, and
/// authentication failures are surfaced as credential errors.
pub fn status_error(provider: &str, status: tonic::Status) -> SynthError {
    match status.code() {
        tonic::Code::Unauthenticated | tonic::Code::PermissionDenied => {
            SynthError::credential(provider, status.message().to_string())
        }
        code => SynthError::provider_status(
            provider,
            code as i32 as u16,
            status.message().to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        let err = status_error("nvidia", tonic::Status::unavailable("riva down"));
        assert_eq!(err.to_string(), "Synthesis failed for nvidia (14): riva down");

        let err = status_error("nuance", tonic::Status::unauthenticated("expired"));
        assert!(matches!(err, SynthError::Credential { .. }));
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_validation_error() {
        let err = create_grpc_channel("nvidia", "http://bad host:50051")
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
