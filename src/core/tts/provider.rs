//! Shared HTTP plumbing for REST-based backends.
//!
//! Adapters only build the provider-specific request (URL, headers, body);
//! sending it and mapping the response shape onto [`SynthError`] happens here.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::base::{SpeechProvider, SynthesizedAudio};
use crate::core::format::format_from_content_type;
use crate::errors::{SynthError, SynthResult};

/// Longest provider error body echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

async fn send_checked(
    provider: SpeechProvider,
    request: reqwest::RequestBuilder,
) -> SynthResult<reqwest::Response> {
    let response = request
        .send()
        .await
        .map_err(|e| SynthError::from_transport(provider.as_str(), e))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(vendor = %provider, status = status.as_u16(), "Provider rejected request");
    Err(SynthError::provider_status(
        provider.as_str(),
        status.as_u16(),
        truncate(body.trim()).to_string(),
    ))
}

async fn read_audio(provider: SpeechProvider, response: reqwest::Response) -> SynthResult<Bytes> {
    let audio = response
        .bytes()
        .await
        .map_err(|e| SynthError::from_transport(provider.as_str(), e))?;

    if audio.is_empty() {
        return Err(SynthError::provider(provider.as_str(), "empty audio response"));
    }

    debug!(vendor = %provider, bytes = audio.len(), "Received synthesized audio");
    Ok(audio)
}

/// Sends a request whose successful response body is raw audio in the
/// backend's fixed output format.
pub async fn send_audio_request(
    provider: SpeechProvider,
    request: reqwest::RequestBuilder,
) -> SynthResult<SynthesizedAudio> {
    let response = send_checked(provider, request).await?;
    Ok(SynthesizedAudio::new(read_audio(provider, response).await?))
}

/// Like [`send_audio_request`], but a content type naming a concrete PCM or
/// WAV format is reported back as a format override.
///
/// Only backends whose output format is chosen by the remote endpoint use
/// this.
pub async fn send_audio_request_with_content_type(
    provider: SpeechProvider,
    request: reqwest::RequestBuilder,
) -> SynthResult<SynthesizedAudio> {
    let response = send_checked(provider, request).await?;
    let format_override = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(format_from_content_type);

    Ok(SynthesizedAudio {
        audio: read_audio(provider, response).await?,
        format_override,
    })
}

/// Sends a request whose successful response body is JSON.
pub async fn send_json_request<T: DeserializeOwned>(
    provider: SpeechProvider,
    request: reqwest::RequestBuilder,
) -> SynthResult<T> {
    let response = send_checked(provider, request).await?;
    response.json::<T>().await.map_err(|e| {
        SynthError::provider(provider.as_str(), format!("unexpected response body: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_audio_request_success_with_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/speak"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/l16;rate=16000")
                    .set_body_bytes(vec![1u8, 2, 3, 4]),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let audio = send_audio_request_with_content_type(
            SpeechProvider::Custom,
            client.post(format!("{}/speak", server.uri())),
        )
        .await
        .unwrap();
        assert_eq!(audio.audio.as_ref(), &[1, 2, 3, 4]);
        assert_eq!(audio.format_override.unwrap().extension, "r16");
    }

    #[tokio::test]
    async fn test_fixed_format_audio_ignores_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/wav")
                    .set_body_bytes(b"RIFFdata".to_vec()),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let audio = send_audio_request(SpeechProvider::Verbio, client.post(server.uri()))
            .await
            .unwrap();
        assert_eq!(audio.audio.as_ref(), b"RIFFdata");
        assert!(audio.format_override.is_none());
    }

    #[tokio::test]
    async fn test_error_status_maps_to_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = send_audio_request(SpeechProvider::Deepgram, client.post(server.uri()))
            .await
            .unwrap_err();
        match err {
            SynthError::Provider {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, "deepgram");
                assert_eq!(status, Some(401));
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_audio_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = send_audio_request(SpeechProvider::WellSaid, client.post(server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, SynthError::Provider { status: None, .. }));
    }

    #[test]
    fn test_truncate() {
        let long = "x".repeat(MAX_ERROR_BODY + 10);
        assert_eq!(truncate(&long).len(), MAX_ERROR_BODY);
        assert_eq!(truncate("short"), "short");
    }
}
