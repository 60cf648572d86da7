//! AWS request signing and session credentials.

pub mod sigv4;
pub mod sts;

pub use sigv4::AwsSigner;
pub use sts::{SessionCredentials, session_credentials, sts_url};

/// Polly REST endpoint for a region.
pub fn polly_url(region: &str) -> String {
    format!("https://polly.{region}.amazonaws.com")
}
