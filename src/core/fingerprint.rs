//! Deterministic cache keys for synthesized audio and provider credentials.
//!
//! A synthesis fingerprint is `tts:<hex>` or `tts:<tenant>:<hex>`, where the
//! hex part is a SHA-256 digest over the identifying request fields. Keeping
//! the tenant outside the digest lets purges address one tenant with a prefix
//! scan (`tts:<tenant>:*`).
//!
//! The tenant segment is percent-encoded, so it never contains `:`, a glob
//! metacharacter or a path separator.

use std::borrow::Cow;

use sha2::{Digest, Sha256};

/// Namespace token shared by every synthesis cache entry.
pub const TTS_NAMESPACE: &str = "tts";

/// The identifying subset of a synthesis request.
///
/// Absent optional fields hash exactly like empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintFields<'a> {
    pub tenant: Option<&'a str>,
    pub provider: &'a str,
    pub language: Option<&'a str>,
    pub voice: Option<&'a str>,
    pub engine: Option<&'a str>,
    pub model: Option<&'a str>,
    pub text: &'a str,
    pub instructions: Option<&'a str>,
}

fn update_field(hasher: &mut Sha256, value: &str) {
    // Length prefix keeps field boundaries unambiguous
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

fn tenant_segment(tenant: Option<&str>) -> Option<Cow<'_, str>> {
    tenant.filter(|t| !t.is_empty()).map(urlencoding::encode)
}

/// Builds the cache key for a synthesis request.
pub fn make_synth_key(fields: &FingerprintFields<'_>) -> String {
    let mut hasher = Sha256::new();
    for value in [
        fields.language.unwrap_or(""),
        fields.provider,
        fields.voice.unwrap_or(""),
        fields.engine.unwrap_or(""),
        fields.model.unwrap_or(""),
        fields.text,
        fields.instructions.unwrap_or(""),
    ] {
        update_field(&mut hasher, value);
    }
    let digest = hex::encode(hasher.finalize());

    match tenant_segment(fields.tenant) {
        Some(tenant) => format!("{TTS_NAMESPACE}:{tenant}:{digest}"),
        None => format!("{TTS_NAMESPACE}:{digest}"),
    }
}

/// Key pattern matching every synthesis entry.
pub fn namespace_pattern() -> String {
    format!("{TTS_NAMESPACE}:*")
}

/// Key pattern matching one tenant's synthesis entries.
pub fn tenant_pattern(tenant: &str) -> String {
    format!("{TTS_NAMESPACE}:{}:*", urlencoding::encode(tenant))
}

/// Builds the cache key for a provider's session credential.
///
/// The secret material is digested, so raw keys never appear in the cache
/// key space.
pub fn credential_scope_key(provider: &str, secret_parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in secret_parts {
        update_field(&mut hasher, part);
    }
    format!("{provider}:{}", hex::encode(hasher.finalize()))
}

/// File name of the audio artifact for a fingerprint.
///
/// The optional salt keeps concurrent callers synthesizing identical text
/// from writing to the same file. It is percent-encoded so the name stays a
/// single path component.
pub fn artifact_file_name(key: &str, salt: Option<&str>, extension: &str) -> String {
    let stem = key
        .strip_prefix(TTS_NAMESPACE)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(key)
        .replace(':', "-");
    let salt = urlencoding::encode(salt.unwrap_or(""));
    format!("{TTS_NAMESPACE}-{salt}{stem}.{extension}")
}
