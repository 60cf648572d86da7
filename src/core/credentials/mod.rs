//! Cache-aside store for short-lived provider session credentials.
//!
//! Scope keys come from [`credential_scope_key`](crate::core::fingerprint::credential_scope_key)
//! so raw secrets never reach the cache key space. A fetched credential is
//! cached for the provider-declared validity minus a safety margin; when that
//! remaining validity is not positive the credential is handed back without
//! being stored, and the next call fetches again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::cache::KeyValueStore;
use crate::errors::SynthResult;

/// Seconds subtracted from every provider-declared expiry.
pub const CREDENTIAL_SAFETY_MARGIN_SECS: i64 = 30;

/// Flattened key material of a session credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialMaterial {
    /// Temporary access key triple (AWS STS).
    SessionKeys {
        access_key_id: String,
        secret_access_key: String,
        session_token: String,
    },
    /// Opaque bearer token (OAuth, IAM, service account exchange).
    BearerToken { token: String },
}

/// A session credential owned by one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredential {
    pub provider: String,
    pub material: CredentialMaterial,
}

impl ProviderCredential {
    pub fn bearer(provider: &str, token: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            material: CredentialMaterial::BearerToken {
                token: token.into(),
            },
        }
    }

    /// The bearer token, if this credential carries one.
    pub fn bearer_token(&self) -> Option<&str> {
        match &self.material {
            CredentialMaterial::BearerToken { token } => Some(token),
            CredentialMaterial::SessionKeys { .. } => None,
        }
    }
}

/// Result of an upstream authentication round trip.
#[derive(Debug, Clone)]
pub struct FetchedCredential {
    pub credential: ProviderCredential,
    /// Remaining validity in seconds, already reduced by the safety margin.
    pub ttl_secs: i64,
}

impl FetchedCredential {
    /// Builds a fetched credential from a provider-declared lifetime.
    pub fn expiring_in(credential: ProviderCredential, declared_secs: i64) -> Self {
        Self {
            credential,
            ttl_secs: declared_secs - CREDENTIAL_SAFETY_MARGIN_SECS,
        }
    }
}

/// Credential handed back to adapters.
#[derive(Debug, Clone)]
pub struct CachedCredential {
    pub credential: ProviderCredential,
    pub served_from_cache: bool,
}

/// Cache-aside credential store shared by all adapters.
#[derive(Clone)]
pub struct CredentialCache {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the cached credential for `scope_key`, or runs `fetch` and
    /// caches its result.
    ///
    /// Cache read failures degrade to a fetch and write failures are logged;
    /// only `fetch` errors reach the caller.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        scope_key: &str,
        fetch: F,
    ) -> SynthResult<CachedCredential>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SynthResult<FetchedCredential>>,
    {
        match self.store.get(scope_key).await {
            Ok(Some(raw)) => match serde_json::from_slice::<ProviderCredential>(&raw) {
                Ok(credential) => {
                    debug!(scope = %scope_key, "Credential served from cache");
                    return Ok(CachedCredential {
                        credential,
                        served_from_cache: true,
                    });
                }
                Err(e) => {
                    warn!(scope = %scope_key, error = %e, "Discarding unreadable cached credential")
                }
            },
            Ok(None) => {}
            Err(e) => warn!(scope = %scope_key, error = %e, "Credential cache read failed"),
        }

        let fetched = fetch().await?;

        if fetched.ttl_secs > 0 {
            match serde_json::to_vec(&fetched.credential) {
                Ok(encoded) => {
                    let ttl = Duration::from_secs(fetched.ttl_secs as u64);
                    if let Err(e) = self.store.set(scope_key, Bytes::from(encoded), ttl).await {
                        warn!(scope = %scope_key, error = %e, "Credential cache write failed");
                    }
                }
                Err(e) => warn!(scope = %scope_key, error = %e, "Failed to encode credential"),
            }
        } else {
            debug!(
                scope = %scope_key,
                ttl_secs = fetched.ttl_secs,
                "Credential expires too soon to cache"
            );
        }

        Ok(CachedCredential {
            credential: fetched.credential,
            served_from_cache: false,
        })
    }
}
