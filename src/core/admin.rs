//! Cache invalidation and size introspection.

use serde::Serialize;
use tracing::{error, info};

use crate::core::cache::KeyValueStore;
use crate::core::fingerprint::{make_synth_key, namespace_pattern, tenant_pattern};
use crate::core::synth::SynthesisRequest;
use crate::core::tts::{SpeechProvider, create_backend};

/// Which synthesis entries a purge removes.
#[derive(Debug, Clone)]
pub enum PurgeScope {
    All,
    Tenant(String),
    /// The single entry a request with these identifying fields maps to.
    One(Box<SynthesisRequest>),
}

impl PurgeScope {
    pub fn one(request: SynthesisRequest) -> Self {
        Self::One(Box::new(request))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeOutcome {
    pub purged_count: u64,
    /// Set when nothing matched a single-entry purge or the cache failed.
    pub error: Option<String>,
}

/// Key a request was cached under. Provider aliases are canonicalized and
/// provider defaults applied the same way the synthesizer does; unknown
/// providers are keyed verbatim.
fn key_for(request: &SynthesisRequest) -> String {
    match request.provider.parse::<SpeechProvider>() {
        Ok(provider) => {
            let mut normalized = request.clone();
            normalized.provider = provider.as_str().to_string();
            create_backend(provider).normalize(&mut normalized);
            make_synth_key(&normalized.fingerprint_fields())
        }
        Err(_) => make_synth_key(&request.fingerprint_fields()),
    }
}

/// Removes synthesis entries. Never fails; problems are reported in
/// [`PurgeOutcome::error`].
pub async fn purge(store: &dyn KeyValueStore, scope: &PurgeScope) -> PurgeOutcome {
    let result = match scope {
        PurgeScope::All => purge_pattern(store, &namespace_pattern()).await,
        PurgeScope::Tenant(tenant) => purge_pattern(store, &tenant_pattern(tenant)).await,
        PurgeScope::One(request) => {
            let key = key_for(request);
            store.del(&[key]).await
        }
    };

    let outcome = match result {
        Ok(0) if matches!(scope, PurgeScope::One(_)) => PurgeOutcome {
            purged_count: 0,
            error: Some("Specified item not found".to_string()),
        },
        Ok(count) => PurgeOutcome {
            purged_count: count,
            error: None,
        },
        Err(e) => {
            error!(error = %e, "Cache purge failed");
            PurgeOutcome {
                purged_count: 0,
                error: Some(e.to_string()),
            }
        }
    };

    info!(purged = outcome.purged_count, "Purged synthesis cache entries");
    outcome
}

async fn purge_pattern(
    store: &dyn KeyValueStore,
    pattern: &str,
) -> crate::core::cache::Result<u64> {
    let keys = store.keys(pattern).await?;
    if keys.is_empty() {
        return Ok(0);
    }
    store.del(&keys).await
}

/// Number of synthesis entries matching `pattern` (all entries by default).
pub async fn size(
    store: &dyn KeyValueStore,
    pattern: Option<&str>,
) -> crate::core::cache::Result<usize> {
    let pattern = pattern.map_or_else(namespace_pattern, str::to_string);
    Ok(store.keys(&pattern).await?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::MemoryKeyValueStore;
    use bytes::Bytes;
    use std::time::Duration;

    async fn seed(store: &MemoryKeyValueStore, key: &str) {
        store
            .set(key, Bytes::from_static(b"x"), Duration::from_secs(60))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_purge_tenant_keeps_others() {
        let store = MemoryKeyValueStore::default();
        seed(&store, "tts:acme:aaa").await;
        seed(&store, "tts:acme:bbb").await;
        seed(&store, "tts:other:ccc").await;
        seed(&store, "tts:ddd").await;

        let outcome = purge(&store, &PurgeScope::Tenant("acme".to_string())).await;
        assert_eq!(outcome.purged_count, 2);
        assert!(outcome.error.is_none());
        assert_eq!(size(&store, None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_purge_tenant_is_not_a_wildcard() {
        let store = MemoryKeyValueStore::default();
        seed(&store, "tts:acme:aaa").await;
        let nested = SynthesisRequest::new("aws", "Hello")
            .with_voice("Joanna")
            .with_tenant("a:b");
        let nested_key = make_synth_key(&nested.fingerprint_fields());
        seed(&store, &nested_key).await;

        for tenant in ["a*", "a", "?cme", "[a]*"] {
            let outcome = purge(&store, &PurgeScope::Tenant(tenant.to_string())).await;
            assert_eq!(outcome.purged_count, 0, "{tenant}");
        }
        assert_eq!(size(&store, None).await.unwrap(), 2);

        let outcome = purge(&store, &PurgeScope::Tenant("a:b".to_string())).await;
        assert_eq!(outcome.purged_count, 1);
        assert!(store.get(&nested_key).await.unwrap().is_none());
        assert!(store.get("tts:acme:aaa").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_all_leaves_credentials() {
        let store = MemoryKeyValueStore::default();
        seed(&store, "tts:aaa").await;
        seed(&store, "nuance:token").await;

        let outcome = purge(&store, &PurgeScope::All).await;
        assert_eq!(outcome.purged_count, 1);
        assert!(store.get("nuance:token").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_one_missing_reports_error() {
        let store = MemoryKeyValueStore::default();
        let request = SynthesisRequest::new("X", "not cached")
            .with_language("en-US")
            .with_voice("V9");
        let outcome = purge(&store, &PurgeScope::one(request)).await;
        assert_eq!(outcome.purged_count, 0);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_purge_one_canonicalizes_alias() {
        let store = MemoryKeyValueStore::default();
        let cached = SynthesisRequest::new("aws", "Hello").with_voice("Joanna");
        seed(&store, &make_synth_key(&cached.fingerprint_fields())).await;

        let alias = SynthesisRequest::new("polly", "Hello").with_voice("Joanna");
        let outcome = purge(&store, &PurgeScope::one(alias)).await;
        assert_eq!(outcome, PurgeOutcome { purged_count: 1, error: None });
    }

    #[tokio::test]
    async fn test_purge_one_applies_provider_defaults() {
        let store = MemoryKeyValueStore::default();
        let cached = SynthesisRequest::new("nuance", "Hello")
            .with_voice("Evan")
            .with_model("enhanced");
        seed(&store, &make_synth_key(&cached.fingerprint_fields())).await;

        let without_model = SynthesisRequest::new("nuance", "Hello").with_voice("Evan");
        let outcome = purge(&store, &PurgeScope::one(without_model)).await;
        assert_eq!(outcome.purged_count, 1);
    }

    #[tokio::test]
    async fn test_size_with_pattern() {
        let store = MemoryKeyValueStore::default();
        seed(&store, "tts:acme:aaa").await;
        seed(&store, "tts:bbb").await;
        assert_eq!(size(&store, Some("tts:acme:*")).await.unwrap(), 1);
        assert_eq!(size(&store, None).await.unwrap(), 2);
    }
}
