use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

use crate::services::cache::{CacheClient, CacheError, ValkeyClient};
use crate::services::identity::store::{IdentityStore, IdentityStoreError, UserRecord};

/// Read-through cache in front of another identity store.
///
/// Records live in the cache for at most `ttl`, which bounds how stale a
/// role change can be. Unknown subjects are never cached. Any cache failure
/// (backend down, undecodable entry) falls through to the inner store.
#[derive(Clone)]
pub struct CachedIdentityStore<C: CacheClient> {
    inner: Arc<dyn IdentityStore>,
    cache: Arc<C>,
    ttl: Duration,
    // Key prefix to avoid collisions across environments
    prefix: String,
}

impl CachedIdentityStore<ValkeyClient> {
    pub async fn valkey(
        inner: Arc<dyn IdentityStore>,
        valkey_url: &str,
        ttl: Duration,
    ) -> Result<Self, IdentityStoreError> {
        let client = ValkeyClient::new(valkey_url).await?;
        Ok(Self::new(inner, Arc::new(client), ttl))
    }
}

impl<C: CacheClient> CachedIdentityStore<C> {
    pub fn new(inner: Arc<dyn IdentityStore>, cache: Arc<C>, ttl: Duration) -> Self {
        Self {
            inner,
            cache,
            ttl,
            prefix: "identity:user".to_string(),
        }
    }

    pub fn key(&self, subject: &str) -> String {
        format!("{}:{}", self.prefix, subject)
    }

    /// Drop the cached record so the next lookup hits the inner store.
    pub async fn invalidate(&self, subject: &str) -> Result<(), IdentityStoreError> {
        self.cache.del(&self.key(subject)).await?;
        Ok(())
    }
}

#[async_trait]
impl<C: CacheClient> IdentityStore for CachedIdentityStore<C> {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn lookup(&self, subject: &str) -> Result<Option<UserRecord>, IdentityStoreError> {
        let key = self.key(subject);

        match self.cache.get_string(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<UserRecord>(&raw) {
                Ok(record) => return Ok(Some(record)),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "undecodable identity cache entry")
                }
            },
            Ok(None) => {}
            Err(err) => tracing::warn!(
                cache = self.cache.backend_name(),
                error = %err,
                "identity cache read failed"
            ),
        }

        let record = self.inner.lookup(subject).await?;

        if let Some(record) = &record {
            let stored = match serde_json::to_string(record) {
                Ok(raw) => self.cache.set_with_ttl(&key, &raw, self.ttl).await,
                Err(err) => Err(CacheError::InvalidValue(err.to_string())),
            };
            if let Err(err) = stored {
                tracing::warn!(
                    cache = self.cache.backend_name(),
                    error = %err,
                    "identity cache write failed"
                );
            }
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::CacheResult;
    use crate::services::identity::store::InMemoryIdentityStore;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct MemoryCache {
        entries: Arc<Mutex<HashMap<String, String>>>,
        down: bool,
    }

    #[async_trait]
    impl CacheClient for MemoryCache {
        fn backend_name(&self) -> &'static str {
            "memory-cache"
        }

        async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
            if self.down {
                return Err(CacheError::BackendConnection("down".into()));
            }
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set_with_ttl(&self, key: &str, value: &str, _ttl: Duration) -> CacheResult<()> {
            if self.down {
                return Err(CacheError::BackendConnection("down".into()));
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn del(&self, key: &str) -> CacheResult<u64> {
            Ok(self.entries.lock().unwrap().remove(key).map_or(0, |_| 1))
        }
    }

    /// Counts how often the backing store is consulted.
    struct CountingStore {
        inner: InMemoryIdentityStore,
        hits: AtomicUsize,
    }

    #[async_trait]
    impl IdentityStore for CountingStore {
        fn backend_name(&self) -> &'static str {
            "counting"
        }

        async fn lookup(&self, subject: &str) -> Result<Option<UserRecord>, IdentityStoreError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.inner.lookup(subject).await
        }
    }

    fn counting() -> Arc<CountingStore> {
        Arc::new(CountingStore {
            inner: InMemoryIdentityStore::new()
                .with_user("u1", UserRecord::new("Alice", ["admin"])),
            hits: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let inner = counting();
        let store = CachedIdentityStore::new(
            inner.clone(),
            Arc::new(MemoryCache::default()),
            Duration::from_secs(30),
        );

        let first = store.lookup("u1").await.unwrap();
        let second = store.lookup("u1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.unwrap().roles, vec!["admin".to_string()]);
        assert_eq!(inner.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_subjects_are_not_cached() {
        let inner = counting();
        let cache = Arc::new(MemoryCache::default());
        let store = CachedIdentityStore::new(inner.clone(), cache.clone(), Duration::from_secs(30));

        assert_eq!(store.lookup("ghost").await.unwrap(), None);
        assert_eq!(store.lookup("ghost").await.unwrap(), None);

        assert_eq!(inner.hits.load(Ordering::SeqCst), 2);
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cache_outage_falls_through_to_store() {
        let inner = counting();
        let cache = Arc::new(MemoryCache {
            down: true,
            ..Default::default()
        });
        let store = CachedIdentityStore::new(inner.clone(), cache, Duration::from_secs(30));

        assert!(store.lookup("u1").await.unwrap().is_some());
        assert!(store.lookup("u1").await.unwrap().is_some());
        assert_eq!(inner.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn corrupt_entry_is_ignored_and_invalidate_forces_reload() {
        let inner = counting();
        let cache = Arc::new(MemoryCache::default());
        let store = CachedIdentityStore::new(inner.clone(), cache.clone(), Duration::from_secs(30));

        cache
            .entries
            .lock()
            .unwrap()
            .insert(store.key("u1"), "not json".to_string());

        assert!(store.lookup("u1").await.unwrap().is_some());
        assert_eq!(inner.hits.load(Ordering::SeqCst), 1);

        store.invalidate("u1").await.unwrap();
        assert!(store.lookup("u1").await.unwrap().is_some());
        assert_eq!(inner.hits.load(Ordering::SeqCst), 2);
    }
}
