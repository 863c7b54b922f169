use crate::errors::Result;
use crate::fetch::FetchResponse;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub response: FetchResponse,
    pub stored_at: DateTime<Utc>,
}

/// Named, versioned response caches
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStorage: Send + Sync {
    async fn put(&self, cache_name: &str, url: &str, response: FetchResponse) -> Result<()>;

    /// Search every cache for `url`
    async fn lookup(&self, url: &str) -> Result<Option<CachedResponse>>;

    async fn cache_names(&self) -> Result<Vec<String>>;

    /// `false` if no cache had that name
    async fn delete(&self, cache_name: &str) -> Result<bool>;
}

/// In-process cache storage
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<BTreeMap<String, HashMap<String, CachedResponse>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, cache_name: &str) -> usize {
        self.caches
            .read()
            .await
            .get(cache_name)
            .map(|c| c.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn put(&self, cache_name: &str, url: &str, response: FetchResponse) -> Result<()> {
        let mut caches = self.caches.write().await;
        caches.entry(cache_name.to_string()).or_default().insert(
            url.to_string(),
            CachedResponse {
                response,
                stored_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn lookup(&self, url: &str) -> Result<Option<CachedResponse>> {
        let caches = self.caches.read().await;
        Ok(caches.values().find_map(|cache| cache.get(url).cloned()))
    }

    async fn cache_names(&self) -> Result<Vec<String>> {
        Ok(self.caches.read().await.keys().cloned().collect())
    }

    async fn delete(&self, cache_name: &str) -> Result<bool> {
        Ok(self.caches.write().await.remove(cache_name).is_some())
    }
}
