use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::errors::Result;

pub struct MokaCacheWrapper {
    inner: Cache<String, String>,
}

impl MokaCacheWrapper {
    pub fn new() -> Result<Self> {
        let config = AppConfig::get();
        Ok(Self::with_capacity(
            config.cache.memory.max_capacity,
            config.cache.default_ttl,
        ))
    }

    /// 按给定容量与 TTL（秒）构造
    pub fn with_capacity(max_capacity: u64, ttl: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl))
            .build();

        debug!("MokaCacheWrapper initialized with max capacity: {}", max_capacity);
        Self { inner }
    }
}

#[async_trait]
impl ObjectCache for MokaCacheWrapper {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        match self.inner.get(key).await {
            Some(value) => CacheResult::Found(value),
            None => CacheResult::NotFound,
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        // Moka 使用构造时的全局 TTL
        if ttl != 0 {
            debug!("Moka cache ignores per-item TTL, using global TTL configuration");
        }
        self.inner.insert(key, value).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let cache = MokaCacheWrapper::with_capacity(16, 60);
        assert_eq!(cache.get_raw("user:a").await, CacheResult::NotFound);

        cache
            .insert_raw("user:a".to_string(), "{\"id\":1}".to_string(), 0)
            .await;
        assert_eq!(
            cache.get_raw("user:a").await,
            CacheResult::Found("{\"id\":1}".to_string())
        );

        cache.remove("user:a").await;
        assert_eq!(cache.get_raw("user:a").await, CacheResult::NotFound);
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let cache: Box<dyn ObjectCache> = Box::new(MokaCacheWrapper::with_capacity(16, 60));
        cache.insert_json("k".to_string(), &vec![1, 2, 3], 0).await;
        assert_eq!(
            cache.get_json::<Vec<i32>>("k").await,
            CacheResult::Found(vec![1, 2, 3])
        );

        cache.insert_raw("bad".to_string(), "not json".to_string(), 0).await;
        assert_eq!(
            cache.get_json::<Vec<i32>>("bad").await,
            CacheResult::ExistsButNoValue
        );
    }
}
