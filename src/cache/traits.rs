use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    /// 后端可达但读取失败（连接中断、反序列化失败等）
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;

    /// `ttl` 为 0 时使用后端默认 TTL
    async fn insert_raw(&self, key: String, value: String, ttl: u64);

    async fn remove(&self, key: &str);

    async fn invalidate_all(&self);
}

impl dyn ObjectCache {
    /// 读取并反序列化
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> CacheResult<T> {
        match self.get_raw(key).await {
            CacheResult::Found(json) => match serde_json::from_str::<T>(&json) {
                Ok(value) => CacheResult::Found(value),
                Err(e) => {
                    tracing::debug!("Failed to deserialize cached value for {}: {}", key, e);
                    CacheResult::ExistsButNoValue
                }
            },
            CacheResult::NotFound => CacheResult::NotFound,
            CacheResult::ExistsButNoValue => CacheResult::ExistsButNoValue,
        }
    }

    /// 序列化并写入
    pub async fn insert_json<T: Serialize>(&self, key: String, value: &T, ttl: u64) {
        match serde_json::to_string(value) {
            Ok(json) => self.insert_raw(key, json, ttl).await,
            Err(e) => tracing::error!("Failed to serialize value for cache key {}: {}", key, e),
        }
    }
}
