// 缓存模块
// Redis 适配器，所有失败降级为未命中，绝不向调用方冒泡

pub mod keys;

use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct Cache {
    client: Arc<RedisClient>,
}

impl Cache {
    pub fn new(client: RedisClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// 读取并反序列化；连接、读取或解析失败一律视为未命中
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("cache unavailable, treating as miss: {}", e);
                return None;
            }
        };

        let raw: Option<String> = match conn.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("cache get failed for {}: {}", key, e);
                return None;
            }
        };

        let json = raw?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("cache entry for {} failed to deserialize: {}", key, e);
                None
            }
        }
    }

    /// 带 TTL 写入，尽力而为
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("cache value for {} failed to serialize: {}", key, e);
                return;
            }
        };

        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("cache unavailable, skipping set for {}: {}", key, e);
                return;
            }
        };

        let result: redis::RedisResult<()> = conn.set_ex(key, json, ttl_secs).await;
        if let Err(e) = result {
            tracing::warn!("cache set failed for {}: {}", key, e);
        }
    }

    /// 删除失效键，尽力而为
    pub async fn del(&self, cache_keys: &[String]) {
        if cache_keys.is_empty() {
            return;
        }

        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("cache unavailable, skipping invalidation: {}", e);
                return;
            }
        };

        let result: redis::RedisResult<()> = conn.del(cache_keys).await;
        if let Err(e) = result {
            tracing::warn!("cache invalidation failed for {:?}: {}", cache_keys, e);
        }
    }

    /// 连通性探测，供 /health 使用
    pub async fn ping(&self) -> bool {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(_) => return false,
        };

        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }
}
