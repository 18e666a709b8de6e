use std::sync::Arc;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::image::ImageId;
use crate::infra::cache::RedisCache;
use crate::infra::unsplash::{PhotoProvider, UpstreamError};

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 30;

/// Read-through proxy for the upstream photo API.
///
/// With a cache configured, responses are kept for `ttl_seconds`. Entries
/// are never invalidated, they only expire.
#[derive(Clone)]
pub struct PhotoService {
    provider: Arc<dyn PhotoProvider>,
    cache: Option<RedisCache>,
    ttl_seconds: u64,
}

impl PhotoService {
    pub fn new(provider: Arc<dyn PhotoProvider>, cache: Option<RedisCache>, ttl_seconds: u64) -> Self {
        Self {
            provider,
            cache,
            ttl_seconds,
        }
    }

    pub async fn list_photos(&self, page: u32, per_page: u32) -> Result<Value, UpstreamError> {
        let key = format!("photos:list:{}:{}", page, per_page);
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }
        let value = self.provider.list_photos(page, per_page).await?;
        self.store(&key, &value).await;
        Ok(value)
    }

    pub async fn search_photos(&self, query: &str, page: u32) -> Result<Value, UpstreamError> {
        let key = format!("photos:search:{}:{}", query_digest(query), page);
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }
        let value = self.provider.search_photos(query, page).await?;
        self.store(&key, &value).await;
        Ok(value)
    }

    pub async fn get_photo(&self, id: &ImageId) -> Result<Value, UpstreamError> {
        let key = format!("photos:details:{}", id);
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }
        let value = self.provider.get_photo(id).await?;
        self.store(&key, &value).await;
        Ok(value)
    }

    async fn cached(&self, key: &str) -> Option<Value> {
        let cache = self.cache.as_ref()?;
        match cache.get_json::<Value>(key).await {
            Ok(hit) => hit,
            Err(err) => {
                tracing::warn!(error = ?err, key, "photo cache read failed");
                None
            }
        }
    }

    async fn store(&self, key: &str, value: &Value) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if let Err(err) = cache.set_json(key, value, self.ttl_seconds).await {
            tracing::warn!(error = ?err, key, "photo cache write failed");
        }
    }
}

fn query_digest(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hex::encode(hasher.finalize())
}
