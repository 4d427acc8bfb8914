//! Cache layer
//!
//! Query results are cached in process (moka) for a short staleness window.
//! Services read through [`QueryCache`], which keys results by the arguments
//! of the query, never caches failures and invalidates by glob pattern after
//! mutations.
//!
//! # Usage
//!
//! ```rust,ignore
//! use latrouvaille::cache::{create_cache, QueryCache};
//! use latrouvaille::config::CacheConfig;
//!
//! let cache = QueryCache::new(create_cache(&CacheConfig::default()));
//! let posts = cache.query("blog:list", || repo.list_published()).await;
//! cache.invalidate("blog:*").await;
//! ```

pub mod memory;
pub mod query;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;
pub use query::{QueryCache, QueryState};

/// Cache layer trait
///
/// The methods are generic over the cached type, so this trait is not
/// object safe. Hold a concrete cache (`Arc<MemoryCache>`) instead.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

/// Create the query cache described by the configuration
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    tracing::debug!(
        ttl_seconds = config.ttl_seconds,
        max_capacity = config.max_capacity,
        "Creating in-memory query cache"
    );
    Arc::new(MemoryCache::with_capacity_and_ttl(config.max_capacity, ttl))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig::default();
        let cache = create_cache(&config);

        assert_eq!(cache.default_ttl(), Duration::from_secs(60));
        cache.set("key", &"value".to_string(), Duration::from_secs(60)).await.unwrap();
        let result: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(result, Some("value".to_string()));
    }

    #[tokio::test]
    async fn test_create_cache_with_custom_ttl() {
        let config = CacheConfig {
            ttl_seconds: 5,
            max_capacity: 10,
        };
        let cache = create_cache(&config);
        assert_eq!(cache.default_ttl(), Duration::from_secs(5));
    }
}
