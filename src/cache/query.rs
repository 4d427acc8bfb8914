//! Cached queries
//!
//! A [`QueryCache`] sits between services and repositories. Reads are served
//! from the cache while fresh and loaded otherwise; a failed load is logged,
//! left uncached, and surfaced as a [`QueryState`] carrying the neutral value
//! and an error message.

use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

use super::{CacheLayer, MemoryCache};

/// Outcome of a cached read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryState<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> QueryState<T> {
    pub fn ok(data: T) -> Self {
        Self { data, error: None }
    }

    /// Neutral value with an error message
    pub fn failed(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            data: T::default(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        QueryState {
            data: f(self.data),
            error: self.error,
        }
    }
}

/// Read-through cache for service queries
#[derive(Debug, Clone)]
pub struct QueryCache {
    inner: Arc<MemoryCache>,
}

impl QueryCache {
    pub fn new(inner: Arc<MemoryCache>) -> Self {
        Self { inner }
    }

    /// Return the cached value for `key`, or run `load` and cache its result
    ///
    /// Errors from `load` are returned and not cached. A cache read that
    /// cannot be decoded counts as a miss.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, load: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.inner.get::<T>(key).await {
            Ok(Some(hit)) => {
                tracing::trace!(key, "Cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(key, error = %e, "Discarding unreadable cache entry"),
        }

        let value = load().await?;
        if let Err(e) = self.inner.set(key, &value, self.inner.default_ttl()).await {
            tracing::warn!(key, error = %e, "Failed to cache query result");
        }
        Ok(value)
    }

    /// Like [`get_or_load`](Self::get_or_load), folding failures into a
    /// [`QueryState`] with the neutral value
    pub async fn query<T, F, Fut>(&self, key: &str, load: F) -> QueryState<T>
    where
        T: Serialize + DeserializeOwned + Default + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.get_or_load(key, load).await {
            Ok(data) => QueryState::ok(data),
            Err(e) => {
                tracing::error!(key, error = ?e, "Query failed");
                QueryState::failed(format!("Failed to load {}", key))
            }
        }
    }

    /// Drop every cached entry matching a glob pattern
    pub async fn invalidate(&self, pattern: &str) {
        tracing::debug!(pattern, "Invalidating cached queries");
        if let Err(e) = self.inner.delete_pattern(pattern).await {
            tracing::warn!(pattern, error = %e, "Cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn cache() -> QueryCache {
        QueryCache::new(Arc::new(MemoryCache::with_capacity_and_ttl(100, Duration::from_secs(60))))
    }

    #[tokio::test]
    async fn test_loads_once_within_window() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for _ in 0..3 {
            let value: Vec<i32> = cache
                .get_or_load("blog:list", || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = cache();

        let state: QueryState<Vec<i32>> = cache
            .query("events:list", || async { Err(anyhow::anyhow!("db down")) })
            .await;
        assert!(state.is_error());
        assert!(state.data.is_empty());

        let state: QueryState<Vec<i32>> = cache.query("events:list", || async { Ok(vec![7]) }).await;
        assert_eq!(state, QueryState::ok(vec![7]));
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let load = || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(1_i64)
        };

        cache.get_or_load("comments:post:1", load).await.unwrap();
        cache.invalidate("comments:post:1").await;
        cache.get_or_load("comments:post:1", load).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_state_serializes_error() {
        let state: QueryState<Vec<i32>> = QueryState::failed("boom");
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["data"], serde_json::json!([]));
        assert_eq!(json["error"], "boom");

        let ok = serde_json::to_value(QueryState::ok(3)).unwrap();
        assert!(ok.get("error").is_none());
    }
}
