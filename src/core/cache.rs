use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio_util::sync::CancellationToken;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::metrics;
use crate::domain::Profession;
use crate::salaries::currencies::CurrencyRate;
use crate::telegram::bot::BotIdentity;
use crate::telegram::reply::TelegramBotReplyData;

/// Keyed cache with an absolute time-to-live and single-flight population.
///
/// Concurrent misses on one key run the loader once; every other caller waits
/// for that result. A loader that fails or is cancelled leaves the key absent.
#[derive(Clone)]
pub struct TtlCache<V> {
    name: &'static str,
    inner: Cache<String, V>,
    ttl: Duration,
    stats: Arc<CacheStats>,
}

#[derive(Debug, Default)]
struct CacheStats {
    requests: AtomicU64,
    populations: AtomicU64,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, ttl: Duration, max_capacity: u64) -> Self {
        let inner = Cache::builder().max_capacity(max_capacity).time_to_live(ttl).build();

        Self {
            name,
            inner,
            ttl,
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value for `key`, or runs `populate` and stores its
    /// result.
    ///
    /// # Errors
    /// * the loader's error, shared with every caller that waited on it
    /// * [`AppError::Cancelled`] when `cancel` fires first; nothing is stored
    pub async fn get_or_try_populate<F>(&self, key: &str, cancel: &CancellationToken, populate: F) -> AppResult<V>
    where
        F: Future<Output = AppResult<V>> + Send,
    {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        self.stats.requests.fetch_add(1, Ordering::Relaxed);

        let stats = Arc::clone(&self.stats);
        let name = self.name;
        let owned_key = key.to_string();
        let init = async move {
            stats.populations.fetch_add(1, Ordering::Relaxed);
            metrics::CACHE_POPULATIONS_TOTAL.with_label_values(&[name]).inc();
            log::debug!("Cache miss in {} for key {}", name, owned_key);
            populate.await
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                log::debug!("Cache population in {} cancelled for key {}", self.name, key);
                Err(AppError::Cancelled)
            }
            result = self.inner.try_get_with(key.to_string(), init) => result.map_err(AppError::from),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key).await
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Number of calls to [`TtlCache::get_or_try_populate`]
    pub fn requests(&self) -> u64 {
        self.stats.requests.load(Ordering::Relaxed)
    }

    /// Number of loader runs, i.e. coalesced misses
    pub fn populations(&self) -> u64 {
        self.stats.populations.load(Ordering::Relaxed)
    }
}

/// Every process-wide cache, built once at startup and handed to the services
/// that read them.
#[derive(Clone)]
pub struct AppCaches {
    pub currencies: TtlCache<Arc<Vec<CurrencyRate>>>,
    pub bot_replies: TtlCache<Arc<TelegramBotReplyData>>,
    pub bot_identity: TtlCache<Arc<BotIdentity>>,
    pub professions: TtlCache<Arc<Vec<Profession>>>,
}

impl AppCaches {
    pub fn new() -> Self {
        Self {
            currencies: TtlCache::new("currencies", config::cache::currencies_ttl(), 1),
            bot_replies: TtlCache::new(
                "bot_replies",
                config::cache::bot_reply_ttl(),
                config::cache::BOT_REPLY_CAPACITY,
            ),
            bot_identity: TtlCache::new("bot_identity", config::cache::bot_identity_ttl(), 1),
            professions: TtlCache::new("professions", config::cache::professions_ttl(), 1),
        }
    }
}

impl Default for AppCaches {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn cache() -> TtlCache<Arc<String>> {
        TtlCache::new("test", Duration::from_secs(60), 16)
    }

    #[tokio::test]
    async fn test_concurrent_misses_populate_once() {
        let cache = cache();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let cache = cache.clone();
                let cancel = cancel.clone();
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_try_populate("key", &cancel, async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok(Arc::new("value".to_string()))
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            let value = task.await.unwrap().unwrap();
            assert_eq!(value.as_str(), "value");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.populations(), 1);
        assert_eq!(cache.requests(), 10);
    }

    #[tokio::test]
    async fn test_failed_population_is_not_stored() {
        let cache = cache();
        let cancel = CancellationToken::new();

        let err = cache
            .get_or_try_populate("key", &cancel, async { Err(AppError::Validation("boom".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(cache.get("key").await.is_none());

        let value = cache
            .get_or_try_populate("key", &cancel, async { Ok(Arc::new("second".to_string())) })
            .await
            .unwrap();
        assert_eq!(value.as_str(), "second");
        assert_eq!(cache.populations(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_population_leaves_key_absent() {
        let cache = cache();
        let cancel = CancellationToken::new();

        let pending = {
            let cache = cache.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                cache
                    .get_or_try_populate("key", &cancel, async {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok(Arc::new("never".to_string()))
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let err = pending.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert!(cache.get("key").await.is_none());

        let fresh = CancellationToken::new();
        let value = cache
            .get_or_try_populate("key", &fresh, async { Ok(Arc::new("ready".to_string())) })
            .await
            .unwrap();
        assert_eq!(value.as_str(), "ready");
    }

    #[tokio::test]
    async fn test_already_cancelled_token_skips_loader() {
        let cache = cache();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = cache
            .get_or_try_populate("key", &cancel, async { Ok(Arc::new("value".to_string())) })
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(cache.populations(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_forces_repopulation() {
        let cache = cache();
        let cancel = CancellationToken::new();

        cache
            .get_or_try_populate("key", &cancel, async { Ok(Arc::new("one".to_string())) })
            .await
            .unwrap();
        cache.invalidate("key").await;
        let value = cache
            .get_or_try_populate("key", &cancel, async { Ok(Arc::new("two".to_string())) })
            .await
            .unwrap();

        assert_eq!(value.as_str(), "two");
    }
}
