use crate::core::cache::CacheStore;
use crate::core::currency::{CurrencyCode, is_historical_pair};
use crate::core::error::{RateError, RateResult};
use crate::core::identity::Identity;
use crate::core::rates::{
    HistoricalRates, HistoricalSeries, LatestRateSource, LatestRates, RateTable, SeriesRateSource,
    Span,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_TTL_HOURS: i64 = 24;
pub const LATEST_COLLECTION: &str = "rates_cache";
pub const HISTORY_COLLECTION: &str = "rate_history";
const LATEST_KEY: &str = "latest";

/// Cache-first retrieval shared by every cached rate kind.
///
/// Read and decode failures count as a miss and write failures are only
/// logged: the cache never turns a successful fetch into an error.
pub struct CachedRetriever<T> {
    store: CacheStore<T>,
    ttl: Duration,
}

impl<T> CachedRetriever<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(store: CacheStore<T>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn store(&self) -> &CacheStore<T> {
        &self.store
    }

    /// Returns the cached payload for `key` when it is fresh and `accept`
    /// agrees, otherwise runs `fetch` and stores the result.
    pub async fn retrieve<A, F, Fut>(
        &self,
        key: &str,
        force_refresh: bool,
        accept: A,
        fetch: F,
    ) -> RateResult<T>
    where
        A: Fn(&T) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = RateResult<T>>,
    {
        if !force_refresh {
            match self.store.get(key).await {
                Ok(Some(entry)) if entry.is_expired(self.ttl, Utc::now()) => {
                    debug!("Cache expired for {}", key);
                }
                Ok(Some(entry)) if !accept(&entry.payload) => {
                    debug!("Cached value for {} rejected", key);
                }
                Ok(Some(entry)) => {
                    debug!("Cache hit for {}", key);
                    return Ok(entry.payload);
                }
                Ok(None) => debug!("Cache miss for {}", key),
                Err(e) => warn!("Cache read failed for {}, fetching: {:#}", key, e),
            }
        }

        let payload = fetch().await?;
        if let Err(e) = self.store.put(key, &payload).await {
            warn!("Cache write failed for {}: {:#}", key, e);
        }
        Ok(payload)
    }
}

/// Latest rates for the single active base. A cached table for another base
/// is a miss even when fresh.
pub struct LatestRatesCache {
    retriever: CachedRetriever<RateTable>,
    source: Arc<dyn LatestRateSource>,
}

impl LatestRatesCache {
    pub fn new(
        store: CacheStore<RateTable>,
        ttl: Duration,
        source: Arc<dyn LatestRateSource>,
    ) -> Self {
        Self {
            retriever: CachedRetriever::new(store, ttl),
            source,
        }
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        self.retriever.store().clear_all().await
    }
}

#[async_trait]
impl LatestRates for LatestRatesCache {
    async fn latest(&self, base: &CurrencyCode, force_refresh: bool) -> RateResult<RateTable> {
        if !base.is_live_supported() {
            return Err(RateError::UnsupportedBase(base.to_string()));
        }
        let requested = *base;
        self.retriever
            .retrieve(
                LATEST_KEY,
                force_refresh,
                |table: &RateTable| table.base == requested,
                || self.source.fetch_latest(base),
            )
            .await
    }
}

/// Historical series per user, keyed by base, target and span.
pub struct HistoricalRatesCache {
    retriever: CachedRetriever<HistoricalSeries>,
    source: Arc<dyn SeriesRateSource>,
    identity: Arc<dyn Identity>,
}

impl HistoricalRatesCache {
    pub fn new(
        store: CacheStore<HistoricalSeries>,
        ttl: Duration,
        source: Arc<dyn SeriesRateSource>,
        identity: Arc<dyn Identity>,
    ) -> Self {
        Self {
            retriever: CachedRetriever::new(store, ttl),
            source,
            identity,
        }
    }

    pub fn cache_key(user_id: &str, base: &CurrencyCode, target: &CurrencyCode, span: Span) -> String {
        format!("{}/{}_{}_{}", user_id, base, target, span)
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        self.retriever.store().clear_all().await
    }
}

#[async_trait]
impl HistoricalRates for HistoricalRatesCache {
    async fn series(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        span: Span,
        force_refresh: bool,
    ) -> RateResult<HistoricalSeries> {
        if !is_historical_pair(base, target) {
            return Err(RateError::UnsupportedCurrency {
                base: base.to_string(),
                target: target.to_string(),
            });
        }
        let user_id = self.identity.user_id().ok_or(RateError::NotAuthenticated)?;
        let key = Self::cache_key(&user_id, base, target, span);

        self.retriever
            .retrieve(
                &key,
                force_refresh,
                |_: &HistoricalSeries| true,
                || self.source.fetch_series(base, target, span),
            )
            .await
    }
}
