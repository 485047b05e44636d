/// SeriesCache: keyed chart series cache with single-flight fetches
///
/// Serves hits synchronously, fetches misses at most once concurrently per
/// key, and only stores successful results so a failed key is re-attempted
/// by the next request. A fetch first resolves the subject's series start
/// boundary; that scalar is fetched once and reused for every key until
/// [`SeriesCache::invalidate_all`].
use crate::chart::singleflight::SingleFlight;
use crate::chart::types::{PeriodKey, SeriesEntry};
use crate::errors::FeedResult;
use crate::feed::SeriesSource;
use crate::logger::{self, LogTag};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub struct SeriesCache {
    source: Arc<dyn SeriesSource>,
    subject_uid: String,
    currency: String,
    entries: RwLock<HashMap<PeriodKey, SeriesEntry>>,
    start_time: RwLock<Option<i64>>,
    // Epoch guards stores against fetches that complete after an
    // invalidation: their result is returned but never cached.
    epoch: RwLock<u64>,
    series_flight: SingleFlight<PeriodKey, SeriesEntry>,
    start_flight: SingleFlight<(), i64>,
}

impl SeriesCache {
    pub fn new(source: Arc<dyn SeriesSource>, subject_uid: &str, currency: &str) -> Self {
        Self {
            source,
            subject_uid: subject_uid.to_string(),
            currency: currency.to_string(),
            entries: RwLock::new(HashMap::new()),
            start_time: RwLock::new(None),
            epoch: RwLock::new(0),
            series_flight: SingleFlight::new(),
            start_flight: SingleFlight::new(),
        }
    }

    pub fn subject_uid(&self) -> &str {
        &self.subject_uid
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Synchronous cache lookup; no side effects.
    pub fn get(&self, key: &PeriodKey) -> Option<SeriesEntry> {
        self.entries.read().get(key).cloned()
    }

    /// The resolved series start boundary, if fetched already.
    pub fn start_time(&self) -> Option<i64> {
        *self.start_time.read()
    }

    /// Return the cached entry for `key`, or fetch it.
    ///
    /// Cache misses resolve the start boundary first, then fetch the
    /// series; both are single-flight, so concurrent callers for the same
    /// key share one upstream call and its result. Only successes are
    /// stored.
    pub async fn fetch_or_load(&self, key: PeriodKey) -> FeedResult<SeriesEntry> {
        if let Some(entry) = self.get(&key) {
            logger::debug(LogTag::Cache, &format!("series hit for {:?}", key));
            return Ok(entry);
        }

        let epoch = *self.epoch.read();

        self.resolve_start_time(epoch).await?;

        logger::debug(LogTag::Cache, &format!("series miss for {:?}, fetching", key));

        let source = Arc::clone(&self.source);
        let subject = self.subject_uid.clone();
        let currency = self.currency.clone();
        let flight_key = key.clone();
        let entry = self
            .series_flight
            .run(key.clone(), async move {
                source.fetch_series(&subject, &currency, &flight_key).await
            })
            .await
            .map_err(|e| {
                logger::warning(
                    LogTag::Cache,
                    &format!("series fetch failed for {:?}: {}", key, e),
                );
                e
            })?;

        if *self.epoch.read() == epoch {
            self.entries
                .write()
                .entry(key)
                .or_insert_with(|| entry.clone());
        }

        Ok(entry)
    }

    /// Clear every entry and the start boundary.
    ///
    /// Used when the identity of the underlying subject changes. Fetches
    /// already in flight still complete for their callers, but their
    /// results are no longer stored.
    pub fn invalidate_all(&self) {
        {
            let mut epoch = self.epoch.write();
            *epoch += 1;
        }
        self.entries.write().clear();
        *self.start_time.write() = None;

        logger::info(
            LogTag::Cache,
            &format!("series cache invalidated for {}", self.subject_uid),
        );
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }

    async fn resolve_start_time(&self, epoch: u64) -> FeedResult<i64> {
        if let Some(start) = self.start_time() {
            return Ok(start);
        }

        let source = Arc::clone(&self.source);
        let subject = self.subject_uid.clone();
        let start = self
            .start_flight
            .run((), async move { source.series_start(&subject).await })
            .await?;

        if *self.epoch.read() == epoch {
            *self.start_time.write() = Some(start);
        }

        Ok(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::types::{ChartPoint, Interval};
    use crate::errors::FeedError;
    use crate::feed::testing::MockSeriesSource;
    use std::time::Duration;

    fn day_key() -> PeriodKey {
        PeriodKey::ByInterval(Interval::Day1)
    }

    fn week_key() -> PeriodKey {
        PeriodKey::ByInterval(Interval::Week1)
    }

    fn points(timestamps: &[i64]) -> Vec<ChartPoint> {
        timestamps
            .iter()
            .map(|&t| ChartPoint::new(t, t as f64 * 2.0))
            .collect()
    }

    fn cache_over(source: MockSeriesSource) -> SeriesCache {
        SeriesCache::new(Arc::new(source), "bitcoin", "USD")
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let cache = cache_over(
            MockSeriesSource::new(10).with_series(day_key(), 100, points(&[100, 200, 300])),
        );

        assert!(cache.get(&day_key()).is_none());

        let entry = cache.fetch_or_load(day_key()).await.unwrap();
        assert_eq!(entry.points.len(), 3);
        assert_eq!(cache.start_time(), Some(10));
        assert_eq!(cache.entry_count(), 1);

        // Hit path returns the stored entry
        assert_eq!(cache.get(&day_key()).unwrap(), entry);
    }

    #[tokio::test]
    async fn test_get_is_idempotent() {
        let cache = cache_over(
            MockSeriesSource::new(10).with_series(day_key(), 100, points(&[100, 200])),
        );

        cache.fetch_or_load(day_key()).await.unwrap();

        let first = cache.get(&day_key()).unwrap();
        let second = cache.get(&day_key()).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_hit_does_not_refetch() {
        let source = Arc::new(
            MockSeriesSource::new(10).with_series(day_key(), 100, points(&[100, 200, 300])),
        );
        let cache = SeriesCache::new(
            Arc::clone(&source) as Arc<dyn SeriesSource>,
            "bitcoin",
            "USD",
        );

        cache.fetch_or_load(day_key()).await.unwrap();
        cache.fetch_or_load(day_key()).await.unwrap();

        assert_eq!(source.series_calls(), 1);
        assert_eq!(cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_single_flight() {
        let source = Arc::new(
            MockSeriesSource::new(10)
                .with_series(day_key(), 100, points(&[100, 200, 300]))
                .with_series_delay(day_key(), Duration::from_millis(30)),
        );
        let cache = SeriesCache::new(
            Arc::clone(&source) as Arc<dyn SeriesSource>,
            "bitcoin",
            "USD",
        );

        let (a, b) = tokio::join!(
            cache.fetch_or_load(day_key()),
            cache.fetch_or_load(day_key())
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(source.series_calls(), 1);
        assert_eq!(source.start_calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_not_stored_and_retried() {
        let source = Arc::new(MockSeriesSource::new(10));
        let cache = SeriesCache::new(
            Arc::clone(&source) as Arc<dyn SeriesSource>,
            "bitcoin",
            "USD",
        );

        // No series configured: first attempt fails
        let err = cache.fetch_or_load(day_key()).await.unwrap_err();
        assert!(matches!(err, FeedError::Source(_)));
        assert_eq!(cache.entry_count(), 0);

        // Configure data; the retry must go upstream again and succeed
        source.set_series(day_key(), 100, points(&[100, 200]));
        let entry = cache.fetch_or_load(day_key()).await.unwrap();
        assert_eq!(entry.points.len(), 2);
        assert_eq!(source.series_calls(), 2);
    }

    #[tokio::test]
    async fn test_short_series_fails_not_enough_data() {
        let cache =
            cache_over(MockSeriesSource::new(10).with_series(day_key(), 100, points(&[100])));

        let err = cache.fetch_or_load(day_key()).await.unwrap_err();
        assert!(matches!(err, FeedError::NotEnoughData { .. }));
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_start_time_fetched_once_for_all_keys() {
        let source = Arc::new(
            MockSeriesSource::new(10)
                .with_series(day_key(), 100, points(&[100, 200]))
                .with_series(week_key(), 50, points(&[50, 150, 250])),
        );
        let cache = SeriesCache::new(
            Arc::clone(&source) as Arc<dyn SeriesSource>,
            "bitcoin",
            "USD",
        );

        cache.fetch_or_load(day_key()).await.unwrap();
        cache.fetch_or_load(week_key()).await.unwrap();

        assert_eq!(source.start_calls(), 1);
        assert_eq!(cache.entry_count(), 2);
    }

    #[tokio::test]
    async fn test_start_failure_fails_fetch_and_is_retried() {
        let source = Arc::new(MockSeriesSource::new(10));
        source.set_start(Err(FeedError::Source("start unavailable".to_string())));
        source.set_series(day_key(), 100, points(&[100, 200]));
        let cache = SeriesCache::new(
            Arc::clone(&source) as Arc<dyn SeriesSource>,
            "bitcoin",
            "USD",
        );

        let err = cache.fetch_or_load(day_key()).await.unwrap_err();
        assert_eq!(err, FeedError::Source("start unavailable".to_string()));
        assert_eq!(cache.start_time(), None);
        // Series fetch never started without the prerequisite
        assert_eq!(source.series_calls(), 0);

        source.set_start(Ok(25));
        cache.fetch_or_load(day_key()).await.unwrap();
        assert_eq!(cache.start_time(), Some(25));
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_everything() {
        let source = Arc::new(
            MockSeriesSource::new(10).with_series(day_key(), 100, points(&[100, 200])),
        );
        let cache = SeriesCache::new(
            Arc::clone(&source) as Arc<dyn SeriesSource>,
            "bitcoin",
            "USD",
        );

        cache.fetch_or_load(day_key()).await.unwrap();
        assert_eq!(cache.entry_count(), 1);

        cache.invalidate_all();
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.start_time(), None);
        assert!(cache.get(&day_key()).is_none());

        // Next request re-fetches both the boundary and the series
        cache.fetch_or_load(day_key()).await.unwrap();
        assert_eq!(source.start_calls(), 2);
        assert_eq!(source.series_calls(), 2);
    }

    #[tokio::test]
    async fn test_inflight_fetch_not_stored_after_invalidation() {
        let source = Arc::new(
            MockSeriesSource::new(10)
                .with_series(day_key(), 100, points(&[100, 200]))
                .with_series_delay(day_key(), Duration::from_millis(50)),
        );
        let cache = Arc::new(SeriesCache::new(
            Arc::clone(&source) as Arc<dyn SeriesSource>,
            "bitcoin",
            "USD",
        ));

        let fetching = Arc::clone(&cache);
        let handle = tokio::spawn(async move { fetching.fetch_or_load(day_key()).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.invalidate_all();

        // The caller still gets its result, but nothing is cached
        let entry = handle.await.unwrap().unwrap();
        assert_eq!(entry.points.len(), 2);
        assert_eq!(cache.entry_count(), 0);
    }
}
