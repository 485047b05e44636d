/// ChartService: period-keyed series fetching composed with a live price
///
/// Owns one fetch slot per service instance. Period changes, manual
/// refreshes and live-value pushes all funnel into a single observable
/// `FetchState<ChartItem>`: series data comes from the keyed cache (fetched
/// under a generation guard), the rate comes from the most recent live
/// push, and the composed item is republished whenever either side moves.
use crate::chart::cache::SeriesCache;
use crate::chart::intervals;
use crate::chart::slot::FetchSlot;
use crate::chart::types::{ChartItem, FetchState, Interval, LiveValue, PeriodKey, SeriesEntry};
use crate::feed::{LiveValueSource, SeriesSource, SettingsStore};
use crate::logger::{self, LogTag};
use crate::relay::Relay;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Settings key for the indicators-shown toggle
const INDICATORS_SHOWN_KEY: &str = "chart.indicators_shown";

#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub subject_uid: String,
    pub currency: String,
    pub default_interval: Interval,
}

impl ChartConfig {
    pub fn new(subject_uid: &str, currency: &str) -> Self {
        Self {
            subject_uid: subject_uid.to_string(),
            currency: currency.to_string(),
            default_interval: Interval::Day1,
        }
    }
}

pub struct ChartService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    cache: SeriesCache,
    prices: Arc<dyn LiveValueSource>,
    settings: Arc<dyn SettingsStore>,
    subject_uid: String,
    currency: String,
    slot: FetchSlot<ChartItem>,
    state: Mutex<ServiceState>,
    period_changed: Relay<PeriodKey>,
    intervals_updated: Relay<()>,
    indicators_changed: Relay<bool>,
}

struct ServiceState {
    period: PeriodKey,
    live: Option<LiveValue>,
    start_time: Option<i64>,
}

impl ChartService {
    pub fn new(
        series: Arc<dyn SeriesSource>,
        prices: Arc<dyn LiveValueSource>,
        settings: Arc<dyn SettingsStore>,
        config: ChartConfig,
    ) -> Self {
        let inner = Arc::new(ServiceInner {
            cache: SeriesCache::new(series, &config.subject_uid, &config.currency),
            prices,
            settings,
            subject_uid: config.subject_uid,
            currency: config.currency,
            slot: FetchSlot::new(),
            state: Mutex::new(ServiceState {
                period: PeriodKey::ByInterval(config.default_interval),
                live: None,
                start_time: None,
            }),
            period_changed: Relay::new(),
            intervals_updated: Relay::new(),
            indicators_changed: Relay::new(),
        });

        Self { inner }
    }

    /// Begin serving: capture the current live value, consume the push
    /// stream, and run the first fetch for the default period.
    pub fn start(&self) {
        let (initial, mut updates) = self
            .inner
            .prices
            .subscribe(&self.inner.subject_uid, &self.inner.currency);

        self.inner.state.lock().live = initial;

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(value) => {
                        inner.state.lock().live = Some(value);
                        inner.sync_state();
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        logger::warning(
                            LogTag::Price,
                            &format!("live stream lagged, skipped {} pushes", skipped),
                        );
                    }
                    Err(RecvError::Closed) => {
                        logger::debug(LogTag::Price, "live stream closed");
                        break;
                    }
                }
            }
        });

        logger::info(
            LogTag::Chart,
            &format!("chart service started for {}", self.inner.subject_uid),
        );

        self.inner.fetch();
    }

    /// Re-run the current period's fetch (e.g. pull-to-refresh). Failures
    /// are never retried automatically; this is the explicit retry path.
    pub fn refresh(&self) {
        self.inner.fetch();
    }

    /// Switch to a fixed interval window
    pub fn set_period(&self, interval: Interval) {
        self.inner.set_period_key(PeriodKey::ByInterval(interval));
    }

    /// Switch to the full history window, anchored at the series start
    /// boundary when it is known
    pub fn set_period_all(&self) {
        let start = self.inner.cache.start_time().unwrap_or(0);
        self.inner.set_period_key(PeriodKey::ByStartTime(start));
    }

    pub fn period(&self) -> PeriodKey {
        self.inner.state.lock().period.clone()
    }

    pub fn state(&self) -> FetchState<ChartItem> {
        self.inner.slot.state()
    }

    pub fn on_state_changed(&self) -> &Relay<FetchState<ChartItem>> {
        self.inner.slot.on_changed()
    }

    pub fn on_period_changed(&self) -> &Relay<PeriodKey> {
        &self.inner.period_changed
    }

    /// Fires when the series start boundary becomes known or changes
    pub fn on_intervals_updated(&self) -> &Relay<()> {
        &self.inner.intervals_updated
    }

    pub fn on_indicators_changed(&self) -> &Relay<bool> {
        &self.inner.indicators_changed
    }

    /// Intervals usable for this subject given its resolved start boundary
    pub fn valid_intervals(&self) -> Vec<Interval> {
        intervals::valid_intervals_now(self.inner.cache.start_time())
    }

    pub fn indicators_shown(&self) -> bool {
        self.inner.indicators_shown()
    }

    /// Toggle the persisted indicators flag and recompose the current item
    pub fn set_indicators_shown(&self, shown: bool) {
        self.inner
            .settings
            .save(INDICATORS_SHOWN_KEY, if shown { "true" } else { "false" });
        self.inner.indicators_changed.emit(&shown);
        self.inner.sync_state();
    }

    /// The underlying series cache; exposed for invalidation when the
    /// tracked subject changes identity.
    pub fn cache(&self) -> &SeriesCache {
        &self.inner.cache
    }
}

impl ServiceInner {
    fn set_period_key(self: &Arc<Self>, key: PeriodKey) {
        let changed = {
            let mut state = self.state.lock();
            if state.period != key {
                state.period = key.clone();
                true
            } else {
                false
            }
        };

        if changed {
            self.period_changed.emit(&key);
            self.fetch();
        }
    }

    /// Start a fetch for the current period under a fresh generation.
    ///
    /// The superseded generation keeps running; its outcome is discarded by
    /// the slot on completion.
    fn fetch(self: &Arc<Self>) {
        let period = self.state.lock().period.clone();
        let generation = self.slot.begin();

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let result = inner.cache.fetch_or_load(period.clone()).await;
            inner.note_start_time();

            match result {
                Ok(entry) => {
                    let live = inner.state.lock().live;
                    match live {
                        Some(live) => {
                            let item = inner.compose(entry, live);
                            inner
                                .slot
                                .finish(generation, FetchState::Completed(item));
                        }
                        None => {
                            // Stays Loading; the next live push completes
                            // the composition via sync_state.
                            logger::debug(
                                LogTag::Chart,
                                &format!("series ready for {:?}, awaiting live value", period),
                            );
                        }
                    }
                }
                Err(error) => {
                    if inner
                        .slot
                        .finish(generation, FetchState::Failed(error.clone()))
                    {
                        logger::warning(
                            LogTag::Chart,
                            &format!("fetch failed for {:?}: {}", period, error),
                        );
                    }
                }
            }
        });
    }

    /// Recompose and republish when a non-fetch input changed.
    ///
    /// Publishes only when both the entry for the current period and a live
    /// value exist; otherwise the slot state is left untouched.
    fn sync_state(&self) {
        let (period, live) = {
            let state = self.state.lock();
            (state.period.clone(), state.live)
        };

        let Some(live) = live else {
            return;
        };
        let Some(entry) = self.cache.get(&period) else {
            return;
        };

        let item = self.compose(entry, live);
        self.slot.apply(FetchState::Completed(item));
    }

    fn compose(&self, entry: SeriesEntry, live: LiveValue) -> ChartItem {
        ChartItem {
            subject_uid: self.subject_uid.clone(),
            rate: live.value,
            rate_diff_24h: live.diff_24h,
            rate_diff_1d: live.diff_1d,
            timestamp: live.timestamp,
            entry,
            indicators_shown: self.indicators_shown(),
        }
    }

    fn indicators_shown(&self) -> bool {
        self.settings
            .load(INDICATORS_SHOWN_KEY)
            .map(|value| value == "true")
            .unwrap_or(false)
    }

    /// Emit `intervals_updated` when the resolved start boundary changed
    fn note_start_time(&self) {
        let current = self.cache.start_time();
        let changed = {
            let mut state = self.state.lock();
            if state.start_time != current {
                state.start_time = current;
                true
            } else {
                false
            }
        };

        if changed {
            self.intervals_updated.emit(&());
        }
    }
}
