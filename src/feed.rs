//! Boundary traits for upstream collaborators
//!
//! Everything the engine consumes from the outside world sits behind one of
//! these traits: record sources, chart series providers, the live price
//! push, and the small key-value settings collaborator. Implementations own
//! their transport entirely; the engine only reads exposed state and awaits
//! the async operations.

use crate::chart::types::{LiveValue, PeriodKey, SeriesEntry};
use crate::errors::FeedResult;
use crate::pool::types::Record;
use crate::relay::Relay;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// One independent, independently-syncing producer of transaction records.
///
/// A feed owns its last-known item set exclusively; consumers observe it
/// through change notifications and `fetch_top`.
#[async_trait]
pub trait SourceFeed: Send + Sync {
    /// Stable identity of this feed (e.g. a blockchain uid)
    fn uid(&self) -> &str;

    /// Whether the feed is currently syncing against its upstream
    fn is_syncing(&self) -> bool;

    /// Fires when the syncing flag may have changed
    fn syncing_changed(&self) -> &Relay<bool>;

    /// Fires when the feed's whole item set must be re-fetched
    fn invalidated(&self) -> &Relay<()>;

    /// Fires when the feed's item set changed incrementally
    fn items_changed(&self) -> &Relay<()>;

    /// Fetch the `count` newest records this feed knows about
    async fn fetch_top(&self, count: usize) -> FeedResult<Vec<Record>>;
}

/// Provider of time-keyed chart series for one subject.
///
/// Implementations should assemble their result through
/// [`SeriesEntry::build`] so the minimum-length invariant is enforced in
/// one place.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Timestamp of the subject's earliest available data point.
    ///
    /// Resolved once per cache lifetime and reused for every series key.
    async fn series_start(&self, subject_uid: &str) -> FeedResult<i64>;

    /// Fetch the series for one query key
    async fn fetch_series(
        &self,
        subject_uid: &str,
        currency: &str,
        key: &PeriodKey,
    ) -> FeedResult<SeriesEntry>;
}

/// The live-push boundary: a continuously updated scalar per subject.
pub trait LiveValueSource: Send + Sync {
    /// Returns the last known value (if any) and a stream of updates.
    fn subscribe(
        &self,
        subject_uid: &str,
        currency: &str,
    ) -> (Option<LiveValue>, broadcast::Receiver<LiveValue>);
}

/// Persisted key-value collaborator for small settings.
///
/// Out of core scope; the engine only relies on this contract.
pub trait SettingsStore: Send + Sync {
    fn save(&self, key: &str, value: &str);
    fn load(&self, key: &str) -> Option<String>;
}

/// In-memory [`SettingsStore`], useful as a default and in tests.
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn save(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    fn load(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }
}
