/// PoolGroup: N source feeds presented as one logical feed
///
/// Aggregates the syncing flags (logical OR with edge-triggered
/// re-emission), re-broadcasts member change notifications as a union, and
/// merges concurrent `fetch_top` results into a single ordered, capped
/// sequence.
use crate::errors::FeedResult;
use crate::feed::SourceFeed;
use crate::logger::{self, LogTag};
use crate::pool::types::Record;
use crate::relay::{Relay, Subscription};
use futures::future::try_join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

pub struct PoolGroup {
    inner: Arc<GroupInner>,
    // Member subscriptions; dropped with the group
    _subscriptions: Vec<Subscription<bool>>,
    _unit_subscriptions: Vec<Subscription<()>>,
}

struct GroupInner {
    feeds: Vec<Arc<dyn SourceFeed>>,
    syncing: AtomicBool,
    syncing_changed: Relay<bool>,
    invalidated: Relay<()>,
    items_changed: Relay<()>,
}

impl PoolGroup {
    pub fn new(feeds: Vec<Arc<dyn SourceFeed>>) -> Self {
        let inner = Arc::new(GroupInner {
            feeds,
            syncing: AtomicBool::new(false),
            syncing_changed: Relay::new(),
            invalidated: Relay::new(),
            items_changed: Relay::new(),
        });

        let mut subscriptions = Vec::new();
        let mut unit_subscriptions = Vec::new();

        // Callbacks hold weak back-references only; a pending notification
        // can never keep a dropped group alive.
        for feed in &inner.feeds {
            let weak: Weak<GroupInner> = Arc::downgrade(&inner);
            subscriptions.push(feed.syncing_changed().subscribe(move |_| {
                if let Some(inner) = weak.upgrade() {
                    inner.sync_state();
                }
            }));

            let weak = Arc::downgrade(&inner);
            unit_subscriptions.push(feed.invalidated().subscribe(move |_| {
                if let Some(inner) = weak.upgrade() {
                    inner.invalidated.emit(&());
                }
            }));

            let weak = Arc::downgrade(&inner);
            unit_subscriptions.push(feed.items_changed().subscribe(move |_| {
                if let Some(inner) = weak.upgrade() {
                    inner.items_changed.emit(&());
                }
            }));
        }

        inner.sync_state();

        Self {
            inner,
            _subscriptions: subscriptions,
            _unit_subscriptions: unit_subscriptions,
        }
    }

    /// True iff at least one member feed is syncing
    pub fn is_syncing(&self) -> bool {
        self.inner.syncing.load(Ordering::SeqCst)
    }

    /// Fires only on an edge change of the aggregated syncing flag
    pub fn syncing_changed(&self) -> &Relay<bool> {
        &self.inner.syncing_changed
    }

    /// Union of member invalidation notifications
    pub fn invalidated(&self) -> &Relay<()> {
        &self.inner.invalidated
    }

    /// Union of member item-change notifications
    pub fn items_changed(&self) -> &Relay<()> {
        &self.inner.items_changed
    }

    pub fn member_count(&self) -> usize {
        self.inner.feeds.len()
    }

    /// Concurrently fetch the top `count` records from every member and
    /// merge them into one ordered sequence capped at `count`.
    ///
    /// All-or-nothing: if any member fails, the whole merge fails; partial
    /// results are not returned. The output is deterministic for identical
    /// member outputs regardless of completion order.
    pub async fn fetch_top(&self, count: usize) -> FeedResult<Vec<Record>> {
        let fetches = self.inner.feeds.iter().map(|feed| feed.fetch_top(count));

        let per_feed = try_join_all(fetches).await.map_err(|e| {
            logger::warning(LogTag::Pool, &format!("merged fetch failed: {}", e));
            e
        })?;

        let mut merged: Vec<Record> = per_feed.into_iter().flatten().collect();
        merged.sort_by(Record::compare);
        merged.truncate(count);

        logger::debug(
            LogTag::Pool,
            &format!(
                "merged {} records from {} feeds (cap {})",
                merged.len(),
                self.inner.feeds.len(),
                count
            ),
        );

        Ok(merged)
    }
}

impl GroupInner {
    /// Recompute the aggregated syncing flag by scanning all members,
    /// short-circuiting on the first syncing one. Emits only on an edge.
    fn sync_state(&self) {
        let next = self.feeds.iter().any(|feed| feed.is_syncing());
        let previous = self.syncing.swap(next, Ordering::SeqCst);

        if previous != next {
            logger::debug(LogTag::Pool, &format!("aggregate syncing -> {}", next));
            self.syncing_changed.emit(&next);
        }
    }
}
