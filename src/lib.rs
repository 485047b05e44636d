//! Asynchronous multi-source record aggregation and keyed chart fetching.
//!
//! Two engines built on the same observation primitives:
//!
//! - [`pool::PoolGroup`] merges transaction records from independent source
//!   feeds into one newest-first view with a combined syncing flag.
//! - [`chart::ChartService`] fetches period-keyed chart series through a
//!   deduplicating cache and composes them with a live price push into one
//!   observable fetch state.

pub mod chart;
pub mod errors;
pub mod feed;
pub mod logger;
pub mod pool;
pub mod relay;

pub use chart::{ChartConfig, ChartService, FetchState, Interval, PeriodKey};
pub use errors::{FeedError, FeedResult};
pub use feed::{LiveValueSource, SeriesSource, SettingsStore, SourceFeed};
pub use pool::{PoolGroup, Record};
pub use relay::{Relay, Subscription};
