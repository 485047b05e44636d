//! Keyed chart series fetching, caching, and live composition

pub mod cache;
pub mod intervals;
pub mod service;
pub mod singleflight;
pub mod slot;
pub mod types;

pub use cache::SeriesCache;
pub use service::{ChartConfig, ChartService};
pub use slot::{FetchSlot, Generation};
pub use types::{
    ChartItem, ChartPoint, FetchState, Interval, LiveValue, PeriodKey, SeriesEntry,
    MIN_SERIES_POINTS,
};
