/// Core types for the chart series pipeline
use crate::errors::{FeedError, FeedResult};
use serde::{Deserialize, Serialize};

/// Minimum number of points a series needs to be usable
pub const MIN_SERIES_POINTS: usize = 2;

/// One point of a chart series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Unix timestamp in seconds
    pub timestamp: i64,
    pub value: f64,
    pub volume: Option<f64>,
}

impl ChartPoint {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self {
            timestamp,
            value,
            volume: None,
        }
    }
}

/// Fixed chart window lengths offered to the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    Day1,
    Week1,
    Week2,
    Month1,
    Month3,
    Month6,
    Year1,
    Year2,
    Year5,
}

impl Interval {
    /// Window length in seconds
    pub const fn span_seconds(&self) -> i64 {
        const DAY: i64 = 86_400;
        match self {
            Interval::Day1 => DAY,
            Interval::Week1 => 7 * DAY,
            Interval::Week2 => 14 * DAY,
            Interval::Month1 => 30 * DAY,
            Interval::Month3 => 90 * DAY,
            Interval::Month6 => 180 * DAY,
            Interval::Year1 => 365 * DAY,
            Interval::Year2 => 2 * 365 * DAY,
            Interval::Year5 => 5 * 365 * DAY,
        }
    }

    /// All intervals, shortest first
    pub fn all() -> &'static [Interval] {
        &[
            Interval::Day1,
            Interval::Week1,
            Interval::Week2,
            Interval::Month1,
            Interval::Month3,
            Interval::Month6,
            Interval::Year1,
            Interval::Year2,
            Interval::Year5,
        ]
    }
}

/// Query key for one chart series request.
///
/// Keys are compared by value; a cache must treat two equal keys as the
/// same logical query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodKey {
    /// A fixed window ending now
    ByInterval(Interval),
    /// Everything since the subject's first known data point
    ByStartTime(i64),
}

/// One cached chart series: immutable once stored.
///
/// `first_point` is the earliest point at or after the series' reported
/// start boundary, `last_point` the newest point.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEntry {
    pub key: PeriodKey,
    pub points: Vec<ChartPoint>,
    pub first_point: ChartPoint,
    pub last_point: ChartPoint,
}

impl SeriesEntry {
    /// Validate a fetched series and assemble the cache entry.
    ///
    /// Fails with `NotEnoughData` when fewer than [`MIN_SERIES_POINTS`]
    /// points came back, or when no point lies at or after
    /// `from_timestamp`.
    pub fn build(key: PeriodKey, from_timestamp: i64, points: Vec<ChartPoint>) -> FeedResult<Self> {
        if points.len() < MIN_SERIES_POINTS {
            return Err(FeedError::NotEnoughData {
                count: points.len(),
                min: MIN_SERIES_POINTS,
            });
        }

        let first_point = points
            .iter()
            .find(|p| p.timestamp >= from_timestamp)
            .copied()
            .ok_or(FeedError::NotEnoughData {
                count: 0,
                min: MIN_SERIES_POINTS,
            })?;

        // len >= MIN_SERIES_POINTS, so last() exists
        let last_point = *points.last().ok_or(FeedError::NotEnoughData {
            count: 0,
            min: MIN_SERIES_POINTS,
        })?;

        Ok(Self {
            key,
            points,
            first_point,
            last_point,
        })
    }
}

/// The continuously pushed live scalar: current price plus daily diffs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveValue {
    pub value: f64,
    pub diff_24h: Option<f64>,
    pub diff_1d: Option<f64>,
    /// Unix timestamp of the push
    pub timestamp: i64,
}

/// The composed chart view: cached series plus the latest live value
#[derive(Debug, Clone, PartialEq)]
pub struct ChartItem {
    pub subject_uid: String,
    pub rate: f64,
    pub rate_diff_24h: Option<f64>,
    pub rate_diff_1d: Option<f64>,
    /// Timestamp of the live value the item was composed with
    pub timestamp: i64,
    pub entry: SeriesEntry,
    pub indicators_shown: bool,
}

/// Observable state of one logical fetch slot.
///
/// `Idle` is the only initial state. `Completed` and `Failed` are not
/// terminal: a fresh request always re-enters `Loading`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Completed(T),
    Failed(FeedError),
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchState::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FeedError> {
        match self {
            FetchState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> FetchState<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            FetchState::Idle => FetchState::Idle,
            FetchState::Loading => FetchState::Loading,
            FetchState::Completed(value) => FetchState::Completed(f(value)),
            FetchState::Failed(err) => FetchState::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(timestamps: &[i64]) -> Vec<ChartPoint> {
        timestamps
            .iter()
            .map(|&t| ChartPoint::new(t, t as f64))
            .collect()
    }

    #[test]
    fn test_build_entry() {
        let entry = SeriesEntry::build(
            PeriodKey::ByInterval(Interval::Day1),
            100,
            points(&[50, 100, 150, 200]),
        )
        .unwrap();

        assert_eq!(entry.first_point.timestamp, 100);
        assert_eq!(entry.last_point.timestamp, 200);
        assert_eq!(entry.points.len(), 4);
    }

    #[test]
    fn test_build_rejects_short_series() {
        let err = SeriesEntry::build(
            PeriodKey::ByInterval(Interval::Day1),
            0,
            points(&[100]),
        )
        .unwrap_err();

        assert_eq!(err, FeedError::NotEnoughData { count: 1, min: 2 });
    }

    #[test]
    fn test_build_rejects_series_entirely_before_boundary() {
        let err = SeriesEntry::build(
            PeriodKey::ByInterval(Interval::Week1),
            1_000,
            points(&[100, 200, 300]),
        )
        .unwrap_err();

        assert!(matches!(err, FeedError::NotEnoughData { .. }));
    }

    #[test]
    fn test_fetch_state_map() {
        let state: FetchState<u32> = FetchState::Completed(2);
        assert_eq!(state.map(|v| v * 2), FetchState::Completed(4));

        let failed: FetchState<u32> = FetchState::Failed(FeedError::Cancelled);
        assert_eq!(failed.map(|v| v * 2), FetchState::Failed(FeedError::Cancelled));
    }
}
