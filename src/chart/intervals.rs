/// Interval availability derived from a subject's series start boundary
use crate::chart::types::Interval;
use chrono::Utc;

/// Intervals that make sense for a subject whose data starts at
/// `start_time`.
///
/// An interval is offered once the subject has existed for its full span;
/// the shortest interval is always offered so a freshly listed subject
/// still has a chart. With no resolved boundary only the shortest interval
/// is offered.
pub fn valid_intervals(start_time: Option<i64>, now: i64) -> Vec<Interval> {
    let Some(start_time) = start_time else {
        return vec![Interval::Day1];
    };

    let age = now.saturating_sub(start_time);
    let mut intervals: Vec<Interval> = Interval::all()
        .iter()
        .copied()
        .filter(|interval| interval.span_seconds() <= age)
        .collect();

    if intervals.is_empty() {
        intervals.push(Interval::Day1);
    }

    intervals
}

/// [`valid_intervals`] against the current wall clock
pub fn valid_intervals_now(start_time: Option<i64>) -> Vec<Interval> {
    valid_intervals(start_time, Utc::now().timestamp())
}
