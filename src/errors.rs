use thiserror::Error;

/// Error taxonomy for feed and chart operations.
///
/// Errors are `Clone` so that every caller sharing a single in-flight fetch
/// can receive the same failure value. A superseded fetch generation is not
/// an error at all - its result is silently dropped and never surfaced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Upstream fetch failure: network, decode, or provider-reported.
    #[error("source error: {0}")]
    Source(String),

    /// A series came back, but below the minimum usable length.
    #[error("not enough data: got {count} points, need at least {min}")]
    NotEnoughData { count: usize, min: usize },

    /// The shared in-flight fetch this caller was waiting on went away
    /// without producing a result.
    #[error("shared fetch cancelled before completion")]
    Cancelled,
}

impl FeedError {
    /// Whether a fresh request for the same data could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Source(_) => true,
            FeedError::Cancelled => true,
            FeedError::NotEnoughData { .. } => false,
        }
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
