/// Record types for the transaction merge pipeline
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One merged-output unit: a transaction entry from a single source.
///
/// Records carry a stable unique identifier and a timestamp; the merge
/// order is timestamp descending with the uid as a deterministic tie-break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable unique identifier (e.g. a transaction hash)
    pub uid: String,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Identifier of the source that produced this record
    pub source: String,
    /// Transferred amount, when the source reports one
    pub amount: Option<f64>,
}

impl Record {
    pub fn new(uid: impl Into<String>, timestamp: i64, source: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            timestamp,
            source: source.into(),
            amount: None,
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Total order over records: newest first, ties broken by uid ascending.
    ///
    /// Stable across runs; duplicate uids from different sources compare
    /// equal and are both kept.
    pub fn compare(a: &Record, b: &Record) -> Ordering {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.uid.cmp(&b.uid))
    }
}
