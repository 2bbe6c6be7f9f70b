//! Core metric types shared by the parser, the store and the flush engine.

/// One parsed metric event, produced by the parser and consumed exactly once
/// by [`crate::store::SharedStore::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    /// Series name (dots and dashes allowed, `:` is not).
    pub bucket: String,
    pub payload: MetricPayload,
    /// Sampling rate in `(0, 1]`. Only meaningful for counters: a rate below
    /// one inflates the recorded delta to estimate the true event count.
    pub sampling: f64,
}

/// The value of a metric event together with its aggregation semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricPayload {
    /// Signed delta added to the bucket's running total.
    Counter(i64),
    /// Absolute reading; last write wins.
    Gauge(u64),
    /// One sample appended to the bucket's distribution.
    Timer(u64),
}

/// A percentile threshold for timer statistics.
///
/// Positive thresholds report the upper bound of the lowest `p`% of samples
/// (`<bucket>.upper_<label>`); negative thresholds report the lower bound of
/// the highest `|p|`% (`<bucket>.lower_<label>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Percentile {
    threshold: i32,
    label: String,
}

impl Percentile {
    /// Returns `None` for zero or for values outside `(-100, 100)`.
    pub fn new(threshold: i32) -> Option<Percentile> {
        if threshold == 0 || threshold <= -100 || threshold >= 100 {
            return None;
        }
        Some(Percentile {
            threshold,
            label: threshold.unsigned_abs().to_string(),
        })
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    /// Unsigned decimal rendering of the threshold, used in the stat name.
    pub fn label(&self) -> &str {
        &self.label
    }
}
