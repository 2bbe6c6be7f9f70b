//! In-memory aggregation store shared between the ingest path and the flush
//! loop.
//!
//! Counters, gauges and timers each live behind their own `parking_lot`
//! mutex so that an `apply` and a flush-side drain never interleave
//! non-atomically on the same bucket. Callers never touch the maps directly:
//! the only entry points are [`SharedStore::apply`] and
//! [`SharedStore::drain_for_flush`].

use crate::metric::{MetricEvent, MetricPayload};
use ahash::AHashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to the process-wide aggregation state.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    counters: Mutex<CounterState>,
    gauges: Mutex<AHashMap<String, u64>>,
    timers: Mutex<AHashMap<String, Vec<u64>>>,
    /// Idle flush cycles a counter keeps reporting zero before being purged.
    persist_count_keys: u32,
    /// Optional bucket counting every applied event.
    receive_counter: Option<String>,
}

/// Running totals plus the idle-cycle bookkeeping for the persistence policy.
#[derive(Default)]
struct CounterState {
    totals: AHashMap<String, i64>,
    idle_cycles: AHashMap<String, u32>,
}

/// Everything one flush cycle reports, copied out under the locks.
///
/// `counters` already reflects the persistence policy: active buckets carry
/// their per-interval total, idle-but-retained buckets carry an explicit
/// zero.
#[derive(Debug, Default)]
pub struct FlushSnapshot {
    pub counters: Vec<(String, i64)>,
    pub gauges: Vec<(String, u64)>,
    pub timers: Vec<(String, Vec<u64>)>,
}

impl SharedStore {
    pub fn new(persist_count_keys: u32, receive_counter: Option<String>) -> Self {
        SharedStore {
            inner: Arc::new(StoreInner {
                counters: Mutex::new(CounterState::default()),
                gauges: Mutex::new(AHashMap::new()),
                timers: Mutex::new(AHashMap::new()),
                persist_count_keys,
                receive_counter,
            }),
        }
    }

    /// Apply one parsed event. Pure bookkeeping; validation already happened
    /// in the parser, so nothing is ever rejected here.
    pub fn apply(&self, event: MetricEvent) {
        match event.payload {
            MetricPayload::Counter(delta) => {
                let adjusted = scale_delta(delta, event.sampling);
                let mut state = self.inner.counters.lock();
                let total = state.totals.entry(event.bucket).or_insert(0);
                *total = total.saturating_add(adjusted);
            }
            MetricPayload::Gauge(reading) => {
                self.inner.gauges.lock().insert(event.bucket, reading);
            }
            MetricPayload::Timer(sample) => {
                self.inner
                    .timers
                    .lock()
                    .entry(event.bucket)
                    .or_default()
                    .push(sample);
            }
        }

        if let Some(bucket) = &self.inner.receive_counter {
            let mut state = self.inner.counters.lock();
            let total = state.totals.entry(bucket.clone()).or_insert(0);
            *total = total.saturating_add(1);
        }
    }

    /// Take everything the next flush cycle should report, resetting per-kind
    /// state. Each lock is held only long enough to swap or copy its map.
    ///
    /// Counters are drained and their idle bookkeeping advanced: a bucket
    /// seen since the previous flush reports its total and starts a fresh
    /// retention window; an idle bucket reports an explicit zero until the
    /// window runs out, then disappears from the map entirely. Gauges are
    /// copied and persist. Timers are taken wholesale and report only the
    /// current window.
    pub fn drain_for_flush(&self) -> FlushSnapshot {
        let counters = {
            let mut state = self.inner.counters.lock();
            let CounterState { totals, idle_cycles } = &mut *state;

            let mut out = Vec::with_capacity(totals.len() + idle_cycles.len());
            for (bucket, total) in totals.drain() {
                idle_cycles.insert(bucket.clone(), 0);
                out.push((bucket, total));
            }
            let window = self.inner.persist_count_keys;
            idle_cycles.retain(|bucket, idle| {
                if *idle > 0 {
                    out.push((bucket.clone(), 0));
                }
                *idle += 1;
                *idle <= window
            });
            out
        };

        let gauges = {
            let gauges = self.inner.gauges.lock();
            gauges.iter().map(|(b, v)| (b.clone(), *v)).collect()
        };

        let timers = {
            let mut timers = self.inner.timers.lock();
            std::mem::take(&mut *timers).into_iter().collect()
        };

        FlushSnapshot {
            counters,
            gauges,
            timers,
        }
    }
}

/// Extrapolate a sampled counter delta to its estimated true value,
/// rounding half away from zero.
fn scale_delta(delta: i64, sampling: f64) -> i64 {
    if sampling == 1.0 {
        return delta;
    }
    (delta as f64 / sampling).round() as i64
}
