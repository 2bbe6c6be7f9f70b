//! Flush engine: turns one [`FlushSnapshot`] into Graphite plaintext lines.
//!
//! Every line has the form `<name> <value> <timestamp>\n` with the timestamp
//! in whole seconds, identical across all lines of one cycle. Counters and
//! gauges emit the bare bucket name; timers emit `<bucket>.<stat>` for mean,
//! upper, lower, count and each configured percentile.

use crate::metric::Percentile;
use crate::store::FlushSnapshot;
use std::fmt::Write;

/// Format a snapshot into `buf`, stamping every line with `now` (unix
/// seconds). Returns the number of lines written.
pub fn flush(snapshot: FlushSnapshot, now: i64, percentiles: &[Percentile], buf: &mut String) -> u64 {
    let mut num = 0;
    num += process_counters(&snapshot.counters, now, buf);
    num += process_gauges(&snapshot.gauges, now, buf);
    num += process_timers(snapshot.timers, now, percentiles, buf);
    num
}

fn process_counters(counters: &[(String, i64)], now: i64, buf: &mut String) -> u64 {
    for (bucket, total) in counters {
        let _ = writeln!(buf, "{} {} {}", bucket, total, now);
    }
    counters.len() as u64
}

fn process_gauges(gauges: &[(String, u64)], now: i64, buf: &mut String) -> u64 {
    for (bucket, reading) in gauges {
        let _ = writeln!(buf, "{} {} {}", bucket, reading, now);
    }
    gauges.len() as u64
}

fn process_timers(
    timers: Vec<(String, Vec<u64>)>,
    now: i64,
    percentiles: &[Percentile],
    buf: &mut String,
) -> u64 {
    let mut num = 0;
    for (bucket, mut samples) in timers {
        if samples.is_empty() {
            continue;
        }
        samples.sort_unstable();

        let count = samples.len();
        let min = samples[0];
        let max = samples[count - 1];
        let sum: u128 = samples.iter().map(|&v| u128::from(v)).sum();
        let mean = sum as f64 / count as f64;

        let _ = writeln!(buf, "{}.mean {:.6} {}", bucket, mean, now);
        let _ = writeln!(buf, "{}.upper {} {}", bucket, max, now);
        let _ = writeln!(buf, "{}.lower {} {}", bucket, min, now);
        let _ = writeln!(buf, "{}.count {} {}", bucket, count, now);
        num += 4;

        for pct in percentiles {
            let value = rank(&samples, pct.threshold());
            let stat = if pct.threshold() >= 0 { "upper" } else { "lower" };
            let _ = writeln!(buf, "{}.{}_{} {} {}", bucket, stat, pct.label(), value, now);
            num += 1;
        }
    }
    num
}

/// Pick the sample at a percentile threshold from an ascending-sorted slice.
///
/// For a positive threshold `p` this is the largest sample among the lowest
/// `p`%; for a negative threshold it is the smallest sample among the highest
/// `|p|`%. Rank `floor(abs/100 * n + 0.5)` with indices clamped to the slice,
/// so a single sample degenerates to itself for every threshold.
fn rank(sorted: &[u64], threshold: i32) -> u64 {
    let count = sorted.len();
    let abs = if threshold >= 0 {
        f64::from(threshold)
    } else {
        100.0 + f64::from(threshold)
    };
    let mut index = (abs / 100.0 * count as f64 + 0.5).floor() as i64;
    if threshold >= 0 {
        index -= 1;
    }
    sorted[index.clamp(0, count as i64 - 1) as usize]
}
