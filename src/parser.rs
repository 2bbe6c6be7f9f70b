//! Wire-format parser for the statsd text protocol.
//!
//! One datagram carries one or more newline-separated lines of the form
//!
//! ```text
//! <bucket>:<value>|<type>[|@<sampling>]
//! ```
//!
//! where `<type>` is `c` (counter), `g` (gauge) or `ms` (timer). Malformed
//! lines are dropped silently without affecting their siblings; the daemon
//! must keep running regardless of what arrives on the socket.

use crate::metric::{MetricEvent, MetricPayload};
use memchr::memchr_iter;
use tracing::debug;

/// Sampling rate assumed when a packet carries no `|@` clause.
pub const DEFAULT_SAMPLING: f64 = 1.0;

/// Parse one datagram into metric events, preserving line order.
///
/// A buffer that yields zero valid lines produces an empty vector, not an
/// error. A trailing newline produces no spurious event.
pub fn parse(buf: &[u8]) -> Vec<MetricEvent> {
    parse_with_default(buf, DEFAULT_SAMPLING)
}

/// Like [`parse`], with a configurable sampling rate for packets that carry
/// no usable `|@` clause.
pub fn parse_with_default(buf: &[u8], default_sampling: f64) -> Vec<MetricEvent> {
    let mut events = Vec::new();
    let mut start = 0;
    for nl in memchr_iter(b'\n', buf) {
        push_line(&buf[start..nl], default_sampling, &mut events);
        start = nl + 1;
    }
    push_line(&buf[start..], default_sampling, &mut events);
    events
}

fn push_line(line: &[u8], default_sampling: f64, events: &mut Vec<MetricEvent>) {
    if line.is_empty() {
        return;
    }
    match parse_line(line, default_sampling) {
        Some(event) => events.push(event),
        None => debug!("dropped malformed line: {:?}", String::from_utf8_lossy(line)),
    }
}

fn parse_line(line: &[u8], default_sampling: f64) -> Option<MetricEvent> {
    let line = std::str::from_utf8(line).ok()?;
    let (bucket, rest) = line.split_once(':')?;
    if bucket.is_empty() {
        return None;
    }

    let mut clauses = rest.split('|');
    let value = clauses.next()?;
    let kind = clauses.next()?;
    let rate_clause = clauses.next();
    if clauses.next().is_some() || value.is_empty() {
        return None;
    }

    let sampling = match rate_clause {
        // A `|@` clause with an empty or unparsable rate still yields a valid
        // event at the default rate; a clause without `@` does not.
        Some(clause) => clause
            .strip_prefix('@')?
            .parse::<f64>()
            .ok()
            .filter(|rate| *rate > 0.0 && *rate <= 1.0)
            .unwrap_or(default_sampling),
        None => default_sampling,
    };

    let payload = match kind {
        "c" => MetricPayload::Counter(value.parse::<i64>().ok()?),
        "g" => MetricPayload::Gauge(value.parse::<u64>().ok()?),
        "ms" => MetricPayload::Timer(value.parse::<u64>().ok()?),
        _ => return None,
    };

    Some(MetricEvent {
        bucket: bucket.to_string(),
        payload,
        sampling,
    })
}
