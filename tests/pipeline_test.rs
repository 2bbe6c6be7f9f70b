//! End-to-end pipeline tests: datagram -> parser -> store -> flush lines.
//!
//! Exercises the full core path the daemon runs on every tick, verifying:
//! - dispatch of mixed datagrams into the three maps
//! - counter persistence and purge across flush cycles
//! - timer statistics and percentile lines
//! - one output line per distinct bucket-statistic pair

use statsdaemon::{flush, parser, Percentile, SharedStore};

fn apply_datagram(store: &SharedStore, datagram: &[u8]) {
    for event in parser::parse(datagram) {
        store.apply(event);
    }
}

fn flush_lines(store: &SharedStore, now: i64, percentiles: &[Percentile]) -> (Vec<String>, u64) {
    let mut buf = String::new();
    let num = flush::flush(store.drain_for_flush(), now, percentiles, &mut buf);
    (buf.lines().map(str::to_string).collect(), num)
}

// ============================================================================
// Round-trip
// ============================================================================

#[test]
fn test_round_trip_one_line_per_statistic() {
    let store = SharedStore::new(60, None);
    apply_datagram(
        &store,
        b"gorets:1|c\ngorets:4|c\ngaugor:333|g\nglork:320|ms\nglork:100|ms",
    );

    let percentiles = [Percentile::new(90).unwrap()];
    let (lines, num) = flush_lines(&store, 1418052649, &percentiles);

    // One counter, one gauge, one timer with mean/upper/lower/count/upper_90.
    assert_eq!(num, 7);
    assert_eq!(lines.len(), 7);
    assert!(lines.contains(&"gorets 5 1418052649".to_string()));
    assert!(lines.contains(&"gaugor 333 1418052649".to_string()));
    assert!(lines.contains(&"glork.mean 210.000000 1418052649".to_string()));
    assert!(lines.contains(&"glork.upper 320 1418052649".to_string()));
    assert!(lines.contains(&"glork.lower 100 1418052649".to_string()));
    assert!(lines.contains(&"glork.count 2 1418052649".to_string()));
    assert!(lines.contains(&"glork.upper_90 320 1418052649".to_string()));
}

#[test]
fn test_malformed_lines_do_not_pollute_flush() {
    let store = SharedStore::new(60, None);
    apply_datagram(&store, b"good:1|c\nbad line\nalso:bad\ngood:2|c");

    let (lines, num) = flush_lines(&store, 10, &[]);
    assert_eq!(num, 1);
    assert_eq!(lines, vec!["good 3 10".to_string()]);
}

// ============================================================================
// Counter persistence across cycles
// ============================================================================

#[test]
fn test_counter_persistence_window() {
    let store = SharedStore::new(10, None);
    apply_datagram(&store, b"gorets:123|c");

    let now = 1418052649;
    let mut all_lines = Vec::new();
    for _ in 0..20 {
        let (lines, _) = flush_lines(&store, now, &[]);
        all_lines.extend(lines);
    }

    // One real report, then ten explicit zeros, then the bucket is purged.
    assert_eq!(all_lines.len(), 11);
    assert_eq!(all_lines[0], "gorets 123 1418052649");
    for line in &all_lines[1..] {
        assert_eq!(line, "gorets 0 1418052649");
    }
}

#[test]
fn test_counter_resets_to_per_interval_totals() {
    let store = SharedStore::new(60, None);
    apply_datagram(&store, b"hits:7|c");
    let (lines, _) = flush_lines(&store, 1, &[]);
    assert_eq!(lines, vec!["hits 7 1".to_string()]);

    // The next window accumulates from zero, not from 7.
    apply_datagram(&store, b"hits:2|c");
    let (lines, _) = flush_lines(&store, 2, &[]);
    assert_eq!(lines, vec!["hits 2 2".to_string()]);
}

// ============================================================================
// Gauges and timers across cycles
// ============================================================================

#[test]
fn test_gauge_last_write_wins_and_persists() {
    let store = SharedStore::new(60, None);
    apply_datagram(&store, b"gaugor:10|g\ngaugor:42|g");

    let (lines, _) = flush_lines(&store, 1, &[]);
    assert_eq!(lines, vec!["gaugor 42 1".to_string()]);

    // No traffic: the reading persists unchanged.
    let (lines, _) = flush_lines(&store, 2, &[]);
    assert_eq!(lines, vec!["gaugor 42 2".to_string()]);
}

#[test]
fn test_timer_reports_only_current_window() {
    let store = SharedStore::new(60, None);
    apply_datagram(&store, b"response_time:0|ms\nresponse_time:30|ms\nresponse_time:30|ms");

    let (lines, num) = flush_lines(&store, 5, &[]);
    assert_eq!(num, 4);
    assert!(lines.contains(&"response_time.mean 20.000000 5".to_string()));

    // Timers never carry state across cycles.
    let (lines, num) = flush_lines(&store, 6, &[]);
    assert_eq!(num, 0);
    assert!(lines.is_empty());
}

#[test]
fn test_percentile_lines_from_datagram() {
    let store = SharedStore::new(60, None);
    apply_datagram(&store, b"time:0|ms\ntime:1|ms\ntime:2|ms\ntime:3|ms");

    let percentiles = [Percentile::new(75).unwrap(), Percentile::new(-75).unwrap()];
    let (lines, _) = flush_lines(&store, 9, &percentiles);
    assert!(lines.contains(&"time.upper_75 2 9".to_string()));
    assert!(lines.contains(&"time.lower_75 1 9".to_string()));
}

// ============================================================================
// Sampling and the receive counter
// ============================================================================

#[test]
fn test_sampled_counter_extrapolates() {
    let store = SharedStore::new(60, None);
    apply_datagram(&store, b"gorets:2|c|@0.1");

    let (lines, _) = flush_lines(&store, 3, &[]);
    assert_eq!(lines, vec!["gorets 20 3".to_string()]);
}

#[test]
fn test_receive_counter_reported_alongside_traffic() {
    let store = SharedStore::new(60, Some("countme".to_string()));
    apply_datagram(&store, b"gorets:100|c\ngorets:100|c");

    let (lines, _) = flush_lines(&store, 4, &[]);
    assert!(lines.contains(&"gorets 200 4".to_string()));
    assert!(lines.contains(&"countme 2 4".to_string()));
}
