//! Daemon configuration.
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables with a `STATSD_` prefix:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | STATSD_LISTEN_ADDR | 0.0.0.0:8125 | UDP ingest address |
//! | STATSD_GRAPHITE_ADDR | 127.0.0.1:2003 | Graphite TCP address |
//! | STATSD_FLUSH_INTERVAL | 10 | Seconds between flushes |
//! | STATSD_PERSIST_COUNT_KEYS | 60 | Idle flush cycles before a counter is purged |
//! | STATSD_PERCENTILES | (empty) | Comma-separated signed percentile thresholds |
//! | STATSD_DEFAULT_SAMPLING | 1.0 | Sampling assumed when a packet carries none |
//! | STATSD_RECEIVE_COUNTER | (unset) | Bucket counting received events |

use crate::metric::Percentile;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// UDP address the daemon listens on.
    pub listen_addr: String,
    /// TCP address of the Graphite backend.
    pub graphite_addr: String,
    /// Seconds between flush cycles.
    pub flush_interval: u64,
    /// Idle flush cycles a counter keeps reporting zero before being purged.
    pub persist_count_keys: u32,
    /// Signed percentile thresholds computed for timers, in `(-100, 100)`,
    /// non-zero.
    pub percentile_thresholds: Vec<i32>,
    /// Sampling rate assumed when a packet carries no `|@` clause.
    pub default_sampling: f64,
    /// Optional counter bucket incremented once per received event.
    pub receive_counter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8125".to_string(),
            graphite_addr: "127.0.0.1:2003".to_string(),
            flush_interval: 10,
            persist_count_keys: 60,
            percentile_thresholds: Vec::new(),
            default_sampling: 1.0,
            receive_counter: None,
        }
    }
}

impl Config {
    /// Load from an optional TOML file, apply environment overrides and
    /// validate.
    pub fn load(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config: Config = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => Config::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Configuration for tests (fast flush, short retention).
    pub fn test() -> Self {
        Config {
            flush_interval: 1,
            persist_count_keys: 2,
            ..Config::default()
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("STATSD_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Ok(addr) = std::env::var("STATSD_GRAPHITE_ADDR") {
            self.graphite_addr = addr;
        }
        if let Some(interval) = env_parse("STATSD_FLUSH_INTERVAL") {
            self.flush_interval = interval;
        }
        if let Some(window) = env_parse("STATSD_PERSIST_COUNT_KEYS") {
            self.persist_count_keys = window;
        }
        if let Ok(list) = std::env::var("STATSD_PERCENTILES") {
            self.percentile_thresholds = list
                .split(',')
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.trim().parse().ok())
                .collect();
        }
        if let Some(sampling) = env_parse("STATSD_DEFAULT_SAMPLING") {
            self.default_sampling = sampling;
        }
        if let Ok(bucket) = std::env::var("STATSD_RECEIVE_COUNTER") {
            self.receive_counter = Some(bucket);
        }
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.flush_interval == 0 {
            return Err("flush_interval must be at least one second".into());
        }
        if !(self.default_sampling > 0.0 && self.default_sampling <= 1.0) {
            return Err(format!(
                "default_sampling {} outside (0, 1]",
                self.default_sampling
            )
            .into());
        }
        for &threshold in &self.percentile_thresholds {
            if Percentile::new(threshold).is_none() {
                return Err(format!(
                    "percentile threshold {} outside (-100, 100) or zero",
                    threshold
                )
                .into());
            }
        }
        Ok(())
    }

    /// The configured thresholds as [`Percentile`]s, in configuration order.
    pub fn percentiles(&self) -> Vec<Percentile> {
        self.percentile_thresholds
            .iter()
            .filter_map(|&t| Percentile::new(t))
            .collect()
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
