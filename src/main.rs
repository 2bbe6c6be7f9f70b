//! statsdaemon — UDP statsd aggregator flushing to Graphite.
//!
//! Usage: `statsdaemon [config.toml]`
//!
//! Configuration comes from the optional TOML file plus `STATSD_*`
//! environment variables; see the `config` module for the full table.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use statsdaemon::{Config, StatsdServer};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref().map(Path::new))?;

    StatsdServer::new(config).run().await
}
