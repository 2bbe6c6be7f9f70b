//! UDP ingest and the periodic flush loop.

use crate::config::Config;
use crate::flush;
use crate::metric::Percentile;
use crate::parser;
use crate::sink::GraphiteSink;
use crate::store::SharedStore;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tracing::{error, info};

/// Largest datagram the listener accepts; anything longer is truncated by
/// the socket and the tail dropped as malformed lines.
const RECV_BUFFER_SIZE: usize = 8192;

pub struct StatsdServer {
    config: Config,
}

impl StatsdServer {
    pub fn new(config: Config) -> Self {
        StatsdServer { config }
    }

    /// Run until ctrl-c. Spawns the ingest task, then drives the flush loop
    /// on this task; shutdown performs one final flush so the last window is
    /// not lost.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let store = SharedStore::new(
            self.config.persist_count_keys,
            self.config.receive_counter.clone(),
        );
        let percentiles = self.config.percentiles();
        let sink = GraphiteSink::new(self.config.graphite_addr.clone());

        let socket = UdpSocket::bind(&self.config.listen_addr).await?;
        info!("statsd listening on {}", self.config.listen_addr);

        let ingest_store = store.clone();
        let default_sampling = self.config.default_sampling;
        tokio::spawn(async move {
            let mut buf = [0u8; RECV_BUFFER_SIZE];
            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, _)) => {
                        for event in parser::parse_with_default(&buf[..len], default_sampling) {
                            ingest_store.apply(event);
                        }
                    }
                    Err(e) => error!("udp receive failed: {}", e),
                }
            }
        });

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.flush_interval));
        ticker.tick().await; // the first tick completes immediately
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    flush_once(&store, &percentiles, &sink).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutting down, flushing remaining stats");
                    flush_once(&store, &percentiles, &sink).await;
                    return Ok(());
                }
            }
        }
    }
}

async fn flush_once(store: &SharedStore, percentiles: &[Percentile], sink: &GraphiteSink) {
    let now = unix_now();
    let snapshot = store.drain_for_flush();
    let mut buf = String::new();
    let num = flush::flush(snapshot, now, percentiles, &mut buf);
    if num == 0 {
        return;
    }
    sink.send(&buf, num).await;
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
