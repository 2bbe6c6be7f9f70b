//! Graphite plaintext sink.
//!
//! Delivery is best-effort: the daemon connects per flush, writes the whole
//! buffer and moves on. A backend outage costs one interval of data, never
//! the daemon.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

pub struct GraphiteSink {
    addr: String,
}

impl GraphiteSink {
    pub fn new(addr: String) -> Self {
        GraphiteSink { addr }
    }

    /// Deliver one flush buffer. Failures are logged and the buffer dropped.
    pub async fn send(&self, buf: &str, num_stats: u64) {
        match self.try_send(buf).await {
            Ok(()) => debug!("sent {} stats to {}", num_stats, self.addr),
            Err(e) => warn!("failed to send {} stats to {}: {}", num_stats, self.addr, e),
        }
    }

    async fn try_send(&self, buf: &str) -> std::io::Result<()> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        stream.write_all(buf.as_bytes()).await?;
        stream.shutdown().await
    }
}
