//! StatsD counters for a finished run
//!
//! Fire-and-forget: nothing here can fail the run, problems are only logged.

use chunklytics_core::ParseResult;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, warn};

const REPORT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct StatsdClient {
    socket: UdpSocket,
    prefix: String,
}

impl StatsdClient {
    /// Resolve `server` (host:port) and connect a UDP socket of the same family.
    pub async fn connect(server: &str, prefix: impl Into<String>) -> io::Result<Self> {
        let target = lookup_host(server).await?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no address for {server}"))
        })?;

        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(target).await?;

        Ok(Self {
            socket,
            prefix: prefix.into(),
        })
    }

    pub async fn count(&self, name: &str, value: u64) -> io::Result<()> {
        let payload = format!("{}.{}:{}|c", self.prefix, name, value);
        self.socket.send(payload.as_bytes()).await?;
        Ok(())
    }
}

/// Send the ok/failed line counters.
pub async fn report(server: &str, prefix: &str, result: &ParseResult) {
    let send = async {
        let client = StatsdClient::connect(server, prefix).await?;
        client.count("lines_ok", result.total_ok).await?;
        client.count("lines_failed", result.total_failed).await?;
        Ok::<_, io::Error>(())
    };

    match timeout(REPORT_TIMEOUT, send).await {
        Ok(Ok(())) => debug!(server, "Sent line counters to StatsD"),
        Ok(Err(e)) => warn!(server, error = %e, "Failed to send metrics to StatsD"),
        Err(_) => warn!(server, "Timed out sending metrics to StatsD"),
    }
}
