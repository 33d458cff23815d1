/* src/monitor/connection.rs */

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use uuid::Uuid;

/// Rolling deadline applied to every single transport write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The shared half of an instrumented connection. Only the owning
/// `InstrumentedConnection` bumps the counter; everyone else reads it.
#[derive(Debug)]
pub struct ConnectionMeter {
    id: ConnectionId,
    remote: String,
    session_id: Uuid,
    started: Instant,
    written: AtomicU64,
}

impl ConnectionMeter {
    pub fn new(id: ConnectionId, remote: impl Into<String>) -> Self {
        ConnectionMeter {
            id,
            remote: remote.into(),
            session_id: Uuid::new_v4(),
            started: Instant::now(),
            written: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// First eight hex digits of the session id, enough to tell sessions apart in the log.
    pub fn short_session_id(&self) -> String {
        self.session_id.simple().to_string()[..8].to_string()
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn bytes_written(&self) -> u64 {
        self.written.load(Ordering::Acquire)
    }

    pub(crate) fn record(&self, n: u64) {
        self.written.fetch_add(n, Ordering::AcqRel);
    }
}

/// Wraps the write half of a transport and counts every byte it accepts.
///
/// Several tasks may share one connection through an `Arc`; the total is
/// always exact, but the order in which their writes hit the wire is not
/// specified.
pub struct InstrumentedConnection<W> {
    writer: Mutex<W>,
    meter: Arc<ConnectionMeter>,
    write_timeout: Duration,
}

impl<W> InstrumentedConnection<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W, meter: Arc<ConnectionMeter>, write_timeout: Duration) -> Self {
        InstrumentedConnection {
            writer: Mutex::new(writer),
            meter,
            write_timeout,
        }
    }

    pub fn meter(&self) -> &Arc<ConnectionMeter> {
        &self.meter
    }

    pub fn bytes_written(&self) -> u64 {
        self.meter.bytes_written()
    }

    /// Forwards one write to the transport under a fresh deadline and counts what it accepted.
    pub async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut writer = self.writer.lock().await;
        let n = match time::timeout(self.write_timeout, writer.write(buf)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!(
                        "write to {} stalled for more than {:?}",
                        self.meter.remote(),
                        self.write_timeout
                    ),
                ));
            }
        };
        self.meter.record(n as u64);
        Ok(n)
    }

    /// Writes the whole buffer. Chunks accepted before a failure stay counted.
    pub async fn write_all(&self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            let n = self.write(buf).await?;
            if n == 0 {
                return Err(io::ErrorKind::WriteZero.into());
            }
            buf = &buf[n..];
        }
        Ok(())
    }

    pub async fn shutdown(&self) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.flush().await?;
        writer.shutdown().await
    }
}
