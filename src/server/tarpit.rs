/* src/server/tarpit.rs */

use crate::console::format::{format_bytes, format_uptime};
use crate::monitor::{EventSender, InstrumentedConnection, Monitor};
use crate::setup::config::{NetworkConfig, TarpitConfig};
use log::{debug, info, warn};
use rand::Rng;
use rand::distr::Alphanumeric;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub write_timeout: Duration,
    pub line_interval: Duration,
    pub max_line_len: usize,
    pub max_session: Option<Duration>,
}

impl SessionSettings {
    pub fn new(network: &NetworkConfig, tarpit: &TarpitConfig) -> Self {
        SessionSettings {
            write_timeout: network.write_timeout(),
            line_interval: Duration::from_millis(tarpit.line_interval_ms),
            max_line_len: tarpit.max_line_len,
            max_session: tarpit.max_session_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug)]
enum SessionEnd {
    WriteFailed(io::Error),
    Expired,
    Shutdown,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::WriteFailed(e) => write!(f, "{}", e),
            SessionEnd::Expired => write!(f, "session limit reached"),
            SessionEnd::Shutdown => write!(f, "server shutting down"),
        }
    }
}

pub async fn bind(cfg: &NetworkConfig) -> io::Result<TcpListener> {
    let listener = TcpListener::bind(cfg.listen_addr()).await?;
    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accepts connections until cancelled and runs one session task per peer.
pub async fn serve(
    listener: TcpListener,
    monitor: Monitor,
    events: EventSender,
    settings: SessionSettings,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(
                        "Accepted {} ({} already active)",
                        peer,
                        monitor.registry.active_count()
                    );
                    tokio::spawn(handle_session(
                        stream,
                        peer,
                        monitor.clone(),
                        events.clone(),
                        settings.clone(),
                        cancel.clone(),
                    ));
                }
                Err(e) => {
                    // Usually fd exhaustion; back off instead of spinning.
                    warn!("Accept failed: {}", e);
                    time::sleep(Duration::from_millis(100)).await;
                }
            },
        }
    }
    info!("Listener stopped.");
}

async fn handle_session(
    stream: TcpStream,
    peer: SocketAddr,
    monitor: Monitor,
    events: EventSender,
    settings: SessionSettings,
    cancel: CancellationToken,
) {
    let remote = peer.to_string();
    let (meter, registration) = monitor.registry.open(remote.clone());
    events.emit(format!(
        "{}: connected (session {})",
        remote,
        meter.short_session_id()
    ));

    let (_reader, writer) = stream.into_split();
    let conn = InstrumentedConnection::new(writer, meter, settings.write_timeout);
    let end = trickle(&conn, &settings, &cancel).await;
    if let Err(e) = conn.shutdown().await {
        debug!("Shutdown of {} failed: {}", remote, e);
    }

    let uptime = conn.meter().started().elapsed();
    let sent = conn.bytes_written();
    registration.close();

    events.emit(format!(
        "{}: closed after {}, {} sent ({})",
        remote,
        format_uptime(uptime),
        format_bytes(sent),
        end
    ));
}

async fn trickle<W>(
    conn: &InstrumentedConnection<W>,
    settings: &SessionSettings,
    cancel: &CancellationToken,
) -> SessionEnd
where
    W: tokio::io::AsyncWrite + Unpin + Send,
{
    let started = conn.meter().started();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Shutdown,
            _ = time::sleep(settings.line_interval) => {}
        }

        if settings
            .max_session
            .is_some_and(|limit| started.elapsed() >= limit)
        {
            return SessionEnd::Expired;
        }

        let line = random_line(settings.max_line_len);
        if let Err(e) = conn.write_all(line.as_bytes()).await {
            return SessionEnd::WriteFailed(e);
        }
    }
}

/// One line of pre-banner noise. Clients must skip lines that do not start
/// with "SSH-" before the version exchange, and these never do.
fn random_line(max_len: usize) -> String {
    let mut rng = rand::rng();
    let body_len = rng.random_range(1..=max_len.saturating_sub(2).max(1));
    let mut line: String = (&mut rng)
        .sample_iter(Alphanumeric)
        .take(body_len)
        .map(char::from)
        .collect();
    line.push_str("\r\n");
    line
}
