//! Session coordination: owns the connection, spawns the two actors and
//! drives orderly shutdown.
//!
//! The event processor's exit is the authoritative end-of-test signal. The
//! coordinator then cancels the shared token (covering exits caused by local
//! errors or operator interrupt, not just peer termination), waits for the
//! probe emitter, performs the GOAWAY handshake and shuts the stream down.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::connection::Connection;
use crate::receiver::run_receiver;
use crate::sender::run_pinger;
use crate::stats::StatsSnapshot;
use crate::Error;

/// State shared by both actors: the connection state machine and the write
/// half of the stream.
///
/// The mutex is held across the whole encode-then-write sequence so frames
/// from the two actors can never interleave mid-frame.
pub struct SessionShared<W> {
    pub conn: Connection,
    writer: W,
}

impl<W: AsyncWrite + Unpin> SessionShared<W> {
    /// Writes all bytes the connection has queued and flushes the stream.
    pub async fn flush(&mut self) -> io::Result<()> {
        let data = self.conn.data_to_send();
        if !data.is_empty() {
            self.writer.write_all(&data).await?;
            self.writer.flush().await?;
        }
        Ok(())
    }
}

/// Runs one latency test session over an established stream.
///
/// Generic over the stream so tests can drive it with in-memory pipes.
/// `cancel` is the shared termination signal: the caller may cancel it at any
/// time (operator interrupt) and either actor cancels it when it observes a
/// stop condition. Returns the statistics of the completed run.
pub async fn run_session<S>(
    stream: S,
    interval: Duration,
    out: Box<dyn Write + Send>,
    cancel: CancellationToken,
) -> Result<StatsSnapshot, Error>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);

    let mut conn = Connection::new();
    conn.initiate();
    let shared = Arc::new(Mutex::new(SessionShared { conn, writer }));

    // Preface and SETTINGS must precede any other data.
    shared.lock().await.flush().await?;

    info!("Starting probe emitter and event processor");
    let receiver = tokio::spawn(run_receiver(reader, shared.clone(), out, cancel.clone()));
    let pinger = tokio::spawn(run_pinger(shared.clone(), interval, cancel.clone()));

    // The event processor finishing is the end of the test, whatever the
    // cause. Cancel so the probe emitter exits on its own cadence.
    let collector = receiver.await.unwrap_or_else(|e| {
        error!("Event processor task failed: {}", e);
        Default::default()
    });
    cancel.cancel();
    if let Err(e) = pinger.await {
        error!("Probe emitter task failed: {}", e);
    }

    // Termination handshake and stream shutdown, best effort: the peer may
    // already be gone.
    {
        let mut shared = shared.lock().await;
        shared.conn.close_connection();
        if let Err(e) = shared.flush().await {
            debug!("Termination handshake write failed: {}", e);
        }
        if let Err(e) = shared.writer.shutdown().await {
            debug!("Stream shutdown failed: {}", e);
        }
    }

    Ok(collector.snapshot())
}
