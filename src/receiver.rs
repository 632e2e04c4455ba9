//! Event Processor: reads inbound bytes, decodes connection events and emits
//! latency samples.

use std::io::Write;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::connection::Event;
use crate::session::SessionShared;
use crate::stats::RttCollector;
use crate::time::{decode_payload, monotonic_ns, ns_to_ms, round_trip_ns};

const READ_BUF_SIZE: usize = 64 * 1024;

/// Runs the receive loop until the peer closes, a fatal error occurs or the
/// session is cancelled. Returns the collected samples.
///
/// Each read waits in a two-way select against the termination signal, so
/// cancellation is observed without a polling timeout. Peer-initiated PINGs
/// are acknowledged before the next read. Samples are written to `out` one
/// line per acknowledgement, in arrival order, flushed immediately.
pub async fn run_receiver<R, W>(
    mut reader: R,
    shared: Arc<Mutex<SessionShared<W>>>,
    mut out: Box<dyn Write + Send>,
    cancel: CancellationToken,
) -> RttCollector
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    info!("Starting event processor");
    let mut collector = RttCollector::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];

    'outer: loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            read = reader.read(&mut buf) => match read {
                Ok(n) => n,
                Err(e) => {
                    error!("Read failed: {}", e);
                    cancel.cancel();
                    break;
                }
            },
        };
        if n == 0 {
            info!("Connection closed by peer");
            cancel.cancel();
            break;
        }

        let events = shared.lock().await.conn.receive_data(&buf[..n]);
        for event in events {
            match event {
                Event::PingAckReceived { payload } => {
                    let rtt_ns = round_trip_ns(decode_payload(payload), monotonic_ns());
                    let rtt_ms = ns_to_ms(rtt_ns);
                    info!("PING ACK received. latency: {:.3} ms", rtt_ms);
                    collector.record(rtt_ns);
                    if let Err(e) = writeln!(out, "{:.3}", rtt_ms).and_then(|_| out.flush()) {
                        error!("Failed to write sample: {}", e);
                        cancel.cancel();
                        break 'outer;
                    }
                }
                Event::PingReceived { payload } => {
                    info!("Incoming PING received");
                    let mut shared = shared.lock().await;
                    shared.conn.ping_ack(payload);
                    if let Err(e) = shared.flush().await {
                        error!("Failed to send PING ACK: {}", e);
                        cancel.cancel();
                        break 'outer;
                    }
                }
                Event::ConnectionTerminated {
                    last_stream_id,
                    error_code,
                } => {
                    info!(
                        "Connection terminated (GOAWAY, last stream {}, error code {})",
                        last_stream_id, error_code
                    );
                    cancel.cancel();
                    break;
                }
                Event::Other { description } => {
                    warn!("Unhandled event: {}", description);
                }
            }
        }

        // Push out anything the dispatch queued (SETTINGS ACKs and the like)
        // before blocking on the next read.
        if let Err(e) = shared.lock().await.flush().await {
            error!("Write failed: {}", e);
            cancel.cancel();
            break;
        }
        if cancel.is_cancelled() {
            break;
        }
    }

    info!("Event processor stopped");
    collector
}
