//! Probe Emitter: sends a timestamped PING on a fixed cadence.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::session::SessionShared;
use crate::time::{encode_payload, monotonic_ns};

/// Emits one PING per interval until cancelled.
///
/// The termination signal is checked before every send, and the inter-probe
/// sleep itself is cancellable, so shutdown never waits a full interval. A
/// write failure is a fatal local I/O error: it triggers termination for the
/// whole session. No cleanup happens here; the coordinator owns the final
/// handshake and close.
pub async fn run_pinger<W>(
    shared: Arc<Mutex<SessionShared<W>>>,
    interval: Duration,
    cancel: CancellationToken,
) where
    W: AsyncWrite + Unpin + Send,
{
    debug!("Starting probe emitter");

    while !cancel.is_cancelled() {
        let payload = encode_payload(monotonic_ns());
        {
            // Lock spans encode and write so the frame is never interleaved
            // with event-processor output.
            let mut shared = shared.lock().await;
            shared.conn.ping(payload);
            if let Err(e) = shared.flush().await {
                warn!("Failed to send PING: {}", e);
                cancel.cancel();
                break;
            }
        }
        debug!("PING sent");

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!("Probe emitter stopped");
}
