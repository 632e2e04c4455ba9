//! h2ping - HTTP/2 PING round-trip latency tester.
//!
//! This crate measures round-trip latency over an established TLS+HTTP/2
//! connection by periodically sending PING frames carrying a monotonic send
//! timestamp and timing the matching PING acknowledgements.
//!
//! # Usage
//!
//! Probe a server on the default TLS port, writing samples to stdout:
//! ```bash
//! h2ping 203.0.113.10
//! ```
//!
//! Probe a custom port, writing samples to a file:
//! ```bash
//! h2ping example.net -p 8443 -o latency.txt
//! ```

/// Command-line configuration and validation.
pub mod configuration;
/// HTTP/2 connection state machine (sans-io subset).
pub mod connection;
/// HTTP/2 frame structures and serialization.
pub mod frames;
/// Event Processor: decodes inbound frames and emits latency samples.
pub mod receiver;
/// Probe Emitter: periodic PING transmission.
pub mod sender;
/// Session coordination and orderly shutdown.
pub mod session;
/// Latency sample collection and summary output.
pub mod stats;
/// Monotonic timestamp payload encoding.
pub mod time;
/// TLS transport establishment.
pub mod transport;

/// Top-level error type for connection establishment and session failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying socket or stream I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TLS handshake or configuration failure.
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),
    /// Invalid command-line configuration.
    #[error("configuration error: {0}")]
    Config(#[from] configuration::ConfigurationError),
}
