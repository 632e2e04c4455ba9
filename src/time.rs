//! Monotonic timestamps and their PING payload encoding.
//!
//! Probe payloads embed nanoseconds elapsed since a process-wide monotonic
//! origin. The peer echoes the payload opaquely, so only this process ever
//! interprets it and the origin never needs to be shared.

use std::sync::OnceLock;
use std::time::Instant;

/// Returns nanoseconds elapsed since the process-wide monotonic origin.
///
/// The origin is fixed the first time this is called, so all readings within
/// one run are mutually comparable.
pub fn monotonic_ns() -> u64 {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    let origin = *ORIGIN.get_or_init(Instant::now);
    origin.elapsed().as_nanos() as u64
}

/// Encodes a monotonic reading into an 8-byte big-endian PING payload.
pub fn encode_payload(ns: u64) -> [u8; 8] {
    ns.to_be_bytes()
}

/// Decodes a PING payload back into the embedded monotonic reading.
pub fn decode_payload(payload: [u8; 8]) -> u64 {
    u64::from_be_bytes(payload)
}

/// Computes the round-trip time in nanoseconds between a decoded send
/// timestamp and a receive timestamp.
///
/// A send timestamp ahead of the receive timestamp (clock anomaly or a
/// foreign payload) saturates to zero rather than wrapping, keeping samples
/// non-negative.
pub fn round_trip_ns(sent_ns: u64, received_ns: u64) -> u64 {
    received_ns.saturating_sub(sent_ns)
}

/// Converts nanoseconds to fractional milliseconds.
pub fn ns_to_ms(ns: u64) -> f64 {
    ns as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_ns_is_nondecreasing() {
        let a = monotonic_ns();
        let b = monotonic_ns();
        assert!(b >= a);
    }

    #[test]
    fn payload_roundtrip() {
        let ns = 1_234_567_890_123;
        assert_eq!(decode_payload(encode_payload(ns)), ns);
    }

    #[test]
    fn payload_is_big_endian() {
        assert_eq!(encode_payload(1), [0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn round_trip_saturates_on_future_timestamp() {
        assert_eq!(round_trip_ns(100, 50), 0);
        assert_eq!(round_trip_ns(50, 100), 50);
    }

    #[test]
    fn ns_to_ms_fractional() {
        assert_eq!(ns_to_ms(1_500_000), 1.5);
    }
}
