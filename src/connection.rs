//! Sans-io HTTP/2 connection state machine, reduced to the subset the
//! latency test needs.
//!
//! The connection never opens a stream: it speaks the client preface,
//! SETTINGS, PING and GOAWAY, and skips everything else. Callers feed raw
//! inbound bytes with [`Connection::receive_data`] and forward whatever
//! [`Connection::data_to_send`] returns to the transport. Partial frames are
//! buffered across calls, so reads of arbitrary granularity are fine.

use crate::frames::{
    self, FrameHeader, FrameType, FLAG_ACK, FRAME_HEADER_SIZE, NO_ERROR, PING_PAYLOAD_SIZE,
};

/// Decoded connection-level events, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The peer acknowledged one of our PINGs; payload echoed verbatim.
    PingAckReceived { payload: [u8; PING_PAYLOAD_SIZE] },
    /// The peer sent its own PING; an ACK reply is expected promptly.
    PingReceived { payload: [u8; PING_PAYLOAD_SIZE] },
    /// The peer sent GOAWAY; the connection is ending.
    ConnectionTerminated {
        last_stream_id: u32,
        error_code: u32,
    },
    /// Anything else: unknown frame types, SETTINGS traffic, malformed PING
    /// payloads. Informational, never fatal.
    Other { description: String },
}

/// HTTP/2 connection state shared by both actors.
///
/// Outbound intents (`ping`, `ping_ack`, `close_connection`) queue bytes
/// internally; the caller drains them with `data_to_send` and writes them to
/// the transport under the session write lock.
#[derive(Debug, Default)]
pub struct Connection {
    /// Inbound bytes not yet forming a complete frame.
    inbound: Vec<u8>,
    /// Outbound bytes queued for the transport.
    outbound: Vec<u8>,
}

impl Connection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the connection preface and the initial SETTINGS frame. Must be
    /// flushed before any other data is sent.
    pub fn initiate(&mut self) {
        self.outbound.extend_from_slice(frames::PREFACE);
        self.outbound.extend_from_slice(&frames::settings_frame(false));
    }

    /// Queues a PING frame carrying the given probe payload.
    pub fn ping(&mut self, payload: [u8; PING_PAYLOAD_SIZE]) {
        self.outbound
            .extend_from_slice(&frames::ping_frame(payload, false));
    }

    /// Queues a PING ACK echoing a peer-initiated PING payload.
    pub fn ping_ack(&mut self, payload: [u8; PING_PAYLOAD_SIZE]) {
        self.outbound
            .extend_from_slice(&frames::ping_frame(payload, true));
    }

    /// Queues a graceful GOAWAY for the termination handshake.
    pub fn close_connection(&mut self) {
        self.outbound
            .extend_from_slice(&frames::goaway_frame(0, NO_ERROR));
    }

    /// Takes all bytes queued for the transport.
    pub fn data_to_send(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }

    /// Feeds raw inbound bytes and returns the decoded events in order.
    ///
    /// Inbound SETTINGS frames are acknowledged automatically; the ACK lands
    /// in the outbound queue and is picked up by the next `data_to_send`.
    pub fn receive_data(&mut self, data: &[u8]) -> Vec<Event> {
        self.inbound.extend_from_slice(data);

        let mut events = Vec::new();
        loop {
            if self.inbound.len() < FRAME_HEADER_SIZE {
                break;
            }
            // Header parse cannot fail at this length, but stay defensive.
            let header = match FrameHeader::from_bytes(&self.inbound) {
                Ok(h) => h,
                Err(_) => break,
            };
            let frame_end = FRAME_HEADER_SIZE + header.length as usize;
            if self.inbound.len() < frame_end {
                break;
            }
            let payload: Vec<u8> = self.inbound[FRAME_HEADER_SIZE..frame_end].to_vec();
            self.inbound.drain(..frame_end);
            events.push(self.dispatch(header, &payload));
        }
        events
    }

    fn dispatch(&mut self, header: FrameHeader, payload: &[u8]) -> Event {
        match header.frame_type {
            FrameType::Ping => self.on_ping(header, payload),
            FrameType::Settings => self.on_settings(header),
            FrameType::Goaway => on_goaway(payload),
            FrameType::Other(code) => Event::Other {
                description: format!(
                    "frame type 0x{:x} on stream {} ({} bytes)",
                    code,
                    header.stream_id,
                    payload.len()
                ),
            },
        }
    }

    fn on_ping(&mut self, header: FrameHeader, payload: &[u8]) -> Event {
        let ack = header.flags & FLAG_ACK != 0;
        // RFC 7540 requires exactly 8 octets. Anything else cannot carry one
        // of our probe payloads, so it is reported instead of processed.
        let Ok(payload) = <[u8; PING_PAYLOAD_SIZE]>::try_from(payload) else {
            return Event::Other {
                description: format!(
                    "PING{} with invalid {}-byte payload",
                    if ack { " ACK" } else { "" },
                    payload.len()
                ),
            };
        };
        if ack {
            Event::PingAckReceived { payload }
        } else {
            Event::PingReceived { payload }
        }
    }

    fn on_settings(&mut self, header: FrameHeader) -> Event {
        if header.flags & FLAG_ACK == 0 {
            // Settings contents are irrelevant to the test; acknowledge and
            // keep the defaults.
            self.outbound.extend_from_slice(&frames::settings_frame(true));
            Event::Other {
                description: format!("SETTINGS ({} bytes)", header.length),
            }
        } else {
            Event::Other {
                description: "SETTINGS ACK".to_string(),
            }
        }
    }
}

fn on_goaway(payload: &[u8]) -> Event {
    if payload.len() < 8 {
        return Event::Other {
            description: format!("GOAWAY with invalid {}-byte payload", payload.len()),
        };
    }
    let last_stream_id =
        u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) & 0x7FFF_FFFF;
    let error_code = u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
    Event::ConnectionTerminated {
        last_stream_id,
        error_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initiate_queues_preface_then_settings() {
        let mut conn = Connection::new();
        conn.initiate();
        let data = conn.data_to_send();
        assert!(data.starts_with(frames::PREFACE));
        let header = FrameHeader::from_bytes(&data[frames::PREFACE.len()..]).unwrap();
        assert_eq!(header.frame_type, FrameType::Settings);
        assert_eq!(header.flags, 0);
        // Queue is drained by the take.
        assert!(conn.data_to_send().is_empty());
    }

    #[test]
    fn ping_ack_decoded() {
        let mut conn = Connection::new();
        let payload = [9, 8, 7, 6, 5, 4, 3, 2];
        let events = conn.receive_data(&frames::ping_frame(payload, true));
        assert_eq!(events, vec![Event::PingAckReceived { payload }]);
    }

    #[test]
    fn peer_ping_decoded() {
        let mut conn = Connection::new();
        let payload = [1; 8];
        let events = conn.receive_data(&frames::ping_frame(payload, false));
        assert_eq!(events, vec![Event::PingReceived { payload }]);
    }

    #[test]
    fn partial_frame_buffers_across_reads() {
        let mut conn = Connection::new();
        let frame = frames::ping_frame([2; 8], true);
        assert!(conn.receive_data(&frame[..5]).is_empty());
        let events = conn.receive_data(&frame[5..]);
        assert_eq!(events, vec![Event::PingAckReceived { payload: [2; 8] }]);
    }

    #[test]
    fn settings_acknowledged_automatically() {
        let mut conn = Connection::new();
        let events = conn.receive_data(&frames::settings_frame(false));
        assert!(matches!(events.as_slice(), [Event::Other { .. }]));
        let reply = conn.data_to_send();
        let header = FrameHeader::from_bytes(&reply).unwrap();
        assert_eq!(header.frame_type, FrameType::Settings);
        assert_eq!(header.flags, FLAG_ACK);
    }

    #[test]
    fn settings_ack_not_reacknowledged() {
        let mut conn = Connection::new();
        conn.receive_data(&frames::settings_frame(true));
        assert!(conn.data_to_send().is_empty());
    }

    #[test]
    fn goaway_terminates() {
        let mut conn = Connection::new();
        let events = conn.receive_data(&frames::goaway_frame(3, 0x2));
        assert_eq!(
            events,
            vec![Event::ConnectionTerminated {
                last_stream_id: 3,
                error_code: 0x2,
            }]
        );
    }

    #[test]
    fn short_ping_payload_downgraded() {
        let mut conn = Connection::new();
        let header = FrameHeader {
            length: 4,
            frame_type: FrameType::Ping,
            flags: FLAG_ACK,
            stream_id: 0,
        };
        let mut raw = header.to_bytes().to_vec();
        raw.extend_from_slice(&[1, 2, 3, 4]);
        let events = conn.receive_data(&raw);
        match events.as_slice() {
            [Event::Other { description }] => {
                assert!(description.contains("4-byte"), "{}", description)
            }
            other => panic!("expected Other event, got {:?}", other),
        }
        // Nothing queued: a malformed PING gets no reply.
        assert!(conn.data_to_send().is_empty());
    }

    #[test]
    fn unknown_frame_skipped_and_stream_preserved() {
        let mut conn = Connection::new();
        let header = FrameHeader {
            length: 4,
            frame_type: FrameType::Other(0x8), // WINDOW_UPDATE
            flags: 0,
            stream_id: 0,
        };
        let mut raw = header.to_bytes().to_vec();
        raw.extend_from_slice(&[0, 1, 0, 0]);
        raw.extend_from_slice(&frames::ping_frame([3; 8], true));
        let events = conn.receive_data(&raw);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::Other { .. }));
        assert_eq!(events[1], Event::PingAckReceived { payload: [3; 8] });
    }

    #[test]
    fn multiple_events_in_wire_order() {
        let mut conn = Connection::new();
        let mut raw = frames::ping_frame([4; 8], true);
        raw.extend_from_slice(&frames::goaway_frame(0, 0));
        let events = conn.receive_data(&raw);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Event::PingAckReceived { payload: [4; 8] });
        assert!(matches!(events[1], Event::ConnectionTerminated { .. }));
    }
}
