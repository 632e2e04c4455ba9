//! HTTP/2 frame structures as defined in RFC 7540.
//!
//! This module contains the frame header format plus builders for the three
//! frame types the latency test exchanges: SETTINGS, PING and GOAWAY. All
//! serialization is explicit big-endian.

/// Client connection preface, sent before any frame (RFC 7540 Section 3.5).
pub const PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Size of the fixed frame header in bytes.
pub const FRAME_HEADER_SIZE: usize = 9;

/// Required payload size of a PING frame (RFC 7540 Section 6.7).
pub const PING_PAYLOAD_SIZE: usize = 8;

/// ACK flag, shared by SETTINGS and PING frames.
pub const FLAG_ACK: u8 = 0x1;

/// GOAWAY error code for graceful shutdown.
pub const NO_ERROR: u32 = 0x0;

/// Frame types relevant to the latency test. Everything else is carried as
/// `Other` and skipped by the connection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Settings,
    Ping,
    Goaway,
    Other(u8),
}

impl From<u8> for FrameType {
    fn from(v: u8) -> Self {
        match v {
            0x4 => FrameType::Settings,
            0x6 => FrameType::Ping,
            0x7 => FrameType::Goaway,
            other => FrameType::Other(other),
        }
    }
}

impl From<FrameType> for u8 {
    fn from(t: FrameType) -> Self {
        match t {
            FrameType::Settings => 0x4,
            FrameType::Ping => 0x6,
            FrameType::Goaway => 0x7,
            FrameType::Other(other) => other,
        }
    }
}

/// Fixed 9-byte header preceding every HTTP/2 frame.
///
/// Wire format (RFC 7540 Section 4.1):
/// ```text
///  +-----------------------------------------------+
///  |                 Length (24)                   |
///  +---------------+---------------+---------------+
///  |   Type (8)    |   Flags (8)   |
///  +-+-------------+---------------+-------------------------------+
///  |R|                 Stream Identifier (31)                      |
///  +=+=============================================================+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload length in bytes (24-bit on the wire).
    pub length: u32,
    /// Frame type code.
    pub frame_type: FrameType,
    /// Type-specific flags.
    pub flags: u8,
    /// Stream identifier; 0 for connection-level frames.
    pub stream_id: u32,
}

impl FrameHeader {
    /// Serializes the header to its 9-byte wire format.
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut buf = [0u8; FRAME_HEADER_SIZE];
        buf[0..3].copy_from_slice(&self.length.to_be_bytes()[1..4]);
        buf[3] = self.frame_type.into();
        buf[4] = self.flags;
        buf[5..9].copy_from_slice(&(self.stream_id & 0x7FFF_FFFF).to_be_bytes());
        buf
    }

    /// Deserializes a header from big-endian wire format.
    ///
    /// # Errors
    /// Returns an error if the buffer is smaller than 9 bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, &'static str> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Err("Buffer too small for FrameHeader");
        }
        let length = u32::from_be_bytes([0, buf[0], buf[1], buf[2]]);
        let stream_id = u32::from_be_bytes([buf[5], buf[6], buf[7], buf[8]]) & 0x7FFF_FFFF;
        Ok(Self {
            length,
            frame_type: FrameType::from(buf[3]),
            flags: buf[4],
            stream_id,
        })
    }
}

/// Builds an empty SETTINGS frame, optionally carrying the ACK flag.
pub fn settings_frame(ack: bool) -> Vec<u8> {
    let header = FrameHeader {
        length: 0,
        frame_type: FrameType::Settings,
        flags: if ack { FLAG_ACK } else { 0 },
        stream_id: 0,
    };
    header.to_bytes().to_vec()
}

/// Builds a PING frame carrying the given opaque payload.
pub fn ping_frame(payload: [u8; PING_PAYLOAD_SIZE], ack: bool) -> Vec<u8> {
    let header = FrameHeader {
        length: PING_PAYLOAD_SIZE as u32,
        frame_type: FrameType::Ping,
        flags: if ack { FLAG_ACK } else { 0 },
        stream_id: 0,
    };
    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + PING_PAYLOAD_SIZE);
    buf.extend_from_slice(&header.to_bytes());
    buf.extend_from_slice(&payload);
    buf
}

/// Builds a GOAWAY frame.
///
/// Wire format of the payload (RFC 7540 Section 6.8):
/// ```text
///  +-+-------------------------------------------------------------+
///  |R|                  Last-Stream-ID (31)                        |
///  +-+-------------------------------------------------------------+
///  |                      Error Code (32)                          |
///  +---------------------------------------------------------------+
/// ```
pub fn goaway_frame(last_stream_id: u32, error_code: u32) -> Vec<u8> {
    let header = FrameHeader {
        length: 8,
        frame_type: FrameType::Goaway,
        flags: 0,
        stream_id: 0,
    };
    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + 8);
    buf.extend_from_slice(&header.to_bytes());
    buf.extend_from_slice(&(last_stream_id & 0x7FFF_FFFF).to_be_bytes());
    buf.extend_from_slice(&error_code.to_be_bytes());
    buf
}
