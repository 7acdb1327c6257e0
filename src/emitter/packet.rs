//! Wire framing for both channels.
//!
//! ```text
//! data      ┌──────────────────────────────┐
//!           │ angle: f32 LE (4 bytes, deg) │   no header / seq / checksum
//!           └──────────────────────────────┘
//! discovery ┌──────────────────────────────┐
//!           │ "DISCOVER" (8 ASCII bytes)   │
//!           └──────────────────────────────┘
//! ```
//!
//! Receivers tell the two apart by port and by payload length.

pub const DATA_PACKET_LEN: usize = 4;

/// Literal probe the receiving application listens for.
pub const DISCOVERY_PAYLOAD: &[u8] = b"DISCOVER";

/// Encode an angle (deg) as a data packet. Narrowed to f32 on the wire.
#[inline]
pub fn encode_angle(angle_deg: f64) -> [u8; DATA_PACKET_LEN] {
    (angle_deg as f32).to_le_bytes()
}

/// Decode a data packet; `None` unless the payload is exactly 4 bytes.
#[inline]
pub fn decode_angle(payload: &[u8]) -> Option<f32> {
    <[u8; DATA_PACKET_LEN]>::try_from(payload)
        .ok()
        .map(f32::from_le_bytes)
}

/// A datagram as a receiver would classify it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Packet {
    Angle(f32),
    Discovery,
}

impl Packet {
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload == DISCOVERY_PAYLOAD {
            Some(Packet::Discovery)
        } else {
            decode_angle(payload).map(Packet::Angle)
        }
    }
}
