// Fixed 16-byte message header. Converted from: spec §4.1's header table,
// in the spirit of myq2-common/src/net_chan.rs's `netchan_process`, which
// also reads a small fixed header off the front of a datagram before
// anything else happens.

use crate::checksum::checksum;
use crate::constants::{HEADER_LEN, PROTOCOL_VERSION};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::ParseError;

/// Enumerated wire message type (spec §4.1's message type table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum MessageType {
    FullUpdate = 1,
    PartialUpdate = 2,
    SnakeSnapshot = 3,
    ClientInput = 4,
    RequestFullUpdate = 5,
    RequestSnakeSnapshot = 6,
}

impl MessageType {
    pub fn from_u16(v: u16) -> Result<Self, ParseError> {
        match v {
            1 => Ok(MessageType::FullUpdate),
            2 => Ok(MessageType::PartialUpdate),
            3 => Ok(MessageType::SnakeSnapshot),
            4 => Ok(MessageType::ClientInput),
            5 => Ok(MessageType::RequestFullUpdate),
            6 => Ok(MessageType::RequestSnakeSnapshot),
            other => Err(ParseError::UnknownMessageType(other)),
        }
    }
}

/// The 16-byte fixed header, little-endian, preceding every message's
/// payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub msg_type: u16,
    pub version: u16,
    pub seq: u32,
    pub payload_bytes: u32,
    pub checksum: u32,
}

/// A parsed header paired with the payload slice it was validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDatagram<'a> {
    pub header: MessageHeader,
    pub payload: &'a [u8],
}

/// Parse and validate a datagram's header per spec §4.1's parsing contract:
/// checks length, protocol version, declared-size-vs-actual-size, and the
/// payload checksum, in that order. Any failure here means the whole
/// datagram is unusable.
pub fn parse_header(bytes: &[u8]) -> Result<ParsedDatagram<'_>, ParseError> {
    if bytes.len() < HEADER_LEN {
        return Err(ParseError::TooShort);
    }

    let mut r = ByteReader::new(&bytes[..HEADER_LEN]);
    let msg_type = r.read_u16()?;
    let version = r.read_u16()?;
    let seq = r.read_u32()?;
    let payload_bytes = r.read_u32()?;
    let declared_checksum = r.read_u32()?;

    if version != PROTOCOL_VERSION {
        return Err(ParseError::VersionMismatch);
    }

    let total = HEADER_LEN + payload_bytes as usize;
    if total > bytes.len() {
        return Err(ParseError::SizeOutOfBounds);
    }

    let payload = &bytes[HEADER_LEN..total];
    if checksum(payload) != declared_checksum {
        return Err(ParseError::ChecksumMismatch);
    }

    Ok(ParsedDatagram {
        header: MessageHeader {
            msg_type,
            version,
            seq,
            payload_bytes,
            checksum: declared_checksum,
        },
        payload,
    })
}

/// Build a full datagram (header + payload) for `msg_type`/`seq`, stamping
/// the checksum over `payload`. This is the single place that owns the
/// header's wire layout on the encode side.
pub fn build_datagram(msg_type: MessageType, seq: u32, payload: &[u8]) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(HEADER_LEN + payload.len());
    w.write_u16(msg_type as u16);
    w.write_u16(PROTOCOL_VERSION);
    w.write_u32(seq);
    w.write_u32(payload.len() as u32);
    w.write_u32(checksum(payload));
    w.write_bytes(payload);
    w.into_bytes()
}
