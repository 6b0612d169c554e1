// Wire parsing error taxonomy. Converted from: spec §7 (error handling
// design). Plain enum, no `thiserror` — the teacher (mattx86-myq2-rust)
// never pulls in an error-derive crate either; it returns `Result<T, String>`
// or small hand-rolled enums (see myq2-client/src/cl_http.rs's
// `AsyncDownloadError`) and so do we.

use std::fmt;

/// Everything that can go wrong while decoding a datagram or a message
/// body. Every variant here maps directly to a row in spec §7's error
/// table; the caller decides what to do about it (drop the packet, raise
/// the repair flags, skip an entry) — this type only reports what failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Fewer bytes than `HEADER_LEN` were supplied.
    TooShort,
    /// `header.version` did not match `PROTOCOL_VERSION`.
    VersionMismatch,
    /// `HEADER_LEN + header.payload_bytes` exceeds the datagram length.
    SizeOutOfBounds,
    /// CRC-32 of the payload did not match `header.checksum`.
    ChecksumMismatch,
    /// An `EntityEntryHeader.type` byte did not name a known entity kind.
    UnknownEntityKind(u8),
    /// A `SnakeState.points_kind` byte did not name a known points kind.
    UnknownPointsKind(u8),
    /// `points_count` exceeded `total_segments`, or a `FullSegments` entry's
    /// `points_count` did not equal `total_segments` where the wire format
    /// requires equality.
    SegmentCountMismatch,
    /// A sanity bound from spec §4.1 was violated (`total_segments`,
    /// `experience`, or similar out of its allowed range).
    SanityBoundViolation(&'static str),
    /// The message header named a type this crate does not know how to
    /// route (spec §4.2: "classifies the message type, rejects malformed
    /// packets").
    UnknownMessageType(u16),
    /// The reader ran out of bytes mid-structure.
    UnexpectedEnd,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TooShort => write!(f, "datagram shorter than the message header"),
            ParseError::VersionMismatch => write!(f, "protocol version mismatch"),
            ParseError::SizeOutOfBounds => write!(f, "header + payload exceeds datagram size"),
            ParseError::ChecksumMismatch => write!(f, "payload checksum mismatch"),
            ParseError::UnknownEntityKind(b) => write!(f, "unknown entity kind byte {b}"),
            ParseError::UnknownPointsKind(b) => write!(f, "unknown points kind byte {b}"),
            ParseError::SegmentCountMismatch => write!(f, "points_count/total_segments mismatch"),
            ParseError::SanityBoundViolation(which) => write!(f, "sanity bound violated: {which}"),
            ParseError::UnknownMessageType(t) => write!(f, "unknown message type {t}"),
            ParseError::UnexpectedEnd => write!(f, "unexpected end of payload"),
        }
    }
}

impl std::error::Error for ParseError {}
