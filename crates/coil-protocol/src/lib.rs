//! Binary wire codec for the state-replication protocol: header framing,
//! entity entries, and the six message bodies. Owns no state — see
//! `coil-engine` for the client-side reconciliation engine built on top of
//! this crate.

pub mod checksum;
pub mod constants;
pub mod cursor;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod header;
pub mod messages;

pub use constants::*;
pub use entity::{EntityEntry, EntityEntryHeader, EntityKind, EntryFlags, FoodState, PointsKind, SnakeState};
pub use error::ParseError;
pub use geometry::{Color, Point2};
pub use header::{build_datagram, parse_header, MessageHeader, MessageType, ParsedDatagram};
pub use messages::{
    decode_datagram, ClientInputPayload, FullUpdateHeader, FullUpdateMessage, Message,
    PartialUpdateMessage, RequestFullUpdateFlags, RequestFullUpdatePayload,
    RequestSnakeSnapshotPayload, SnakeSnapshotMessage,
};
