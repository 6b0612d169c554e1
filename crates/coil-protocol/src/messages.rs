// The six message bodies, plus header+checksum-wrapped encode/decode.
// Converted from: spec §4.1's message type table.

use crate::cursor::{ByteReader, ByteWriter};
use crate::entity::{EntityEntry, EntityKind, SnakeState};
use crate::error::ParseError;
use crate::header::{build_datagram, parse_header, MessageType};
use bitflags::bitflags;

/// The recipient-specific header prefixing a `FullUpdate`'s entity entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullUpdateHeader {
    pub player_entity_id: u32,
}

/// `FullUpdate`: a complete snapshot of everything visible to one client.
#[derive(Debug, Clone, PartialEq)]
pub struct FullUpdateMessage {
    pub header: FullUpdateHeader,
    pub entries: Vec<EntityEntry>,
}

impl FullUpdateMessage {
    pub fn encode(&self, seq: u32) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_u32(self.header.player_entity_id);
        for entry in &self.entries {
            entry.write(&mut w);
        }
        build_datagram(MessageType::FullUpdate, seq, &w.into_bytes())
    }

    pub fn decode_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let mut r = ByteReader::new(payload);
        let player_entity_id = r.read_u32()?;
        let mut entries = Vec::new();
        while !r.is_empty() {
            entries.push(EntityEntry::read(&mut r)?);
        }
        Ok(Self {
            header: FullUpdateHeader { player_entity_id },
            entries,
        })
    }
}

/// `PartialUpdate`: zero or more entity entries, no recipient header.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdateMessage {
    pub entries: Vec<EntityEntry>,
}

impl PartialUpdateMessage {
    pub fn encode(&self, seq: u32) -> Vec<u8> {
        let mut w = ByteWriter::new();
        for entry in &self.entries {
            entry.write(&mut w);
        }
        build_datagram(MessageType::PartialUpdate, seq, &w.into_bytes())
    }

    pub fn decode_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let mut r = ByteReader::new(payload);
        let mut entries = Vec::new();
        while !r.is_empty() {
            entries.push(EntityEntry::read(&mut r)?);
        }
        Ok(Self { entries })
    }
}

/// `SnakeSnapshot`: exactly one snake entity entry with full segments.
#[derive(Debug, Clone, PartialEq)]
pub struct SnakeSnapshotMessage {
    pub entity_id: u32,
    pub state: SnakeState,
}

impl SnakeSnapshotMessage {
    pub fn encode(&self, seq: u32) -> Vec<u8> {
        let mut w = ByteWriter::new();
        let entry = EntityEntry::Snake {
            entity_id: self.entity_id,
            is_new: true,
            state: self.state.clone(),
        };
        entry.write(&mut w);
        build_datagram(MessageType::SnakeSnapshot, seq, &w.into_bytes())
    }

    pub fn decode_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let mut r = ByteReader::new(payload);
        match EntityEntry::read(&mut r)? {
            EntityEntry::Snake {
                entity_id, state, ..
            } => Ok(Self { entity_id, state }),
            _ => Err(ParseError::UnknownEntityKind(EntityKind::Food as u8)),
        }
    }
}

/// `ClientInputPayload`: the player's movement destination for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientInputPayload {
    pub destination_x: f32,
    pub destination_y: f32,
    pub client_frame: u32,
}

impl ClientInputPayload {
    pub fn encode(&self, seq: u32) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_f32(self.destination_x);
        w.write_f32(self.destination_y);
        w.write_u32(self.client_frame);
        build_datagram(MessageType::ClientInput, seq, &w.into_bytes())
    }

    pub fn decode_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let mut r = ByteReader::new(payload);
        Ok(Self {
            destination_x: r.read_f32()?,
            destination_y: r.read_f32()?,
            client_frame: r.read_u32()?,
        })
    }
}

bitflags! {
    /// `RequestFullUpdatePayload`'s flag bitset (spec §4.5.4).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RequestFullUpdateFlags: u8 {
        const ALL_SEGMENTS = 0b0000_0001;
    }
}

/// `RequestFullUpdate`: client asks the server to resend the whole world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFullUpdatePayload {
    pub flags: RequestFullUpdateFlags,
}

impl RequestFullUpdatePayload {
    pub fn encode(&self, seq: u32) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_u8(self.flags.bits());
        build_datagram(MessageType::RequestFullUpdate, seq, &w.into_bytes())
    }

    pub fn decode_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let mut r = ByteReader::new(payload);
        let flags = RequestFullUpdateFlags::from_bits_truncate(r.read_u8()?);
        Ok(Self { flags })
    }
}

/// `RequestSnakeSnapshot`: client asks for one snake's authoritative body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSnakeSnapshotPayload {
    pub entity_id: u32,
}

impl RequestSnakeSnapshotPayload {
    pub fn encode(&self, seq: u32) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_u32(self.entity_id);
        build_datagram(MessageType::RequestSnakeSnapshot, seq, &w.into_bytes())
    }

    pub fn decode_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let mut r = ByteReader::new(payload);
        Ok(Self {
            entity_id: r.read_u32()?,
        })
    }
}

/// A decoded datagram, header consumed, payload dispatched to its typed
/// body. This is the output of the message dispatcher (spec §4.2).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    FullUpdate { seq: u32, message: FullUpdateMessage },
    PartialUpdate { seq: u32, message: PartialUpdateMessage },
    SnakeSnapshot { seq: u32, message: SnakeSnapshotMessage },
    ClientInput { seq: u32, payload: ClientInputPayload },
    RequestFullUpdate { seq: u32, payload: RequestFullUpdatePayload },
    RequestSnakeSnapshot { seq: u32, payload: RequestSnakeSnapshotPayload },
}

/// Parse a raw datagram (header + payload) into a classified `Message`.
/// Equivalent to spec §4.2's "parse the header; classify" step, folded
/// together with the per-type body decode since both can fail the same
/// way (drop + repair).
pub fn decode_datagram(bytes: &[u8]) -> Result<Message, ParseError> {
    let parsed = parse_header(bytes)?;
    let seq = parsed.header.seq;
    let msg_type = MessageType::from_u16(parsed.header.msg_type)?;
    match msg_type {
        MessageType::FullUpdate => Ok(Message::FullUpdate {
            seq,
            message: FullUpdateMessage::decode_payload(parsed.payload)?,
        }),
        MessageType::PartialUpdate => Ok(Message::PartialUpdate {
            seq,
            message: PartialUpdateMessage::decode_payload(parsed.payload)?,
        }),
        MessageType::SnakeSnapshot => Ok(Message::SnakeSnapshot {
            seq,
            message: SnakeSnapshotMessage::decode_payload(parsed.payload)?,
        }),
        MessageType::ClientInput => Ok(Message::ClientInput {
            seq,
            payload: ClientInputPayload::decode_payload(parsed.payload)?,
        }),
        MessageType::RequestFullUpdate => Ok(Message::RequestFullUpdate {
            seq,
            payload: RequestFullUpdatePayload::decode_payload(parsed.payload)?,
        }),
        MessageType::RequestSnakeSnapshot => Ok(Message::RequestSnakeSnapshot {
            seq,
            payload: RequestSnakeSnapshotPayload::decode_payload(parsed.payload)?,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PointsKind;
    use crate::geometry::Point2;

    fn sample_snake_state() -> SnakeState {
        SnakeState {
            head: Point2::new(0.0, 0.0),
            experience: 100,
            points_kind: PointsKind::FullSegments,
            total_segments: 2,
            points: vec![Point2::new(0.0, 0.0), Point2::new(0.0, 14.0)],
        }
    }

    #[test]
    fn full_update_round_trips() {
        let msg = FullUpdateMessage {
            header: FullUpdateHeader {
                player_entity_id: 5,
            },
            entries: vec![
                EntityEntry::Snake {
                    entity_id: 5,
                    is_new: true,
                    state: sample_snake_state(),
                },
                EntityEntry::Food {
                    entity_id: 10,
                    is_new: true,
                    state: crate::entity::FoodState {
                        position: Point2::new(1.0, 1.0),
                        power: 1,
                        color: crate::geometry::Color {
                            r: 0,
                            g: 0,
                            b: 0,
                            a: 255,
                        },
                    },
                },
            ],
        };
        let datagram = msg.encode(1);
        match decode_datagram(&datagram).unwrap() {
            Message::FullUpdate { seq, message } => {
                assert_eq!(seq, 1);
                assert_eq!(message, msg);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn partial_update_with_only_removes_round_trips() {
        let msg = PartialUpdateMessage {
            entries: vec![EntityEntry::Remove {
                kind: EntityKind::Food,
                entity_id: 10,
            }],
        };
        let datagram = msg.encode(2);
        match decode_datagram(&datagram).unwrap() {
            Message::PartialUpdate { message, .. } => assert_eq!(message, msg),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn snake_snapshot_round_trips() {
        let msg = SnakeSnapshotMessage {
            entity_id: 5,
            state: sample_snake_state(),
        };
        let datagram = msg.encode(3);
        match decode_datagram(&datagram).unwrap() {
            Message::SnakeSnapshot { message, .. } => assert_eq!(message, msg),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn client_input_round_trips() {
        let payload = ClientInputPayload {
            destination_x: 1.0,
            destination_y: -1.0,
            client_frame: 99,
        };
        let datagram = payload.encode(4);
        match decode_datagram(&datagram).unwrap() {
            Message::ClientInput { payload: p, .. } => assert_eq!(p, payload),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn request_full_update_round_trips() {
        let payload = RequestFullUpdatePayload {
            flags: RequestFullUpdateFlags::ALL_SEGMENTS,
        };
        let datagram = payload.encode(5);
        match decode_datagram(&datagram).unwrap() {
            Message::RequestFullUpdate { payload: p, .. } => assert_eq!(p, payload),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn request_snake_snapshot_round_trips() {
        let payload = RequestSnakeSnapshotPayload { entity_id: 5 };
        let datagram = payload.encode(6);
        match decode_datagram(&datagram).unwrap() {
            Message::RequestSnakeSnapshot { payload: p, .. } => assert_eq!(p, payload),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let datagram = build_datagram_with_raw_type(99, 1, &[]);
        assert_eq!(
            decode_datagram(&datagram),
            Err(ParseError::UnknownMessageType(99))
        );
    }

    fn build_datagram_with_raw_type(msg_type: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
        use crate::checksum::checksum;
        let mut w = ByteWriter::new();
        w.write_u16(msg_type);
        w.write_u16(crate::constants::PROTOCOL_VERSION);
        w.write_u32(seq);
        w.write_u32(payload.len() as u32);
        w.write_u32(checksum(payload));
        w.write_bytes(payload);
        w.into_bytes()
    }
}
