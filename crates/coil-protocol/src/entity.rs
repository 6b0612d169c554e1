// Entity entries carried inside FullUpdate/PartialUpdate/SnakeSnapshot
// bodies. Converted from: spec §4.1's entity entry / SnakeState / FoodState
// tables, in the style of myq2-game's bitflags-based entity flags
// (myq2-game/src/g_local.rs's `EntityFlags`).

use crate::constants::{MAX_EXPERIENCE, MAX_TOTAL_SEGMENTS};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::ParseError;
use crate::geometry::{Color, Point2};
use bitflags::bitflags;

bitflags! {
    /// Per-entry flags (spec §4.1: "bit 0 = New, bit 1 = Remove").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntryFlags: u8 {
        const NEW = 0b0000_0001;
        const REMOVE = 0b0000_0010;
    }
}

/// Which kind of entity an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntityKind {
    Snake = 1,
    Food = 2,
}

impl EntityKind {
    pub fn from_u8(v: u8) -> Result<Self, ParseError> {
        match v {
            1 => Ok(EntityKind::Snake),
            2 => Ok(EntityKind::Food),
            other => Err(ParseError::UnknownEntityKind(other)),
        }
    }
}

/// Whether a `SnakeState`'s point array is a full body or a sparse
/// validation sample (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PointsKind {
    FullSegments = 1,
    ValidationSamples = 2,
}

impl PointsKind {
    pub fn from_u8(v: u8) -> Result<Self, ParseError> {
        match v {
            1 => Ok(PointsKind::FullSegments),
            2 => Ok(PointsKind::ValidationSamples),
            other => Err(ParseError::UnknownPointsKind(other)),
        }
    }
}

/// `EntityEntryHeader { type, flags, entity_id }` (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityEntryHeader {
    pub kind: EntityKind,
    pub flags: EntryFlags,
    pub entity_id: u32,
}

impl EntityEntryHeader {
    pub(crate) fn write(self, w: &mut ByteWriter) {
        w.write_u8(self.kind as u8);
        w.write_u8(self.flags.bits());
        w.write_u32(self.entity_id);
    }

    pub(crate) fn read(r: &mut ByteReader) -> Result<Self, ParseError> {
        let kind = EntityKind::from_u8(r.read_u8()?)?;
        let flags = EntryFlags::from_bits_truncate(r.read_u8()?);
        let entity_id = r.read_u32()?;
        Ok(Self {
            kind,
            flags,
            entity_id,
        })
    }
}

/// `SnakeState` body, with its trailing point array already decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct SnakeState {
    pub head: Point2,
    pub experience: u32,
    pub points_kind: PointsKind,
    pub total_segments: u16,
    pub points: Vec<Point2>,
}

impl SnakeState {
    /// Sanity bounds from spec §4.1: `total_segments ∈ (0, 60000]`,
    /// `points_count ≤ total_segments`, `experience ≤ 5_000_000`.
    pub fn check_sanity(&self) -> Result<(), ParseError> {
        if self.total_segments == 0 || self.total_segments > MAX_TOTAL_SEGMENTS {
            return Err(ParseError::SanityBoundViolation("total_segments"));
        }
        if self.points.len() > self.total_segments as usize {
            return Err(ParseError::SanityBoundViolation("points_count"));
        }
        if self.experience > MAX_EXPERIENCE {
            return Err(ParseError::SanityBoundViolation("experience"));
        }
        Ok(())
    }

    /// True when this state carries exactly one point per authoritative
    /// segment, the shape required for full-segment application.
    pub fn is_full_segments_exact(&self) -> bool {
        self.points_kind == PointsKind::FullSegments
            && self.points.len() == self.total_segments as usize
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        self.head.write(w);
        w.write_u32(self.experience);
        w.write_u8(self.points_kind as u8);
        w.write_u16(self.points.len() as u16);
        w.write_u16(self.total_segments);
        for p in &self.points {
            p.write(w);
        }
    }

    pub(crate) fn read(r: &mut ByteReader) -> Result<Self, ParseError> {
        let head = Point2::read(r)?;
        let experience = r.read_u32()?;
        let points_kind = PointsKind::from_u8(r.read_u8()?)?;
        let points_count = r.read_u16()? as usize;
        let total_segments = r.read_u16()?;
        if points_count > total_segments as usize {
            return Err(ParseError::SegmentCountMismatch);
        }
        let mut points = Vec::with_capacity(points_count);
        for _ in 0..points_count {
            points.push(Point2::read(r)?);
        }
        let state = Self {
            head,
            experience,
            points_kind,
            total_segments,
            points,
        };
        state.check_sanity()?;
        Ok(state)
    }
}

/// `FoodState` body: no point array, immutable attributes (spec §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodState {
    pub position: Point2,
    pub power: u8,
    pub color: Color,
}

impl FoodState {
    pub(crate) fn write(&self, w: &mut ByteWriter) {
        self.position.write(w);
        w.write_u8(self.power);
        self.color.write(w);
    }

    pub(crate) fn read(r: &mut ByteReader) -> Result<Self, ParseError> {
        let position = Point2::read(r)?;
        let power = r.read_u8()?;
        let color = Color::read(r)?;
        Ok(Self {
            position,
            power,
            color,
        })
    }
}

/// One decoded entity entry: header plus body, body absent for `Remove`
/// entries (spec §4.1: "Remove overrides body reading: the entry has no
/// body").
#[derive(Debug, Clone, PartialEq)]
pub enum EntityEntry {
    Snake {
        entity_id: u32,
        is_new: bool,
        state: SnakeState,
    },
    Food {
        entity_id: u32,
        is_new: bool,
        state: FoodState,
    },
    Remove {
        kind: EntityKind,
        entity_id: u32,
    },
}

impl EntityEntry {
    pub(crate) fn write(&self, w: &mut ByteWriter) {
        match self {
            EntityEntry::Snake {
                entity_id,
                is_new,
                state,
            } => {
                let mut flags = EntryFlags::empty();
                if *is_new {
                    flags |= EntryFlags::NEW;
                }
                EntityEntryHeader {
                    kind: EntityKind::Snake,
                    flags,
                    entity_id: *entity_id,
                }
                .write(w);
                state.write(w);
            }
            EntityEntry::Food {
                entity_id,
                is_new,
                state,
            } => {
                let mut flags = EntryFlags::empty();
                if *is_new {
                    flags |= EntryFlags::NEW;
                }
                EntityEntryHeader {
                    kind: EntityKind::Food,
                    flags,
                    entity_id: *entity_id,
                }
                .write(w);
                state.write(w);
            }
            EntityEntry::Remove { kind, entity_id } => {
                EntityEntryHeader {
                    kind: *kind,
                    flags: EntryFlags::REMOVE,
                    entity_id: *entity_id,
                }
                .write(w);
            }
        }
    }

    pub(crate) fn read(r: &mut ByteReader) -> Result<Self, ParseError> {
        let header = EntityEntryHeader::read(r)?;
        if header.flags.contains(EntryFlags::REMOVE) {
            return Ok(EntityEntry::Remove {
                kind: header.kind,
                entity_id: header.entity_id,
            });
        }
        let is_new = header.flags.contains(EntryFlags::NEW);
        match header.kind {
            EntityKind::Snake => Ok(EntityEntry::Snake {
                entity_id: header.entity_id,
                is_new,
                state: SnakeState::read(r)?,
            }),
            EntityKind::Food => Ok(EntityEntry::Food {
                entity_id: header.entity_id,
                is_new,
                state: FoodState::read(r)?,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snake() -> SnakeState {
        SnakeState {
            head: Point2::new(1.0, 2.0),
            experience: 150,
            points_kind: PointsKind::FullSegments,
            total_segments: 3,
            points: vec![
                Point2::new(1.0, 2.0),
                Point2::new(1.0, 16.0),
                Point2::new(1.0, 30.0),
            ],
        }
    }

    #[test]
    fn snake_entry_round_trips() {
        let entry = EntityEntry::Snake {
            entity_id: 5,
            is_new: true,
            state: sample_snake(),
        };
        let mut w = ByteWriter::new();
        entry.write(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(EntityEntry::read(&mut r).unwrap(), entry);
    }

    #[test]
    fn food_entry_round_trips() {
        let entry = EntityEntry::Food {
            entity_id: 42,
            is_new: false,
            state: FoodState {
                position: Point2::new(-5.0, 5.0),
                power: 3,
                color: Color {
                    r: 1,
                    g: 2,
                    b: 3,
                    a: 255,
                },
            },
        };
        let mut w = ByteWriter::new();
        entry.write(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(EntityEntry::read(&mut r).unwrap(), entry);
    }

    #[test]
    fn remove_entry_has_no_body() {
        let entry = EntityEntry::Remove {
            kind: EntityKind::Food,
            entity_id: 7,
        };
        let mut w = ByteWriter::new();
        entry.write(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 6);
        let mut r = ByteReader::new(&bytes);
        assert_eq!(EntityEntry::read(&mut r).unwrap(), entry);
    }

    #[test]
    fn points_count_over_total_segments_is_rejected() {
        let mut w = ByteWriter::new();
        Point2::new(0.0, 0.0).write(&mut w);
        w.write_u32(0);
        w.write_u8(PointsKind::FullSegments as u8);
        w.write_u16(2); // points_count
        w.write_u16(1); // total_segments
        Point2::new(0.0, 0.0).write(&mut w);
        Point2::new(0.0, 0.0).write(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(
            SnakeState::read(&mut r),
            Err(ParseError::SegmentCountMismatch)
        );
    }

    #[test]
    fn total_segments_over_bound_is_rejected() {
        let mut w = ByteWriter::new();
        Point2::new(0.0, 0.0).write(&mut w);
        w.write_u32(0);
        w.write_u8(PointsKind::FullSegments as u8);
        w.write_u16(0);
        w.write_u16(u16::MAX);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(
            SnakeState::read(&mut r),
            Err(ParseError::SanityBoundViolation("total_segments"))
        );
    }
}
