// Wire-format constants. Converted from: spec §4.1 (header layout and
// sanity bounds).

/// Protocol version carried in every message header. A mismatch means the
/// peer is running an incompatible build and the packet is dropped.
pub const PROTOCOL_VERSION: u16 = 1;

/// Size in bytes of the fixed message header (type, version, seq,
/// payload_bytes, checksum).
pub const HEADER_LEN: usize = 16;

/// Reserved entity id meaning "none".
pub const ENTITY_ID_NONE: u32 = 0;

/// Sanity bounds on `SnakeState.total_segments` (exclusive of 0).
pub const MAX_TOTAL_SEGMENTS: u16 = 60_000;

/// Sanity bound on `SnakeState.experience`.
pub const MAX_EXPERIENCE: u32 = 5_000_000;

/// Default number of per-snake snapshot requests drained per tick.
pub const DEFAULT_SNAPSHOT_REQUESTS_PER_TICK: usize = 16;

/// Default cooldown, in frames, before a snapshot can be re-requested for
/// the same entity.
pub const DEFAULT_SNAPSHOT_COOLDOWN_FRAMES: u32 = 64;

/// Default number of missed sequence numbers before a stale+out-of-view
/// entity is evicted.
pub const DEFAULT_TTL_SEQ_DELTA: u32 = 8;
