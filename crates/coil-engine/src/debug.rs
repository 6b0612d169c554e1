// Diagnostics snapshot exposed to the rendering/controller layer. Converted
// from: spec §6 ("get_debug_info"), field list supplemented from
// original_source/src/services/game/game_client.cpp's debug overlay, which
// tracks the same counters this engine needs to reproduce (packet sizes,
// pending-flag state, dropped-packet count).

/// A read-only snapshot of the engine's internal bookkeeping, for overlays
/// and diagnostics. Nothing here is load-bearing for replication itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugInfo {
    pub foods_count: usize,
    pub snakes_count: usize,
    pub last_full_packet_bytes: usize,
    pub last_partial_packet_bytes: usize,
    pub last_full_payload_bytes: usize,
    pub last_partial_payload_bytes: usize,
    pub last_server_seq: u32,
    pub pending_full_request: bool,
    pub pending_full_request_all_segments: bool,
    pub awaiting_player_rebuild: bool,
    pub player_entity_id: Option<u32>,
    pub bad_packets_dropped: u64,
}
