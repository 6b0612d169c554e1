// Client-to-server emission cadence. Converted from: spec §4.7, mirroring
// the way myq2-client's frame loop gates `CL_SendCmd` to a fixed cadence
// rather than firing on every render frame.

use crate::config::EngineConfig;
use coil_protocol::{
    ClientInputPayload, Point2, RequestFullUpdateFlags, RequestFullUpdatePayload,
    RequestSnakeSnapshotPayload,
};
use std::collections::VecDeque;

/// What `InputProducer::produce` sent this emission, so the engine knows
/// which of its own flags to clear.
#[derive(Debug, Default)]
pub struct ProducedInputs {
    pub datagrams: Vec<Vec<u8>>,
    pub consumed_full_request: bool,
    pub drained_snapshot_ids: Vec<u32>,
}

/// Emits `ClientInput`, `RequestFullUpdate`, and `RequestSnakeSnapshot`
/// datagrams at a fixed cadence, owning only the outgoing sequence counter
/// (spec §5: "Outgoing sequence number is owned by the input producer").
#[derive(Debug, Default)]
pub struct InputProducer {
    last_input_seq: u32,
    ticks_since_emission: u32,
    destination: Point2,
}

impl InputProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_input_seq(&self) -> u32 {
        self.last_input_seq
    }

    /// The player's movement destination, set by the local input layer.
    /// Authoritative only for the player's own snake (spec §3): the engine
    /// reads this when encoding a `ClientInput` but never for remote
    /// snakes, whose destination field has no wire representation.
    pub fn destination(&self) -> Point2 {
        self.destination
    }

    pub fn set_destination(&mut self, destination: Point2) {
        self.destination = destination;
    }

    fn next_seq(&mut self) -> u32 {
        self.last_input_seq = self.last_input_seq.wrapping_add(1);
        self.last_input_seq
    }

    /// Called once per simulation tick; returns true on ticks where input
    /// should actually be emitted (every other tick, spec §4.7: "the
    /// simulation runs at 64 Hz; input is emitted every other tick").
    pub fn tick(&mut self) -> bool {
        self.ticks_since_emission += 1;
        if self.ticks_since_emission >= 2 {
            self.ticks_since_emission = 0;
            true
        } else {
            false
        }
    }

    /// Build this emission's datagrams (spec §4.7 steps 1-3). The caller
    /// owns `pending_full_request`/`pending_full_request_all_segments` and
    /// the per-snake snapshot queue; this only decides what to send and
    /// reports what it consumed.
    #[allow(clippy::too_many_arguments)]
    pub fn produce(
        &mut self,
        player_destination: Option<Point2>,
        client_frame: u32,
        pending_full_request: bool,
        pending_full_request_all_segments: bool,
        snapshot_queue: &mut VecDeque<u32>,
        config: &EngineConfig,
    ) -> ProducedInputs {
        let mut out = ProducedInputs::default();

        if let Some(destination) = player_destination {
            let payload = ClientInputPayload {
                destination_x: destination.x,
                destination_y: destination.y,
                client_frame,
            };
            out.datagrams.push(payload.encode(self.next_seq()));
        }

        if pending_full_request {
            let mut flags = RequestFullUpdateFlags::empty();
            if pending_full_request_all_segments {
                flags |= RequestFullUpdateFlags::ALL_SEGMENTS;
            }
            let payload = RequestFullUpdatePayload { flags };
            out.datagrams.push(payload.encode(self.next_seq()));
            out.consumed_full_request = true;
        }

        for _ in 0..config.snapshot_requests_per_tick {
            let Some(entity_id) = snapshot_queue.pop_front() else {
                break;
            };
            let payload = RequestSnakeSnapshotPayload { entity_id };
            out.datagrams.push(payload.encode(self.next_seq()));
            out.drained_snapshot_ids.push(entity_id);
        }

        out
    }
}
