// The reconciliation engine: the component that ties the wire codec,
// sequence tracker, entity store, prediction core, and input producer
// together into the single `process_tick()` loop. Converted from: spec
// §4.5 and §5, grounded on the way myq2-client's frame loop
// (drain network -> run prediction -> build outgoing commands) is spread
// across `cl_parse.rs`/`cl_pred.rs`/`cl_main.rs`, folded here into one
// cooperative, single-threaded entry point per spec §5.

use crate::config::EngineConfig;
use crate::debug::DebugInfo;
use crate::dispatcher::{dispatch, DispatchedMessage};
use crate::input::InputProducer;
use crate::prediction::{expected_samples, resize_segments, step_body, validate_drift, DriftOutcome};
use crate::sequence::SequenceTracker;
use crate::store::EntityStore;
use crate::transport::{Transport, TransportEvent};
use coil_protocol::{
    EntityEntry, FullUpdateMessage, ParseError, PartialUpdateMessage, Point2, PointsKind,
    SnakeSnapshotMessage, SnakeState,
};
use log::{debug, warn};
use std::collections::{HashMap, HashSet, VecDeque};

/// The client-side world reconciliation engine (spec §2's "heart" of the
/// core). Generic over the transport so tests can swap in a
/// `RecordingTransport`.
pub struct ReconciliationEngine<T: Transport> {
    store: EntityStore,
    tracker: SequenceTracker,
    input_producer: InputProducer,
    config: EngineConfig,
    transport: T,

    pending_inbound: VecDeque<TransportEvent>,

    pending_full_request: bool,
    pending_full_request_all_segments: bool,
    awaiting_player_rebuild: bool,

    snapshot_queue: VecDeque<u32>,
    snapshot_queued: HashSet<u32>,
    snapshot_cooldown_until: HashMap<u32, u32>,

    bad_packets_dropped: u64,
    current_frame: u32,
    loaded: bool,
    timed_out: bool,

    last_full_packet_bytes: usize,
    last_partial_packet_bytes: usize,
    last_full_payload_bytes: usize,
    last_partial_payload_bytes: usize,
}

impl<T: Transport> ReconciliationEngine<T> {
    /// Stands in for spec §6's `create(transport_config, server_id)`: takes
    /// an already-constructed transport rather than dialing one itself,
    /// since socket setup is outside this crate's scope.
    pub fn new(transport: T, config: EngineConfig) -> Self {
        Self {
            store: EntityStore::new(),
            tracker: SequenceTracker::new(),
            input_producer: InputProducer::new(),
            config,
            transport,
            pending_inbound: VecDeque::new(),
            pending_full_request: false,
            pending_full_request_all_segments: false,
            awaiting_player_rebuild: false,
            snapshot_queue: VecDeque::new(),
            snapshot_queued: HashSet::new(),
            snapshot_cooldown_until: HashMap::new(),
            bad_packets_dropped: 0,
            current_frame: 0,
            loaded: false,
            timed_out: false,
            last_full_packet_bytes: 0,
            last_partial_packet_bytes: 0,
            last_full_payload_bytes: 0,
            last_partial_payload_bytes: 0,
        }
    }

    /// Queue a transport event for the next `process_tick()` to drain.
    /// This is the hand-off point spec §5 describes: whatever delivered
    /// this (a background I/O thread, or a test) never touches engine
    /// state directly.
    pub fn push_inbound(&mut self, event: TransportEvent) {
        self.pending_inbound.push_back(event);
    }

    /// Convenience for tests and for a transport that hands over raw bytes
    /// directly instead of going through a `TransportEvent` queue.
    pub fn push_datagram(&mut self, bytes: Vec<u8>) {
        self.push_inbound(TransportEvent::Message(bytes));
    }

    pub fn set_destination(&mut self, destination: Point2) {
        self.input_producer.set_destination(destination);
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }

    pub fn get_server_frame(&self) -> u32 {
        self.tracker.last_server_seq()
    }

    pub fn get_player_snake(&self) -> Option<&crate::store::SnakeRecord> {
        self.store.player_snake()
    }

    /// `get_nearest_victims()` (spec §6): all snakes known to the engine
    /// except the player.
    pub fn get_nearest_victims(&self) -> Vec<&crate::store::SnakeRecord> {
        self.store
            .snakes()
            .filter(|s| !self.store.is_player(s.entity_id))
            .collect()
    }

    /// `get_nearest_foods()` (spec §6): all foods within the player's
    /// visibility-padded radius.
    pub fn get_nearest_foods(&self) -> Vec<&crate::store::FoodRecord> {
        let Some(player) = self.store.player_snake() else {
            return Vec::new();
        };
        let head = player.segments[0];
        let radius = self.config.visible_radius_with_padding(player.experience);
        let radius_sq = radius * radius;
        self.store
            .foods()
            .filter(|f| f.position.distance_squared(head) <= radius_sq)
            .collect()
    }

    pub fn get_debug_info(&self) -> DebugInfo {
        DebugInfo {
            foods_count: self.store.food_count(),
            snakes_count: self.store.snake_count(),
            last_full_packet_bytes: self.last_full_packet_bytes,
            last_partial_packet_bytes: self.last_partial_packet_bytes,
            last_full_payload_bytes: self.last_full_payload_bytes,
            last_partial_payload_bytes: self.last_partial_payload_bytes,
            last_server_seq: self.tracker.last_server_seq(),
            pending_full_request: self.pending_full_request,
            pending_full_request_all_segments: self.pending_full_request_all_segments,
            awaiting_player_rebuild: self.awaiting_player_rebuild,
            player_entity_id: self.store.player_entity_id(),
            bad_packets_dropped: self.bad_packets_dropped,
        }
    }

    /// `force_full_update_request()` (spec §6).
    pub fn force_full_update_request(&mut self) {
        self.pending_full_request = true;
        self.pending_full_request_all_segments = true;
        self.awaiting_player_rebuild = true;
    }

    fn raise_full_repair(&mut self) {
        self.pending_full_request = true;
        self.pending_full_request_all_segments = true;
    }

    /// `process_tick()` (spec §5): drain incoming datagrams, advance
    /// predictions, generate and emit outgoing datagrams, run TTL eviction
    /// — in that order, to completion, with no suspension points.
    pub fn process_tick(&mut self) {
        self.current_frame = self.current_frame.wrapping_add(1);

        while let Some(event) = self.pending_inbound.pop_front() {
            self.handle_event(event);
        }

        if self.input_producer.tick() {
            self.emit_outgoing();
        }

        self.run_ttl_eviction();
    }

    fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.store.clear();
                self.tracker.reset();
                self.pending_full_request = false;
                self.pending_full_request_all_segments = false;
                self.awaiting_player_rebuild = false;
                self.loaded = true;
                self.timed_out = false;
            }
            TransportEvent::Disconnected => {
                self.timed_out = true;
            }
            TransportEvent::ConnectionError(reason) => {
                warn!("transport connection error: {reason}");
            }
            TransportEvent::Message(bytes) => self.handle_datagram(&bytes),
        }
    }

    fn handle_datagram(&mut self, bytes: &[u8]) {
        match dispatch(bytes, &mut self.tracker) {
            Ok(DispatchedMessage::FullUpdate {
                seq,
                message,
                gap_detected,
            }) => {
                self.last_full_packet_bytes = bytes.len();
                self.last_full_payload_bytes = bytes.len().saturating_sub(coil_protocol::HEADER_LEN);
                self.apply_full_update(seq, message);
                if gap_detected {
                    self.raise_full_repair();
                }
            }
            Ok(DispatchedMessage::PartialUpdate {
                seq,
                message,
                gap_detected,
            }) => {
                self.last_partial_packet_bytes = bytes.len();
                self.last_partial_payload_bytes =
                    bytes.len().saturating_sub(coil_protocol::HEADER_LEN);
                self.apply_partial_update(seq, message);
                if gap_detected {
                    self.raise_full_repair();
                }
            }
            Ok(DispatchedMessage::SnakeSnapshot { seq, message }) => {
                self.apply_snake_snapshot(seq, message);
            }
            // Client-to-server message types arriving here would mean this
            // engine is embedded on the server side of the connection;
            // nothing in the client-side reconciliation engine consumes
            // them, so they're just noted and dropped.
            Ok(DispatchedMessage::ClientInput { .. })
            | Ok(DispatchedMessage::RequestFullUpdate { .. })
            | Ok(DispatchedMessage::RequestSnakeSnapshot { .. }) => {
                debug!("ignoring client-direction message received by client engine");
            }
            Err(err) => self.handle_parse_error(err),
        }
    }

    fn handle_parse_error(&mut self, err: ParseError) {
        self.bad_packets_dropped += 1;
        self.raise_full_repair();
        debug!("dropped malformed datagram: {err}");
    }

    /// Spec §4.5.1.
    fn apply_full_update(&mut self, seq: u32, message: FullUpdateMessage) {
        self.store.clear();
        self.store.set_current_seq(seq);
        self.store.set_player_entity_id(message.header.player_entity_id);

        for entry in message.entries {
            match entry {
                EntityEntry::Snake {
                    entity_id, state, ..
                } => {
                    if !state.is_full_segments_exact() {
                        self.bad_packets_dropped += 1;
                        self.raise_full_repair();
                        continue;
                    }
                    let _ = self.store.upsert_snake_full(entity_id, &state);
                }
                EntityEntry::Food { entity_id, state, .. } => {
                    self.store.upsert_food(entity_id, &state, true);
                }
                EntityEntry::Remove { kind, entity_id } => {
                    self.remove_by_kind(kind, entity_id);
                }
            }
        }

        if self.awaiting_player_rebuild {
            self.check_player_rebuild();
        }
    }

    /// Spec §4.5.2.
    fn apply_partial_update(&mut self, seq: u32, message: PartialUpdateMessage) {
        self.store.set_current_seq(seq);

        for entry in message.entries {
            match entry {
                EntityEntry::Remove { kind, entity_id } => {
                    self.remove_by_kind(kind, entity_id);
                }
                EntityEntry::Snake {
                    entity_id,
                    is_new,
                    state,
                } => self.apply_partial_snake(entity_id, is_new, state),
                EntityEntry::Food {
                    entity_id, state, ..
                } => {
                    self.store.upsert_food(entity_id, &state, false);
                }
            }
        }
    }

    fn apply_partial_snake(&mut self, entity_id: u32, is_new: bool, state: SnakeState) {
        if is_new {
            if !state.is_full_segments_exact() {
                self.bad_packets_dropped += 1;
                self.raise_full_repair();
                return;
            }
            let rebuilt_player = self.store.upsert_snake_full(entity_id, &state).unwrap_or(false);
            if rebuilt_player {
                self.check_player_rebuild();
            }
            return;
        }

        match state.points_kind {
            PointsKind::FullSegments if state.is_full_segments_exact() => {
                let rebuilt_player =
                    self.store.upsert_snake_full(entity_id, &state).unwrap_or(false);
                if rebuilt_player {
                    self.check_player_rebuild();
                }
            }
            PointsKind::FullSegments => {
                self.bad_packets_dropped += 1;
                self.raise_full_repair();
            }
            PointsKind::ValidationSamples => {
                self.apply_validation_samples(entity_id, state);
            }
        }
    }

    /// The player's own snake is never upserted from a validation-samples
    /// delta, only from a full-segments payload — it is driven by local
    /// prediction, not by stepping toward a server-reported head.
    fn apply_validation_samples(&mut self, entity_id: u32, state: SnakeState) {
        if self.store.is_player(entity_id) {
            return;
        }

        let Some(existing) = self.store.snake(entity_id) else {
            self.queue_snapshot_request(entity_id);
            return;
        };

        let mut segments = existing.segments.clone();
        step_body(&mut segments, state.head, self.config.step_distance);
        let target_len = self.config.target_segment_count(state.experience);
        resize_segments(&mut segments, target_len);

        let expected = expected_samples(&segments, self.config.base_part_radius);
        let outcome = validate_drift(&expected, &state.points, &self.config);

        self.store
            .apply_predicted_segments(entity_id, segments, state.experience);

        if outcome == DriftOutcome::Fail {
            self.queue_snapshot_request(entity_id);
        }
    }

    /// Spec §4.5.3: always full segments, bypasses the sequence tracker.
    fn apply_snake_snapshot(&mut self, _seq: u32, message: SnakeSnapshotMessage) {
        if !message.state.is_full_segments_exact() {
            self.bad_packets_dropped += 1;
            self.raise_full_repair();
            return;
        }
        let rebuilt_player = self
            .store
            .upsert_snake_full(message.entity_id, &message.state)
            .unwrap_or(false);
        self.snapshot_cooldown_until.remove(&message.entity_id);
        if rebuilt_player {
            self.check_player_rebuild();
        }
    }

    /// Spec §4.5.6: clears `awaiting_player_rebuild` only when the player's
    /// segments now match `total_segments` exactly; otherwise re-raises
    /// the repair flags.
    fn check_player_rebuild(&mut self) {
        let Some(player) = self.store.player_snake() else {
            self.raise_full_repair();
            return;
        };
        if player.segments.len() == player.total_segments as usize {
            self.awaiting_player_rebuild = false;
        } else {
            self.raise_full_repair();
        }
    }

    fn remove_by_kind(&mut self, kind: coil_protocol::EntityKind, entity_id: u32) {
        match kind {
            coil_protocol::EntityKind::Snake => self.store.remove_snake(entity_id),
            coil_protocol::EntityKind::Food => self.store.remove_food(entity_id),
        }
    }

    /// Spec §4.5.4: batched, cooldown-respecting per-snake repair requests.
    fn queue_snapshot_request(&mut self, entity_id: u32) {
        if let Some(&until) = self.snapshot_cooldown_until.get(&entity_id) {
            if self.current_frame < until {
                return;
            }
        }
        if self.snapshot_queued.insert(entity_id) {
            self.snapshot_queue.push_back(entity_id);
        }
    }

    fn emit_outgoing(&mut self) {
        let player_present = self.store.player_snake().is_some();
        let destination = player_present.then(|| self.input_producer.destination());

        let produced = self.input_producer.produce(
            destination,
            self.current_frame,
            self.pending_full_request,
            self.pending_full_request_all_segments,
            &mut self.snapshot_queue,
            &self.config,
        );

        for id in &produced.drained_snapshot_ids {
            self.snapshot_queued.remove(id);
            self.snapshot_cooldown_until
                .insert(*id, self.current_frame + self.config.snapshot_cooldown_frames);
        }

        if produced.consumed_full_request {
            self.pending_full_request = false;
            self.pending_full_request_all_segments = false;
        }

        for datagram in &produced.datagrams {
            self.transport.send(datagram);
        }
    }

    /// Spec §4.5.5: stale AND out-of-view, both conditions required.
    fn run_ttl_eviction(&mut self) {
        let Some(player) = self.store.player_snake() else {
            return;
        };
        let head = player.segments[0];
        let radius = self.config.visible_radius_with_padding(player.experience);
        let radius_sq = radius * radius;

        for id in self.store.stale_snake_ids(self.config.ttl_seq_delta) {
            if let Some(snake) = self.store.snake(id) {
                if snake.segments[0].distance_squared(head) > radius_sq {
                    self.store.remove_snake(id);
                }
            }
        }
        for id in self.store.stale_food_ids(self.config.ttl_seq_delta) {
            if let Some(food) = self.store.food(id) {
                if food.position.distance_squared(head) > radius_sq {
                    self.store.remove_food(id);
                }
            }
        }
    }
}
