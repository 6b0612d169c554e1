// In-memory indexed entity collection. Converted from: spec §4.4, in the
// spirit of myq2-client/src/cl_ents.rs's `entity_state_t` array indexed by
// entity number, but keyed by id in a map rather than a fixed-size array
// since ids are not densely packed here.

use coil_protocol::{Color, FoodState, Point2, SnakeState};
use std::collections::HashMap;

/// A locally-tracked snake. Carries both the wire-replicated fields and the
/// fields the wire format omits (`display_name`, `creation_frame`,
/// `destination`) — see the repo's design notes for how those are sourced.
#[derive(Debug, Clone, PartialEq)]
pub struct SnakeRecord {
    pub entity_id: u32,
    pub display_name: String,
    pub experience: u32,
    pub segments: Vec<Point2>,
    pub total_segments: u16,
    pub creation_frame: u32,
    pub destination: Point2,
    pub last_seen_seq: u32,
    pub snapshot_cooldown_until_frame: u32,
    pub killed_at_frame: Option<u32>,
}

impl SnakeRecord {
    fn from_full(id: u32, state: &SnakeState, creation_frame: u32, last_seen_seq: u32) -> Self {
        let head = *state.points.first().unwrap_or(&state.head);
        Self {
            entity_id: id,
            display_name: String::new(),
            experience: state.experience,
            segments: state.points.clone(),
            total_segments: state.total_segments,
            creation_frame,
            destination: head,
            last_seen_seq,
            snapshot_cooldown_until_frame: 0,
            killed_at_frame: None,
        }
    }
}

/// A locally-tracked food. Immutable after creation per spec §3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodRecord {
    pub entity_id: u32,
    pub position: Point2,
    pub color: Color,
    pub power: u8,
    pub last_seen_seq: u32,
}

impl FoodRecord {
    fn from_state(id: u32, state: &FoodState, last_seen_seq: u32) -> Self {
        Self {
            entity_id: id,
            position: state.position,
            color: state.color,
            power: state.power,
            last_seen_seq,
        }
    }
}

/// Raised when `upsert_snake_full` is asked to install a body whose length
/// doesn't match the declared segment count (spec §4.4: "drop + repair
/// otherwise").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentCountMismatch;

/// The in-memory world. Owns every entity record; nothing outside the
/// reconciliation engine mutates it (spec §5).
#[derive(Debug, Default)]
pub struct EntityStore {
    snakes: HashMap<u32, SnakeRecord>,
    foods: HashMap<u32, FoodRecord>,
    player_entity_id: Option<u32>,
    current_seq: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_seq(&self) -> u32 {
        self.current_seq
    }

    pub fn set_current_seq(&mut self, seq: u32) {
        self.current_seq = seq;
    }

    pub fn player_entity_id(&self) -> Option<u32> {
        self.player_entity_id
    }

    pub fn set_player_entity_id(&mut self, id: u32) {
        self.player_entity_id = Some(id);
    }

    pub fn is_player(&self, id: u32) -> bool {
        self.player_entity_id == Some(id)
    }

    pub fn snake(&self, id: u32) -> Option<&SnakeRecord> {
        self.snakes.get(&id)
    }

    pub fn player_snake(&self) -> Option<&SnakeRecord> {
        self.player_entity_id.and_then(|id| self.snakes.get(&id))
    }

    pub fn snakes(&self) -> impl Iterator<Item = &SnakeRecord> {
        self.snakes.values()
    }

    pub fn foods(&self) -> impl Iterator<Item = &FoodRecord> {
        self.foods.values()
    }

    pub fn food(&self, id: u32) -> Option<&FoodRecord> {
        self.foods.get(&id)
    }

    pub fn snake_count(&self) -> usize {
        self.snakes.len()
    }

    pub fn food_count(&self) -> usize {
        self.foods.len()
    }

    /// `upsert_food(id, state, is_new)` (spec §4.4).
    pub fn upsert_food(&mut self, id: u32, state: &FoodState, _is_new: bool) {
        let record = FoodRecord::from_state(id, state, self.current_seq);
        self.foods.insert(id, record);
    }

    /// `upsert_snake_full(id, state, full_segments, is_new)` (spec §4.4).
    /// Returns `true` when this write rebuilt the player's snake with a
    /// full, exactly-matching segment count — the caller uses this to
    /// decide whether `awaiting_player_rebuild` clears.
    pub fn upsert_snake_full(
        &mut self,
        id: u32,
        state: &SnakeState,
    ) -> Result<bool, SegmentCountMismatch> {
        if state.points.len() != state.total_segments as usize {
            return Err(SegmentCountMismatch);
        }
        let creation_frame = self
            .snakes
            .get(&id)
            .map(|s| s.creation_frame)
            .unwrap_or(self.current_seq);
        let mut record = SnakeRecord::from_full(id, state, creation_frame, self.current_seq);
        if let Some(existing) = self.snakes.get(&id) {
            record.display_name = existing.display_name.clone();
            if !self.is_player(id) {
                record.destination = existing.destination;
            }
        }
        self.snakes.insert(id, record);
        Ok(self.is_player(id))
    }

    /// Applies a predicted body to an existing snake record, leaving
    /// everything else (name, creation frame, destination) untouched. Used
    /// by the prediction core after it has computed the stepped body.
    pub fn apply_predicted_segments(&mut self, id: u32, segments: Vec<Point2>, experience: u32) {
        if let Some(record) = self.snakes.get_mut(&id) {
            record.segments = segments;
            record.experience = experience;
            record.last_seen_seq = self.current_seq;
        }
    }

    pub fn set_display_name(&mut self, id: u32, name: impl Into<String>) {
        if let Some(record) = self.snakes.get_mut(&id) {
            record.display_name = name.into();
        }
    }

    pub fn set_destination(&mut self, id: u32, destination: Point2) {
        if let Some(record) = self.snakes.get_mut(&id) {
            record.destination = destination;
        }
    }

    /// `remove_entity(kind, id)` (spec §4.4). Marks a removed player snake
    /// killed rather than simply disappearing it, matching spec §4.4's
    /// "marks the player snake killed at the current server frame."
    pub fn remove_snake(&mut self, id: u32) {
        if self.is_player(id) {
            if let Some(record) = self.snakes.get_mut(&id) {
                record.killed_at_frame = Some(self.current_seq);
                return;
            }
        }
        self.snakes.remove(&id);
    }

    pub fn remove_food(&mut self, id: u32) {
        self.foods.remove(&id);
    }

    /// `clear()` (spec §4.4): used on (re)connect and at the start of
    /// applying a `FullUpdate`.
    pub fn clear(&mut self) {
        self.snakes.clear();
        self.foods.clear();
        self.player_entity_id = None;
    }

    /// Entities eligible for TTL eviction: every non-player snake and food
    /// whose `last_seen_seq` is stale by at least `ttl_seq_delta` relative
    /// to `current_seq`. The caller still has to check visibility before
    /// actually evicting (spec §4.5.5: both conditions must hold).
    pub fn stale_snake_ids(&self, ttl_seq_delta: u32) -> Vec<u32> {
        self.snakes
            .values()
            .filter(|s| !self.is_player(s.entity_id))
            .filter(|s| self.current_seq.wrapping_sub(s.last_seen_seq) >= ttl_seq_delta)
            .map(|s| s.entity_id)
            .collect()
    }

    pub fn stale_food_ids(&self, ttl_seq_delta: u32) -> Vec<u32> {
        self.foods
            .values()
            .filter(|f| self.current_seq.wrapping_sub(f.last_seen_seq) >= ttl_seq_delta)
            .map(|f| f.entity_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coil_protocol::PointsKind;

    fn full_state(total: u16) -> SnakeState {
        let points = (0..total)
            .map(|i| Point2::new(0.0, i as f32 * 14.0))
            .collect();
        SnakeState {
            head: Point2::new(0.0, 0.0),
            experience: 0,
            points_kind: PointsKind::FullSegments,
            total_segments: total,
            points,
        }
    }

    #[test]
    fn upsert_snake_full_rejects_mismatched_length() {
        let mut store = EntityStore::new();
        let mut state = full_state(3);
        state.points.pop();
        assert!(store.upsert_snake_full(1, &state).is_err());
    }

    #[test]
    fn upsert_snake_full_reports_player_rebuild() {
        let mut store = EntityStore::new();
        store.set_player_entity_id(1);
        let state = full_state(4);
        assert_eq!(store.upsert_snake_full(1, &state), Ok(true));
        assert_eq!(store.upsert_snake_full(2, &state), Ok(false));
    }

    #[test]
    fn remove_snake_kills_player_instead_of_deleting() {
        let mut store = EntityStore::new();
        store.set_player_entity_id(1);
        store.upsert_snake_full(1, &full_state(4)).unwrap();
        store.set_current_seq(9);
        store.remove_snake(1);
        assert!(store.snake(1).is_some());
        assert_eq!(store.snake(1).unwrap().killed_at_frame, Some(9));
    }

    #[test]
    fn remove_snake_deletes_non_player() {
        let mut store = EntityStore::new();
        store.upsert_snake_full(2, &full_state(4)).unwrap();
        store.remove_snake(2);
        assert!(store.snake(2).is_none());
    }

    #[test]
    fn clear_drops_everything_including_player_id() {
        let mut store = EntityStore::new();
        store.set_player_entity_id(1);
        store.upsert_snake_full(1, &full_state(4)).unwrap();
        store.clear();
        assert_eq!(store.snake_count(), 0);
        assert_eq!(store.player_entity_id(), None);
    }

    #[test]
    fn stale_snake_ids_excludes_player() {
        let mut store = EntityStore::new();
        store.set_player_entity_id(1);
        store.upsert_snake_full(1, &full_state(4)).unwrap();
        store.upsert_snake_full(2, &full_state(4)).unwrap();
        store.set_current_seq(100);
        let stale = store.stale_snake_ids(8);
        assert_eq!(stale, vec![2]);
    }
}
