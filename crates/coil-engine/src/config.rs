// Tunable constants, gathered into one struct rather than a console-variable
// registry. Converted from: spec §9 ("Open questions" numeric defaults) and
// the per-component defaults scattered through §4.3-§4.7.

/// All tunables the reconciliation engine needs. `Default` gives the values
/// spec.md states explicitly or, where silent, the values recorded as
/// decisions in the repo's design notes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Fixed spacing the body-step rule enforces between adjacent segments.
    pub step_distance: f32,
    /// Experience points per body segment.
    pub experience_per_segment: u32,
    /// Minimum segment count for any snake, regardless of experience.
    pub min_segments: u16,
    /// How much a camera's visibility radius is inflated before TTL
    /// eviction and `get_nearest_foods` apply it.
    pub visibility_padding_percent: f32,
    /// Sequence-delta staleness threshold for TTL eviction (spec §4.5.5).
    pub ttl_seq_delta: u32,
    /// Ticks a per-snake snapshot request stays on cooldown (spec §4.5.4).
    pub snapshot_cooldown_frames: u32,
    /// Max per-snake snapshot requests sent per tick (spec §4.5.4, §4.7).
    pub snapshot_requests_per_tick: usize,
    /// Body radius used as `minDist` in drift validation (spec §4.6) and as
    /// the minimum sample spacing validation samples are drawn at.
    pub base_part_radius: f32,
    /// Simulation tick rate in Hz; input is emitted at half this rate
    /// (spec §4.7).
    pub simulation_hz: u32,
    /// Base camera visibility radius before zoom and padding are applied.
    pub camera_radius: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_distance: 14.0,
            experience_per_segment: 50,
            min_segments: 4,
            visibility_padding_percent: 0.2,
            ttl_seq_delta: coil_protocol::DEFAULT_TTL_SEQ_DELTA,
            snapshot_cooldown_frames: coil_protocol::DEFAULT_SNAPSHOT_COOLDOWN_FRAMES,
            snapshot_requests_per_tick: coil_protocol::DEFAULT_SNAPSHOT_REQUESTS_PER_TICK,
            base_part_radius: 18.0,
            simulation_hz: 64,
            camera_radius: 1000.0,
        }
    }
}

impl EngineConfig {
    /// `threshold = max(120, 3 * minDist)` from spec §4.6's drift
    /// validation, parameterized on this config's body radius.
    pub fn drift_threshold(&self) -> f32 {
        (120.0f32).max(3.0 * self.base_part_radius)
    }

    /// `max(2, n/10)` from spec §4.6: the number of out-of-threshold
    /// samples tolerated before drift validation fails.
    pub fn drift_failure_budget(&self, sample_count: usize) -> usize {
        2.max(sample_count / 10)
    }

    /// Segment count target for a given experience value, per spec §3:
    /// `floor(experience / ExperiencePerSegment)` rounded to nearest, with
    /// a floor of `min_segments`.
    pub fn target_segment_count(&self, experience: u32) -> u16 {
        let raw = experience as f32 / self.experience_per_segment as f32;
        let rounded = raw.round() as u32;
        rounded.max(self.min_segments as u32) as u16
    }

    /// Camera zoom for a snake at the given experience: `1 + xp/10 * 0.01`.
    pub fn zoom_for_experience(&self, experience: u32) -> f32 {
        1.0 + (experience as f32 / 10.0) * 0.01
    }

    /// Visibility radius inflated by padding, for a snake at the given
    /// experience (spec §4.5.5's "camera radius scaled by player zoom,
    /// inflated by VisibilityPaddingPercent").
    pub fn visible_radius_with_padding(&self, experience: u32) -> f32 {
        let visible_radius = self.camera_radius * self.zoom_for_experience(experience);
        visible_radius * (1.0 + self.visibility_padding_percent)
    }
}
