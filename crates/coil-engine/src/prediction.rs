// Remote-snake body prediction and drift validation. Converted from: spec
// §4.6, grounded on the "pull-to-leader" chain algorithm named in
// original_source/client/src/game/math.hpp (`MoveEverySegmentToTop`) and on
// myq2-client/src/cl_pred.rs's role as the module that reconciles predicted
// state against what the server actually sent.

use crate::config::EngineConfig;
use coil_protocol::Point2;

/// Move the head to `new_head`, then pull every following segment toward
/// its predecessor by up to `step_distance` (spec §4.6 step 1-2).
pub fn step_body(segments: &mut [Point2], new_head: Point2, step_distance: f32) {
    if segments.is_empty() {
        return;
    }
    segments[0] = new_head;
    for i in 1..segments.len() {
        let prev = segments[i - 1];
        let cur = segments[i];
        let d = prev.distance(cur);
        if d > step_distance {
            let scale = step_distance / d;
            segments[i] = Point2::new(
                prev.x + (cur.x - prev.x) * scale,
                prev.y + (cur.y - prev.y) * scale,
            );
        }
    }
}

/// Grow or shrink the segment list to `target_len` (spec §4.6 step 3):
/// duplicate the tail when growing, drop from the tail when shrinking.
pub fn resize_segments(segments: &mut Vec<Point2>, target_len: u16) {
    let target_len = target_len as usize;
    if segments.is_empty() || target_len == 0 {
        return;
    }
    match segments.len().cmp(&target_len) {
        std::cmp::Ordering::Less => {
            let tail = *segments.last().unwrap();
            segments.resize(target_len, tail);
        }
        std::cmp::Ordering::Greater => {
            segments.truncate(target_len);
        }
        std::cmp::Ordering::Equal => {}
    }
}

/// Walk `segments` head to tail, emitting a point every time the
/// accumulated arc-distance since the last emitted point reaches
/// `min_dist`; always emit the tail (spec §4.6's "expected samples").
pub fn expected_samples(segments: &[Point2], min_dist: f32) -> Vec<Point2> {
    if segments.is_empty() {
        return Vec::new();
    }
    let mut out = vec![segments[0]];
    let mut last_emitted = segments[0];
    let mut accumulated = 0.0f32;
    for window in segments.windows(2) {
        let (a, b) = (window[0], window[1]);
        accumulated += a.distance(b);
        if accumulated >= min_dist {
            out.push(b);
            last_emitted = b;
            accumulated = 0.0;
        }
    }
    let tail = *segments.last().unwrap();
    if last_emitted != tail {
        out.push(tail);
    }
    out
}

/// Result of comparing predicted samples against server-sent ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftOutcome {
    Pass,
    Fail,
}

/// Compare `expected` (our prediction's samples) against `server_samples`
/// pairwise (spec §4.6's drift validation). Sizes must match; otherwise too
/// many samples may exceed `threshold`.
pub fn validate_drift(
    expected: &[Point2],
    server_samples: &[Point2],
    config: &EngineConfig,
) -> DriftOutcome {
    if expected.len() != server_samples.len() {
        return DriftOutcome::Fail;
    }
    let threshold = config.drift_threshold();
    let budget = config.drift_failure_budget(expected.len());
    let bad = expected
        .iter()
        .zip(server_samples.iter())
        .filter(|(a, b)| a.distance(**b) > threshold)
        .count();
    if bad > budget {
        DriftOutcome::Fail
    } else {
        DriftOutcome::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_body_leaves_close_segments_unchanged() {
        let mut segments = vec![Point2::new(0.0, 0.0), Point2::new(0.0, 10.0)];
        step_body(&mut segments, Point2::new(0.0, 0.0), 14.0);
        assert_eq!(segments[1], Point2::new(0.0, 10.0));
    }

    #[test]
    fn step_body_pulls_distant_segments_to_step_distance() {
        let mut segments = vec![Point2::new(0.0, 0.0), Point2::new(0.0, 100.0)];
        step_body(&mut segments, Point2::new(0.0, 0.0), 14.0);
        assert!((segments[0].distance(segments[1]) - 14.0).abs() < 1e-4);
    }

    #[test]
    fn step_body_chains_through_multiple_segments() {
        let mut segments = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 14.0),
            Point2::new(0.0, 28.0),
        ];
        step_body(&mut segments, Point2::new(0.0, 50.0), 14.0);
        for w in segments.windows(2) {
            assert!(w[0].distance(w[1]) <= 14.0 + 1e-3);
        }
    }

    #[test]
    fn resize_grows_by_duplicating_tail() {
        let mut segments = vec![Point2::new(0.0, 0.0), Point2::new(0.0, 14.0)];
        resize_segments(&mut segments, 4);
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[2], segments[3]);
        assert_eq!(segments[3], Point2::new(0.0, 14.0));
    }

    #[test]
    fn resize_shrinks_by_dropping_tail() {
        let mut segments = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 14.0),
            Point2::new(0.0, 28.0),
        ];
        resize_segments(&mut segments, 1);
        assert_eq!(segments, vec![Point2::new(0.0, 0.0)]);
    }

    #[test]
    fn expected_samples_always_includes_tail() {
        let segments = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 5.0),
            Point2::new(0.0, 9.0),
        ];
        let samples = expected_samples(&segments, 100.0);
        assert_eq!(*samples.last().unwrap(), Point2::new(0.0, 9.0));
    }

    #[test]
    fn drift_validation_fails_on_size_mismatch() {
        let config = EngineConfig::default();
        let expected = vec![Point2::new(0.0, 0.0)];
        let server = vec![Point2::new(0.0, 0.0), Point2::new(0.0, 1.0)];
        assert_eq!(validate_drift(&expected, &server, &config), DriftOutcome::Fail);
    }

    #[test]
    fn drift_validation_fails_on_large_divergence() {
        let config = EngineConfig::default();
        let expected = vec![Point2::new(0.0, 0.0)];
        let server = vec![Point2::new(1e6, 1e6)];
        assert_eq!(validate_drift(&expected, &server, &config), DriftOutcome::Fail);
    }

    #[test]
    fn drift_validation_passes_on_small_divergence() {
        let config = EngineConfig::default();
        let expected = vec![Point2::new(0.0, 0.0), Point2::new(0.0, 20.0)];
        let server = vec![Point2::new(1.0, 0.0), Point2::new(0.0, 21.0)];
        assert_eq!(validate_drift(&expected, &server, &config), DriftOutcome::Pass);
    }
}
