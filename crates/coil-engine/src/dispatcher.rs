// Message dispatcher: parse, classify, and gate on sequence order.
// Converted from: spec §4.2.

use crate::sequence::{SequenceOutcome, SequenceTracker};
use coil_protocol::{decode_datagram, Message, ParseError};

/// A message that has passed header parsing and (for full/partial updates)
/// sequence gating, ready for the reconciliation engine to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchedMessage {
    FullUpdate {
        seq: u32,
        message: coil_protocol::FullUpdateMessage,
        gap_detected: bool,
    },
    PartialUpdate {
        seq: u32,
        message: coil_protocol::PartialUpdateMessage,
        gap_detected: bool,
    },
    /// Snapshots bypass the sequence tracker entirely (spec §4.2: "snapshots
    /// are out-of-band repair answers and must not be gated on sequence
    /// contiguity").
    SnakeSnapshot {
        seq: u32,
        message: coil_protocol::SnakeSnapshotMessage,
    },
    ClientInput {
        seq: u32,
        payload: coil_protocol::ClientInputPayload,
    },
    RequestFullUpdate {
        seq: u32,
        payload: coil_protocol::RequestFullUpdatePayload,
    },
    RequestSnakeSnapshot {
        seq: u32,
        payload: coil_protocol::RequestSnakeSnapshotPayload,
    },
}

/// Parse and classify one datagram, routing `FullUpdate`/`PartialUpdate`
/// through the sequence tracker first (spec §4.2). A `ParseError` here
/// means the whole datagram is unusable; the caller (the reconciliation
/// engine) is responsible for raising the repair flags per spec §7.
pub fn dispatch(
    bytes: &[u8],
    tracker: &mut SequenceTracker,
) -> Result<DispatchedMessage, ParseError> {
    match decode_datagram(bytes)? {
        Message::FullUpdate { seq, message } => {
            let gap_detected = tracker.observe(seq) == SequenceOutcome::GapDetected;
            Ok(DispatchedMessage::FullUpdate {
                seq,
                message,
                gap_detected,
            })
        }
        Message::PartialUpdate { seq, message } => {
            let gap_detected = tracker.observe(seq) == SequenceOutcome::GapDetected;
            Ok(DispatchedMessage::PartialUpdate {
                seq,
                message,
                gap_detected,
            })
        }
        Message::SnakeSnapshot { seq, message } => {
            Ok(DispatchedMessage::SnakeSnapshot { seq, message })
        }
        Message::ClientInput { seq, payload } => {
            Ok(DispatchedMessage::ClientInput { seq, payload })
        }
        Message::RequestFullUpdate { seq, payload } => {
            Ok(DispatchedMessage::RequestFullUpdate { seq, payload })
        }
        Message::RequestSnakeSnapshot { seq, payload } => {
            Ok(DispatchedMessage::RequestSnakeSnapshot { seq, payload })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coil_protocol::{FullUpdateHeader, FullUpdateMessage, SnakeSnapshotMessage};

    #[test]
    fn full_update_is_gated_by_sequence_tracker() {
        let mut tracker = SequenceTracker::new();
        let msg = FullUpdateMessage {
            header: FullUpdateHeader {
                player_entity_id: 0,
            },
            entries: vec![],
        };
        let datagram = msg.encode(1);
        match dispatch(&datagram, &mut tracker).unwrap() {
            DispatchedMessage::FullUpdate { gap_detected, .. } => assert!(!gap_detected),
            other => panic!("unexpected: {other:?}"),
        }

        let datagram = msg.encode(5);
        match dispatch(&datagram, &mut tracker).unwrap() {
            DispatchedMessage::FullUpdate { gap_detected, .. } => assert!(gap_detected),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn snake_snapshot_bypasses_sequence_tracker() {
        let mut tracker = SequenceTracker::new();
        tracker.observe(1);
        let msg = SnakeSnapshotMessage {
            entity_id: 5,
            state: coil_protocol::SnakeState {
                head: coil_protocol::Point2::ZERO,
                experience: 0,
                points_kind: coil_protocol::PointsKind::FullSegments,
                total_segments: 1,
                points: vec![coil_protocol::Point2::ZERO],
            },
        };
        // Sequence 99 would be a huge gap for FullUpdate, but SnakeSnapshot
        // must dispatch unconditionally and leave the tracker untouched.
        let datagram = msg.encode(99);
        dispatch(&datagram, &mut tracker).unwrap();
        assert_eq!(tracker.last_server_seq(), 1);
    }
}
