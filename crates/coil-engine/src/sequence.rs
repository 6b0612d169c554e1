// Per-connection sequence tracking. Converted from: spec §4.3, in the style
// of myq2-common/src/net_chan.rs's incoming/outgoing sequence bookkeeping
// (there: `incoming_sequence`/`outgoing_sequence` on `NetChan`).

/// Tracks the last accepted server sequence number and whether a gap was
/// just observed. Holds no entity state — only the bookkeeping spec §4.3
/// describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceTracker {
    has_seq: bool,
    last_server_seq: u32,
}

/// Outcome of feeding one incoming sequence number through the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// First update ever accepted, or a contiguous next-in-order update.
    Accepted,
    /// A gap (or backward jump / wraparound) was observed; the baseline
    /// was still advanced and the message should still be applied.
    GapDetected,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seq(&self) -> bool {
        self.has_seq
    }

    pub fn last_server_seq(&self) -> u32 {
        self.last_server_seq
    }

    /// Feed one incoming sequence number (spec §4.3). Always advances
    /// `last_server_seq` to `seq`; the only question is whether the jump
    /// was contiguous.
    pub fn observe(&mut self, seq: u32) -> SequenceOutcome {
        if !self.has_seq {
            self.has_seq = true;
            self.last_server_seq = seq;
            return SequenceOutcome::Accepted;
        }

        // Ordinary u32 arithmetic per spec §9: wraparound is indistinguishable
        // from a large backward jump and is treated identically (repair).
        let contiguous = seq == self.last_server_seq.wrapping_add(1);
        self.last_server_seq = seq;
        if contiguous {
            SequenceOutcome::Accepted
        } else {
            SequenceOutcome::GapDetected
        }
    }

    pub fn reset(&mut self) {
        self.has_seq = false;
        self.last_server_seq = 0;
    }
}
