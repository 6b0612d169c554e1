// Transport adapter: a black-box sender/receiver of byte buffers over an
// unreliable datagram socket to a single peer. Converted from: spec §4.8,
// in the style of myq2-client/src/cl_ents.rs's `ClientCallbacks` trait
// (a narrow interface the engine calls outward through) combined with
// cl_http.rs's channel-based hand-off from a background thread.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender};

/// Everything the engine can be told by the transport, queued up for the
/// engine thread to drain (spec §5: "delivered messages are placed on a
/// queue drained on the engine thread; no engine state is touched from I/O
/// threads").
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Message(Vec<u8>),
    Connected,
    Disconnected,
    ConnectionError(String),
}

/// Outbound half of the transport contract: non-blocking send, no
/// completion callback, may silently drop on overflow (spec §4.8).
pub trait Transport {
    fn send(&mut self, bytes: &[u8]);
}

/// A `Transport` backed by an `mpsc::Sender`, for hooking up a real socket
/// that runs its I/O on a background thread and reports inbound events
/// through `TransportEvent`.
pub struct ChannelTransport {
    outbound: Sender<Vec<u8>>,
}

impl ChannelTransport {
    pub fn new(outbound: Sender<Vec<u8>>) -> Self {
        Self { outbound }
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, bytes: &[u8]) {
        // Non-blocking, no delivery guarantee: a full or closed channel is
        // treated the same as a dropped packet on a real datagram socket.
        let _ = self.outbound.send(bytes.to_vec());
    }
}

/// An in-memory `Transport` for tests: captures every datagram sent rather
/// than delivering it anywhere.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<Vec<u8>>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, bytes: &[u8]) {
        self.sent.push(bytes.to_vec());
    }
}

/// Drains a `TransportEvent` receiver into a bounded-size-per-tick queue.
/// This is the engine-side half of the queue spec §5 describes; the
/// reconciliation engine calls `drain` once per `process_tick()`.
pub struct EventQueue {
    inbound: Receiver<TransportEvent>,
}

impl EventQueue {
    pub fn new(inbound: Receiver<TransportEvent>) -> Self {
        Self { inbound }
    }

    pub fn drain(&self) -> VecDeque<TransportEvent> {
        self.inbound.try_iter().collect()
    }
}
