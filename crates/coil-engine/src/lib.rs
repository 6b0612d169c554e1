//! Client-side world reconciliation engine built on `coil-protocol`'s wire
//! codec: sequence tracking, the entity store, remote-snake prediction and
//! drift validation, the input producer, and the transport boundary, all
//! driven by a single `process_tick()` entry point.

pub mod config;
pub mod debug;
pub mod dispatcher;
pub mod input;
pub mod prediction;
pub mod reconcile;
pub mod sequence;
pub mod store;
pub mod transport;

pub use config::EngineConfig;
pub use debug::DebugInfo;
pub use reconcile::ReconciliationEngine;
pub use store::{EntityStore, FoodRecord, SnakeRecord};
pub use transport::{ChannelTransport, RecordingTransport, Transport, TransportEvent};
