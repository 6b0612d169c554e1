// End-to-end scenarios driven entirely through the public engine API,
// exercising the same behaviors as the in-module unit tests but treating
// the engine as a black box, the way a client integration test would.

use coil_engine::{EngineConfig, ReconciliationEngine, RecordingTransport};
use coil_protocol::{
    EntityEntry, FoodState, FullUpdateHeader, FullUpdateMessage, Point2, PointsKind,
    SnakeState,
};

fn engine() -> ReconciliationEngine<RecordingTransport> {
    ReconciliationEngine::new(RecordingTransport::default(), EngineConfig::default())
}

fn full_snake(id: u32, total: u16) -> EntityEntry {
    let points = (0..total)
        .map(|i| Point2::new(0.0, i as f32 * 14.0))
        .collect();
    EntityEntry::Snake {
        entity_id: id,
        is_new: true,
        state: SnakeState {
            head: Point2::new(0.0, 0.0),
            experience: 0,
            points_kind: PointsKind::FullSegments,
            total_segments: total,
            points,
        },
    }
}

fn some_food(id: u32, x: f32, y: f32) -> EntityEntry {
    EntityEntry::Food {
        entity_id: id,
        is_new: true,
        state: FoodState {
            position: Point2::new(x, y),
            power: 1,
            color: coil_protocol::Color {
                r: 10,
                g: 20,
                b: 30,
                a: 255,
            },
        },
    }
}

#[test]
fn clean_handshake_populates_store_and_identifies_player() {
    let mut e = engine();
    let msg = FullUpdateMessage {
        header: FullUpdateHeader { player_entity_id: 5 },
        entries: vec![some_food(10, 0.0, 0.0), full_snake(5, 5)],
    };
    e.push_datagram(msg.encode(1));
    e.process_tick();

    let player = e.get_player_snake().expect("player snake should exist");
    assert_eq!(player.entity_id, 5);
    assert_eq!(player.segments.len(), 5);
    assert_eq!(e.get_server_frame(), 1);
    assert_eq!(e.get_nearest_foods().len(), 1);
}

#[test]
fn force_full_update_request_is_eventually_emitted() {
    let mut e = engine();
    let msg = FullUpdateMessage {
        header: FullUpdateHeader { player_entity_id: 5 },
        entries: vec![full_snake(5, 4)],
    };
    e.push_datagram(msg.encode(1));
    e.process_tick();

    e.force_full_update_request();
    assert!(e.get_debug_info().awaiting_player_rebuild);

    for _ in 0..4 {
        e.process_tick();
    }
    assert!(e.transport().sent.iter().any(|d| !d.is_empty()));
}

#[test]
fn rebuilding_the_player_snake_clears_the_rebuild_flag() {
    let mut e = engine();
    let msg = FullUpdateMessage {
        header: FullUpdateHeader { player_entity_id: 5 },
        entries: vec![full_snake(5, 4)],
    };
    e.push_datagram(msg.encode(1));
    e.process_tick();

    e.force_full_update_request();
    assert!(e.get_debug_info().awaiting_player_rebuild);

    let rebuild = FullUpdateMessage {
        header: FullUpdateHeader { player_entity_id: 5 },
        entries: vec![full_snake(5, 4)],
    };
    e.push_datagram(rebuild.encode(2));
    e.process_tick();
    assert!(!e.get_debug_info().awaiting_player_rebuild);
}

#[test]
fn nearest_foods_excludes_points_beyond_visibility_radius() {
    let mut e = engine();
    let msg = FullUpdateMessage {
        header: FullUpdateHeader { player_entity_id: 1 },
        entries: vec![
            full_snake(1, 4),
            some_food(10, 100.0, 0.0),
            some_food(11, 50_000.0, 0.0),
        ],
    };
    e.push_datagram(msg.encode(1));
    e.process_tick();

    let nearby: Vec<_> = e.get_nearest_foods();
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].entity_id, 10);
}
