#![allow(clippy::unwrap_used)]

mod common;

use glam::DVec3;
use server_core as sc;
use sc::CompanionState;
use sc::gateway::WorldGateway;
use sc::instance::Phases;
use sc::listeners::OwnerEvent;

#[test]
fn teleport_tears_down_then_respawns_fresh() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    s.equip(o, "red").unwrap();
    s.tick();
    let old = s.instances().get(o).unwrap().clone();
    assert_ne!(old.phases, Phases::default());

    s.owners.move_to(o, DVec3::new(50.0, 0.0, 0.0));
    s.tick();
    assert!(!s.has_companion(o));
    assert!(!s.world.is_valid(old.primary));
    assert_eq!(s.state(o), CompanionState::TeleportPending);

    // respawn_delay_ticks = 3 after the teardown tick
    s.tick();
    s.tick();
    assert!(!s.has_companion(o));
    s.tick();
    let fresh = s.instances().get(o).unwrap();
    assert_eq!(fresh.phases, Phases::default());
    assert_eq!(fresh.knot_phases, Phases::default());
    assert_eq!(fresh.last.pos, DVec3::new(50.0, 0.0, 0.0));
    assert_eq!(s.active_count(), 1);
    assert_eq!(s.world.len(), 3);
}

#[test]
fn world_change_counts_as_teleport() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    s.equip(o, "red").unwrap();
    s.owners.change_world(o, "nether", DVec3::new(1.0, 0.0, 0.0));
    s.tick();
    assert!(!s.has_companion(o));
    s.run_ticks(3);
    let inst = s.instances().get(o).unwrap();
    assert_eq!(inst.last.world, sc::owner::WorldId::new("nether"));
}

#[test]
fn small_steps_are_not_teleports() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    s.equip(o, "red").unwrap();
    for i in 1..=20 {
        s.owners.move_to(o, DVec3::new(i as f64 * 0.9, 0.0, 0.0));
        s.tick();
        assert!(s.has_companion(o), "lost companion at step {i}");
    }
}

#[test]
fn quit_cancels_pending_respawn() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    s.equip(o, "red").unwrap();
    s.owners.move_to(o, DVec3::new(50.0, 0.0, 0.0));
    s.tick();
    assert_eq!(s.state(o), CompanionState::TeleportPending);
    s.owners.set_online(o, false);
    s.handle_event(OwnerEvent::Quit(o));
    assert_eq!(s.state(o), CompanionState::Unequipped);
    s.run_ticks(5);
    assert!(!s.has_companion(o));
    assert!(s.world.is_empty());
}

#[test]
fn respawn_skipped_when_unequipped_meanwhile() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    s.equip(o, "red").unwrap();
    s.owners.move_to(o, DVec3::new(50.0, 0.0, 0.0));
    s.tick();
    s.unequip(o).unwrap();
    s.run_ticks(5);
    assert!(!s.has_companion(o));
}
