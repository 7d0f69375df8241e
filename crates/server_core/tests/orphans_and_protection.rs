#![allow(clippy::unwrap_used)]

mod common;

use glam::DVec3;
use server_core as sc;
use sc::gateway::{ObjectKind, WorldGateway};
use sc::markers::{ObjectMarker, Role};
use sc::owner::{OwnerId, Placement, WorldId};

fn at(x: f64) -> Placement {
    Placement::new(WorldId::new("overworld"), DVec3::new(x, 0.0, 0.0))
}

#[test]
fn scanner_keeps_tracked_and_removes_the_rest() {
    let mut s = common::server();
    let alice = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    s.equip(alice, "red").unwrap();
    let inst = s.instances().get(alice).unwrap().clone();

    let gone_owner = OwnerId::random();
    let offline = s.world.insert(
        ObjectKind::Display,
        Some(&ObjectMarker::new(Role::Primary, gone_owner, "red").encode()),
        at(5.0),
    );
    let duplicate = s.world.insert(
        ObjectKind::Display,
        Some(&ObjectMarker::new(Role::Knot, alice, "red").encode()),
        at(6.0),
    );
    let stale_kind = s.world.insert(
        ObjectKind::Anchor,
        Some(&ObjectMarker::new(Role::Anchor, alice, "crane").encode()),
        at(7.0),
    );
    let malformed = s.world.insert(ObjectKind::Display, Some("companion:primary:garbage"), at(8.0));
    let villager = s.world.insert(ObjectKind::Other, Some("villager"), at(9.0));
    let plain = s.world.insert(ObjectKind::Other, None, at(10.0));

    assert_eq!(s.cleanup_orphans(), 4);
    for id in [offline, duplicate, stale_kind, malformed] {
        assert!(!s.world.is_valid(id), "{id:?} should be gone");
    }
    for id in inst.handles().chain([villager, plain]) {
        assert!(s.world.is_valid(id), "{id:?} should survive");
    }
}

#[test]
fn startup_sweep_runs_after_delay() {
    let mut s = common::server();
    let stray = s.world.insert(
        ObjectKind::Display,
        Some(&ObjectMarker::new(Role::Primary, OwnerId::random(), "red").encode()),
        at(0.0),
    );
    s.run_ticks(39);
    assert!(s.world.is_valid(stray));
    s.tick();
    assert!(!s.world.is_valid(stray));
}

#[test]
fn protection_covers_markers_and_nearby_hitches() {
    let mut s = common::server();
    let alice = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    s.equip(alice, "red").unwrap();
    let inst = s.instances().get(alice).unwrap().clone();
    assert!(inst.handles().all(|id| s.is_protected(id)));

    // placed after equip so the fixture sweep does not take it
    let near_hitch =
        s.world.insert(ObjectKind::TetherHitch, None, Placement::new(WorldId::new("overworld"), DVec3::new(0.0, 4.0, 0.0)));
    let far_hitch = s.world.insert(ObjectKind::TetherHitch, None, at(40.0));
    let villager = s.world.insert(ObjectKind::Other, Some("villager"), at(0.5));
    assert!(s.is_protected(near_hitch));
    assert!(!s.is_protected(far_hitch));
    assert!(!s.is_protected(villager));
}
