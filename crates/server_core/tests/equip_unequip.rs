#![allow(clippy::unwrap_used)]

mod common;

use glam::{DVec3, Vec3};
use server_core as sc;
use sc::gateway::{GatewayError, ObjectKind, Visual, WorldGateway};
use sc::markers::{MARKER_PREFIX, MarkerText, ObjectMarker, Role};
use sc::owner::Placement;
use sc::store::OwnershipStore;
use sc::{CompanionState, EquipError};

#[test]
fn equip_then_unequip_leaves_nothing_behind() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::new(0.0, 64.0, 0.0), &["red"]);
    s.equip(o, "red").unwrap();

    let inst = s.instances().get(o).unwrap().clone();
    assert_eq!(s.state(o), CompanionState::Active);
    assert_eq!(s.world.count_marked(MARKER_PREFIX), 3);
    assert!(s.world.is_tethered(inst.anchor));
    let primary = s.world.get(inst.primary).unwrap();
    assert_eq!(primary.placement.pos, DVec3::new(0.0, 66.5, 0.0));
    assert_eq!(primary.visual, Some(Visual::Block("minecraft:red_wool".into())));
    assert_eq!(
        ObjectMarker::parse(primary.marker.as_deref().unwrap()),
        MarkerText::Companion(ObjectMarker::new(Role::Primary, o, "red"))
    );
    let anchor = s.world.get(inst.anchor).unwrap();
    assert_eq!(anchor.kind, ObjectKind::Anchor);
    assert_eq!(anchor.placement.pos, DVec3::new(0.0, 68.0, 0.0));
    let knot = s.world.get(inst.knot.unwrap()).unwrap();
    assert!((knot.placement.pos.y - 66.2).abs() < 1e-9);
    assert_eq!(knot.scale, Vec3::splat(0.4));
    assert_eq!(s.store.cached(o).unwrap().equipped.as_deref(), Some("red"));

    s.unequip(o).unwrap();
    assert!(s.instances().is_empty());
    assert!(s.world.is_empty());
    assert_eq!(s.store.cached(o).unwrap().equipped, None);
    assert_eq!(s.state(o), CompanionState::Unequipped);
}

#[test]
fn rapid_equips_keep_one_instance() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red", "crane"]);
    s.equip(o, "red").unwrap();
    s.equip(o, "crane").unwrap();
    s.equip(o, "red").unwrap();
    assert_eq!(s.active_count(), 1);
    assert_eq!(s.world.len(), 3);
    assert_eq!(s.instances().get(o).unwrap().companion_id(), "red");
}

#[test]
fn rejected_equips_have_no_side_effects() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    assert!(matches!(s.equip(o, "nope"), Err(EquipError::UnknownCompanion(_))));
    assert!(matches!(s.equip(o, "crane"), Err(EquipError::NotOwned(_))));
    s.store.add_owned(o, "gated").unwrap();
    assert!(matches!(s.equip(o, "gated"), Err(EquipError::PermissionDenied(_))));
    assert!(s.world.is_empty());
    assert_eq!(s.store.cached(o).unwrap().equipped, None);

    s.owners.grant(o, "companions.gated");
    s.equip(o, "gated").unwrap();
    assert!(s.has_companion(o));
}

#[test]
fn offline_owner_cannot_equip() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    s.owners.set_online(o, false);
    assert!(matches!(s.equip(o, "red"), Err(EquipError::OwnerOffline(_))));
    assert!(s.world.is_empty());
}

#[test]
fn anchor_failure_rolls_back_everything() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    s.world.set_spawn_failure(ObjectKind::Anchor, true);
    assert!(matches!(s.equip(o, "red"), Err(EquipError::Spawn(_))));
    assert!(s.world.is_empty());
    assert!(s.instances().is_empty());
    assert_eq!(s.store.cached(o).unwrap().equipped, None);
}

#[test]
fn primary_failure_after_replace_leaves_nothing() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red", "crane"]);
    s.equip(o, "red").unwrap();
    assert_eq!(s.world.len(), 3);

    s.world.unload_world(sc::owner::WorldId::new("overworld"));
    let err = s.equip(o, "crane").unwrap_err();
    assert!(matches!(err, EquipError::Spawn(GatewayError::UnknownWorld(_))), "{err}");
    assert!(s.instances().is_empty());
    assert!(s.world.is_empty());
    // the failed equip never persisted its choice
    assert_eq!(s.store.cached(o).unwrap().equipped.as_deref(), Some("red"));
    assert_eq!(s.state(o), CompanionState::Unequipped);
}

#[test]
fn knot_failure_and_unresolvable_visuals_degrade() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    s.world.set_resolve_failure(true);
    s.world.set_tether_failure(true);
    s.equip(o, "red").unwrap();
    let inst = s.instances().get(o).unwrap().clone();
    let primary = s.world.get(inst.primary).unwrap();
    assert_eq!(primary.visual, Some(Visual::Block("minecraft:stone".into())));
    let knot = s.world.get(inst.knot.unwrap()).unwrap();
    assert_eq!(knot.visual, Some(Visual::Block("minecraft:oak_fence".into())));
    assert!(!s.world.is_tethered(inst.anchor));

    // a knot that cannot spawn is dropped, the companion still equips
    s.world.set_resolve_failure(false);
    s.world.set_tether_failure(false);
    s.world.fail_spawns_marked("companion:knot:");
    let bob = common::owner(&mut s, "bob", DVec3::new(100.0, 0.0, 0.0), &["crane"]);
    s.equip(bob, "crane").unwrap();
    let crane = s.instances().get(bob).unwrap();
    assert!(crane.knot.is_none());
    assert!(s.world.is_tethered(crane.anchor));
}

#[test]
fn knot_disabled_spawns_two_handles() {
    let mut physics = data_runtime::configs::physics::CompanionPhysicsCfg::default();
    physics.knot.enabled = false;
    let mut s = common::server_with(physics, common::catalog());
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    s.equip(o, "red").unwrap();
    assert_eq!(s.world.len(), 2);
    assert!(s.instances().get(o).unwrap().knot.is_none());
}

#[test]
fn stale_tether_fixtures_cleared_on_equip() {
    let mut s = common::server();
    let o = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    let here = Placement::new(sc::owner::WorldId::new("overworld"), DVec3::new(3.0, 0.0, 0.0));
    let far = Placement::new(sc::owner::WorldId::new("overworld"), DVec3::new(30.0, 0.0, 0.0));
    let hitch = s.world.insert(ObjectKind::TetherHitch, None, here.clone());
    let lead = s.world.insert(ObjectKind::TetherItem, None, here.clone());
    let bystander = s.world.insert(ObjectKind::Other, Some("villager"), here);
    let distant = s.world.insert(ObjectKind::TetherHitch, None, far);
    s.equip(o, "red").unwrap();
    assert!(!s.world.is_valid(hitch));
    assert!(!s.world.is_valid(lead));
    assert!(s.world.is_valid(bystander));
    assert!(s.world.is_valid(distant));
}

#[test]
fn shutdown_releases_everything() {
    let mut s = common::server();
    let a = common::owner(&mut s, "alice", DVec3::ZERO, &["red"]);
    let b = common::owner(&mut s, "bob", DVec3::new(40.0, 0.0, 0.0), &["crane"]);
    s.equip(a, "red").unwrap();
    s.equip(b, "crane").unwrap();
    s.shutdown();
    assert!(s.instances().is_empty());
    assert!(s.world.is_empty());
    assert!(s.jobs().is_empty());
    assert!(!s.timer().is_running());
    // the persisted choice survives for the next start
    assert_eq!(s.store.cached(a).unwrap().equipped.as_deref(), Some("red"));
}
