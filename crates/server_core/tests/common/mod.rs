#![allow(dead_code, clippy::unwrap_used)]

use data_runtime::companions::CompanionRecord;
use data_runtime::configs::physics::CompanionPhysicsCfg;
use glam::DVec3;
use server_core as sc;
use sc::CompanionServer;
use sc::config::StaticConfig;
use sc::headless::{HeadlessOwners, HeadlessWorld};
use sc::owner::OwnerId;
use sc::store::{CachedStore, MemoryBackend, OwnershipStore};

pub type Server = CompanionServer<HeadlessWorld, HeadlessOwners, CachedStore<MemoryBackend>>;

pub fn block(id: &str, block: &str) -> CompanionRecord {
    let mut r = CompanionRecord::new(id);
    r.name = Some(id.to_uppercase());
    r.block = Some(block.to_string());
    r
}

pub fn catalog() -> Vec<CompanionRecord> {
    let mut crane = CompanionRecord::new("crane");
    crane.model_data = Some(1001);
    crane.rotation = 90.0;
    crane.rarity = Some("epic".into());
    let mut gated = block("gated", "minecraft:gold_block");
    gated.permission = Some("companions.gated".into());
    vec![block("red", "minecraft:red_wool"), crane, gated]
}

pub fn server_with(physics: CompanionPhysicsCfg, records: Vec<CompanionRecord>) -> Server {
    CompanionServer::new(
        HeadlessWorld::new(),
        HeadlessOwners::new(),
        CachedStore::new(MemoryBackend::new()),
        StaticConfig::new(physics, records),
    )
}

pub fn server() -> Server {
    server_with(CompanionPhysicsCfg::default(), catalog())
}

/// Online owner at `pos` in "overworld", cached, owning `owned`.
pub fn owner(s: &mut Server, name: &str, pos: DVec3, owned: &[&str]) -> OwnerId {
    let o = s.owners.add(name, "overworld", pos);
    s.store.create_owner(o).unwrap();
    s.store.load_into_cache(o).unwrap();
    for id in owned {
        s.store.add_owned(o, id).unwrap();
    }
    o
}
