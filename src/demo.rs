//! Headless demo host: a handful of owners wander a flat world with random
//! companions while the service ticks. Owner motion is seeded so runs are
//! reproducible.

use std::time::Duration;

use anyhow::Result;
use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use server_core::CompanionServer;
use server_core::config::ConfigSource;
use server_core::headless::{HeadlessOwners, HeadlessWorld};
use server_core::jobs::Job;
use server_core::listeners::OwnerEvent;
use server_core::owner::OwnerId;
use server_core::store::{CachedStore, MemoryBackend, OwnershipStore};

pub type DemoServer = CompanionServer<HeadlessWorld, HeadlessOwners, CachedStore<MemoryBackend>>;

/// Nominal server tick length in realtime mode.
const TICK: Duration = Duration::from_millis(50);
const WALK_SPEED: f64 = 0.2;
const TELEPORT_JUMP: f64 = 64.0;

#[derive(Clone, Debug)]
pub struct DemoOptions {
    pub ticks: u64,
    pub owners: usize,
    pub seed: u64,
    /// Per owner, per tick.
    pub teleport_chance: f64,
    pub realtime: bool,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self { ticks: 600, owners: 4, seed: 7, teleport_chance: 0.002, realtime: false }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DemoSummary {
    pub ticks: u64,
    pub owners: usize,
    pub teleports: u64,
    pub active_at_end: usize,
    pub objects_after_shutdown: usize,
}

/// Build a server over in-memory collaborators and register `n` owners who
/// own (and may use) every definition.
pub fn build(source: impl ConfigSource + 'static, n: usize, rng: &mut ChaCha8Rng) -> (DemoServer, Vec<OwnerId>) {
    let mut server = CompanionServer::new(
        HeadlessWorld::new(),
        HeadlessOwners::new(),
        CachedStore::new(MemoryBackend::new()),
        source,
    );
    let defs: Vec<(String, Option<String>)> =
        server.registry().all().map(|d| (d.id.clone(), d.permission.clone())).collect();
    let mut owners = Vec::with_capacity(n);
    for i in 0..n {
        let pos = DVec3::new(rng.random_range(-200.0..200.0), 64.0, rng.random_range(-200.0..200.0));
        let owner = server.owners.add(&format!("walker{i}"), "overworld", pos);
        server.owners.set_yaw(owner, rng.random_range(0.0..360.0));
        server.handle_event(OwnerEvent::Joined(owner));
        for (id, permission) in &defs {
            if let Err(e) = server.store.add_owned(owner, id) {
                tracing::warn!(%owner, %id, error = %e, "grant failed");
            }
            if let Some(node) = permission {
                server.owners.grant(owner, node);
            }
        }
        if !defs.is_empty() {
            let (id, _) = &defs[rng.random_range(0..defs.len())];
            server.enqueue(Job::Equip { owner, companion: id.clone() });
        }
        owners.push(owner);
    }
    (server, owners)
}

/// One step of wandering: turn a little, walk forward, rarely jump far.
fn wander(server: &mut DemoServer, owner: OwnerId, rng: &mut ChaCha8Rng, teleport_chance: f64) -> bool {
    let Some(state) = server.owners.get(owner) else {
        return false;
    };
    let yaw = state.transform.yaw_deg + rng.random_range(-8.0f32..8.0);
    let pos = state.transform.pos;
    let rad = f64::from(yaw).to_radians();
    let forward = DVec3::new(-rad.sin(), 0.0, rad.cos());
    let jumped = rng.random_bool(teleport_chance.clamp(0.0, 1.0));
    let next = if jumped { pos + forward * TELEPORT_JUMP } else { pos + forward * WALK_SPEED };
    server.owners.set_yaw(owner, yaw.rem_euclid(360.0));
    server.owners.move_to(owner, next);
    jumped
}

pub fn run(opts: &DemoOptions, source: impl ConfigSource + 'static) -> Result<DemoSummary> {
    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let (mut server, owners) = build(source, opts.owners, &mut rng);
    tracing::info!(
        owners = owners.len(),
        definitions = server.registry().len(),
        ticks = opts.ticks,
        "demo starting"
    );
    let mut teleports = 0u64;
    for t in 0..opts.ticks {
        // stand still now and then so idle animation kicks in
        let walking = (t / 100) % 2 == 0;
        if walking {
            for &owner in &owners {
                if wander(&mut server, owner, &mut rng, opts.teleport_chance) {
                    teleports += 1;
                }
            }
        }
        let report = server.tick();
        if report.tick % 100 == 0 {
            tracing::info!(tick = report.tick, active = server.active_count(), objects = server.world.len(), "demo");
        }
        if opts.realtime {
            std::thread::sleep(TICK);
        }
    }
    let active_at_end = server.active_count();
    server.shutdown();
    let summary = DemoSummary {
        ticks: opts.ticks,
        owners: owners.len(),
        teleports,
        active_at_end,
        objects_after_shutdown: server.world.len(),
    };
    tracing::info!(?summary, "demo finished");
    Ok(summary)
}
