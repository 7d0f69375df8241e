//! Companion follow service.
//!
//! `CompanionServer` owns every piece of companion state and is driven from a
//! single tick thread:
//! - Lifecycle: equip/unequip/teardown/reload/shutdown (`lifecycle`)
//! - Per-tick follow + integrity checks (`systems::update`)
//! - Deferred and cross-thread work (`jobs`), orphan reclamation (`orphans`)
//!
//! The host world, owner directory and ownership store are reached through
//! the traits in `gateway`, `owner` and `store`.

use data_runtime::configs::physics::CompanionPhysicsCfg;

pub mod commands;
pub mod companion;
pub mod config;
pub mod gateway;
pub mod headless;
pub mod instance;
pub mod jobs;
pub mod lifecycle;
pub mod listeners;
pub mod markers;
pub mod orphans;
pub mod owner;
pub mod placeholders;
pub mod protection;
pub mod registry;
pub mod store;
pub mod systems;
pub mod telemetry;
pub mod tick;
pub mod visibility;

use config::ConfigSource;
use gateway::WorldGateway;
use instance::InstanceTable;
use jobs::{Job, JobQueue, JobSender};
use owner::OwnerDirectory;
use registry::Registry;
use store::OwnershipStore;
use tick::TickTimer;
use visibility::{StandardVisibility, Visibility};

pub use lifecycle::{CompanionState, EquipError};

pub struct CompanionServer<W, D, S> {
    pub world: W,
    pub owners: D,
    pub store: S,
    visibility: Box<dyn Visibility>,
    source: Box<dyn ConfigSource>,
    physics: CompanionPhysicsCfg,
    registry: Registry,
    instances: InstanceTable,
    jobs: JobQueue,
    timer: TickTimer,
    tick: u64,
}

impl<W, D, S> CompanionServer<W, D, S>
where
    W: WorldGateway,
    D: OwnerDirectory,
    S: OwnershipStore,
{
    /// Load tuning and definitions from `source`, start the update trigger
    /// and queue the startup orphan sweep. Config failures fall back to
    /// defaults / an empty catalog with a warning.
    pub fn new(world: W, owners: D, store: S, source: impl ConfigSource + 'static) -> Self {
        let physics = match source.physics() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("companions: physics config failed, using defaults: {e:#}");
                CompanionPhysicsCfg::default()
            }
        };
        let mut registry = Registry::new();
        match registry.load(&source) {
            Ok(n) => log::info!("companions: {n} definitions loaded"),
            Err(e) => log::warn!("companions: definitions failed to load: {e:#}"),
        }
        let mut timer = TickTimer::default();
        timer.start(0, physics.physics.update_interval_ticks);
        let mut jobs = JobQueue::new();
        jobs.schedule(Job::CleanupOrphans, physics.entity.cleanup_startup_delay_ticks);
        Self {
            world,
            owners,
            store,
            visibility: Box::new(StandardVisibility),
            source: Box::new(source),
            physics,
            registry,
            instances: InstanceTable::new(),
            jobs,
            timer,
            tick: 0,
        }
    }

    /// Replace the visibility predicate.
    pub fn with_visibility(mut self, visibility: impl Visibility + 'static) -> Self {
        self.visibility = Box::new(visibility);
        self
    }

    pub fn physics(&self) -> &CompanionPhysicsCfg {
        &self.physics
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn instances(&self) -> &InstanceTable {
        &self.instances
    }

    /// Test and host hook for poking live instance state.
    pub fn instances_mut(&mut self) -> &mut InstanceTable {
        &mut self.instances
    }

    pub fn jobs(&self) -> &JobQueue {
        &self.jobs
    }

    /// Cross-thread entry point.
    pub fn sender(&self) -> JobSender {
        self.jobs.sender()
    }

    /// Queue a job for the next budgeted pass.
    pub fn enqueue(&mut self, job: Job) {
        self.jobs.push(job);
    }

    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }

    /// Ticks run so far.
    pub fn now(&self) -> u64 {
        self.tick
    }
}
