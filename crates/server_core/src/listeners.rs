//! Owner events from the host and the tick-thread job dispatcher.

use crate::CompanionServer;
use crate::gateway::WorldGateway;
use crate::jobs::Job;
use crate::owner::{OwnerDirectory, OwnerId};
use crate::store::OwnershipStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnerEvent {
    Joined(OwnerId),
    Quit(OwnerId),
    Respawned(OwnerId),
    GameModeChanged { owner: OwnerId, spectator: bool },
    InvisibilityCleared(OwnerId),
}

impl OwnerEvent {
    pub fn owner(&self) -> OwnerId {
        match self {
            Self::Joined(o) | Self::Quit(o) | Self::Respawned(o) | Self::InvisibilityCleared(o) => *o,
            Self::GameModeChanged { owner, .. } => *owner,
        }
    }
}

impl<W, D, S> CompanionServer<W, D, S>
where
    W: WorldGateway,
    D: OwnerDirectory,
    S: OwnershipStore,
{
    pub fn handle_event(&mut self, event: OwnerEvent) {
        match event {
            OwnerEvent::Joined(owner) => self.on_join(owner),
            OwnerEvent::Quit(owner) => {
                self.teardown(owner, "disconnect");
                let dropped = self.jobs.cancel_owner(owner);
                self.store.unload_from_cache(owner);
                log::debug!("quit {owner}: dropped {dropped} pending jobs");
            }
            OwnerEvent::Respawned(owner) => {
                self.schedule_restore(owner, self.physics.entity.respawn_restore_delay_ticks);
            }
            OwnerEvent::GameModeChanged { owner, spectator: false } | OwnerEvent::InvisibilityCleared(owner) => {
                self.schedule_restore(owner, self.physics.entity.visibility_restore_delay_ticks);
            }
            OwnerEvent::GameModeChanged { spectator: true, .. } => {}
        }
    }

    fn on_join(&mut self, owner: OwnerId) {
        if let Err(e) = self.store.create_owner(owner).and_then(|()| self.store.load_into_cache(owner)) {
            log::warn!("join {owner}: store unavailable: {e}");
            return;
        }
        let equipped = self.store.cached(owner).and_then(|r| r.equipped.clone());
        if let Some(companion) = equipped {
            // failures are logged by equip
            let _ = self.equip(owner, &companion);
        }
    }

    fn schedule_restore(&mut self, owner: OwnerId, delay: u64) {
        self.jobs.schedule(Job::Restore { owner }, self.tick + delay);
    }

    /// Re-equip the cached companion if nothing is active. `Restore` also
    /// requires the owner to be visible; the update pass covers teleports.
    fn respawn(&mut self, owner: OwnerId, require_visible: bool) {
        if !self.owners.is_online(owner) || self.instances.contains(owner) {
            return;
        }
        if require_visible && !self.visibility.is_visible(owner, &self.owners.presence(owner)) {
            return;
        }
        let Some(companion) = self.store.cached(owner).and_then(|r| r.equipped.clone()) else {
            return;
        };
        let _ = self.equip(owner, &companion);
    }

    pub(crate) fn run_job(&mut self, job: Job) {
        log::trace!("job {}", job.kind());
        match job {
            Job::Equip { owner, companion } => {
                let _ = self.equip(owner, &companion);
            }
            Job::Unequip { owner } => {
                if let Err(e) = self.unequip(owner) {
                    log::warn!("unequip {owner}: {e}");
                }
            }
            Job::Restore { owner } => self.respawn(owner, true),
            Job::TeleportRespawn { owner } => self.respawn(owner, false),
            Job::Event(event) => self.handle_event(event),
            Job::CleanupOrphans => {
                self.cleanup_orphans();
            }
        }
    }
}
