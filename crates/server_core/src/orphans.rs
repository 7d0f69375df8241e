//! Orphan Scanner: reclaim companion-marked objects nothing owns anymore.
//!
//! An object survives only if its marker parses, its owner is online with a
//! matching cached equip state, and the live instance references it.

use crate::CompanionServer;
use crate::gateway::{ObjectId, WorldGateway};
use crate::markers::{MarkerText, ObjectMarker};
use crate::owner::OwnerDirectory;
use crate::store::OwnershipStore;

impl<W, D, S> CompanionServer<W, D, S>
where
    W: WorldGateway,
    D: OwnerDirectory,
    S: OwnershipStore,
{
    /// Remove every orphaned companion object in every world. Returns the
    /// number removed.
    pub fn cleanup_orphans(&mut self) -> usize {
        let mut removed = 0usize;
        for obj in self.world.objects() {
            let Some(text) = obj.marker.as_deref() else {
                continue;
            };
            let reason = match ObjectMarker::parse(text) {
                MarkerText::Foreign => continue,
                MarkerText::Malformed => Some("malformed"),
                MarkerText::Companion(marker) => self.orphan_reason(&marker, obj.id),
            };
            let Some(reason) = reason else {
                continue;
            };
            match self.world.remove(obj.id) {
                Ok(()) => {
                    removed += 1;
                    log::debug!("orphans: removed {:?} '{text}' ({reason})", obj.id);
                }
                Err(e) => log::debug!("orphans: remove {:?}: {e}", obj.id),
            }
        }
        metrics::counter!("companions.orphans_removed_total").increment(removed as u64);
        if removed > 0 {
            log::info!("orphans: removed {removed} objects");
        }
        removed
    }

    /// `None` keeps the object.
    fn orphan_reason(&self, marker: &ObjectMarker, id: ObjectId) -> Option<&'static str> {
        if !self.owners.is_online(marker.owner) {
            return Some("offline");
        }
        let equipped = self.store.cached(marker.owner).and_then(|r| r.equipped.as_deref());
        if equipped != Some(marker.companion.as_str()) {
            return Some("desync");
        }
        match self.instances.get(marker.owner) {
            Some(inst) if inst.holds(id) => None,
            _ => Some("untracked"),
        }
    }
}
