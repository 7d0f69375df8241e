//! Interaction protection: which objects the host must not let players
//! break, unleash or interact with.

use crate::CompanionServer;
use crate::gateway::{ObjectId, ObjectKind, WorldGateway, WorldObject};
use crate::markers::MARKER_PREFIX;
use crate::owner::OwnerDirectory;
use crate::store::OwnershipStore;

/// Hitches this close to a companion object are protected.
pub const HITCH_GUARD_RADIUS: f64 = 5.0;

pub fn is_companion_object(obj: &WorldObject) -> bool {
    obj.marker.as_deref().is_some_and(|m| m.starts_with(MARKER_PREFIX))
}

impl<W, D, S> CompanionServer<W, D, S>
where
    W: WorldGateway,
    D: OwnerDirectory,
    S: OwnershipStore,
{
    pub fn is_protected(&self, id: ObjectId) -> bool {
        let Some(obj) = self.world.describe(id) else {
            return false;
        };
        if is_companion_object(&obj) {
            return true;
        }
        if obj.kind != ObjectKind::TetherHitch {
            return false;
        }
        self.world
            .nearby_objects(&obj.placement.world, obj.placement.pos, HITCH_GUARD_RADIUS)
            .into_iter()
            .filter(|&n| n != id)
            .filter_map(|n| self.world.describe(n))
            .any(|o| is_companion_object(&o))
    }
}
