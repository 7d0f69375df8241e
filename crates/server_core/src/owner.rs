//! Owner identity, placement and the directory the core queries each tick.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorldId(pub String);

impl WorldId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// A point in a specific world.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub world: WorldId,
    pub pos: DVec3,
}

impl Placement {
    pub fn new(world: WorldId, pos: DVec3) -> Self {
        Self { world, pos }
    }

    #[inline]
    pub fn offset(&self, by: DVec3) -> Self {
        Self { world: self.world.clone(), pos: self.pos + by }
    }
}

/// Owner reference transform: feet position plus facing (degrees).
#[derive(Clone, Debug, PartialEq)]
pub struct OwnerTransform {
    pub world: WorldId,
    pub pos: DVec3,
    pub yaw_deg: f32,
}

impl OwnerTransform {
    pub fn placement(&self) -> Placement {
        Placement::new(self.world.clone(), self.pos)
    }
}

/// Presentation flags the visibility predicate is composed from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Presence {
    pub spectator: bool,
    pub invisible: bool,
    pub vanished: bool,
}

/// Host view of connected owners.
pub trait OwnerDirectory {
    fn is_online(&self, owner: OwnerId) -> bool;
    fn transform(&self, owner: OwnerId) -> Option<OwnerTransform>;
    fn presence(&self, _owner: OwnerId) -> Presence {
        Presence::default()
    }
    fn has_permission(&self, owner: OwnerId, node: &str) -> bool;
    fn find_by_name(&self, name: &str) -> Option<OwnerId>;
    fn name(&self, owner: OwnerId) -> Option<String>;
}
