//! In-memory owner directory for tests and the demo host.

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;

use crate::owner::{OwnerDirectory, OwnerId, OwnerTransform, Presence, WorldId};

#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessOwner {
    pub name: String,
    pub online: bool,
    pub transform: OwnerTransform,
    pub presence: Presence,
    pub permissions: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct HeadlessOwners {
    owners: BTreeMap<OwnerId, HeadlessOwner>,
}

impl HeadlessOwners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an online owner standing at `pos` facing yaw 0.
    pub fn add(&mut self, name: &str, world: &str, pos: DVec3) -> OwnerId {
        let id = OwnerId::random();
        self.owners.insert(
            id,
            HeadlessOwner {
                name: name.to_string(),
                online: true,
                transform: OwnerTransform { world: WorldId::new(world), pos, yaw_deg: 0.0 },
                presence: Presence::default(),
                permissions: BTreeSet::new(),
            },
        );
        id
    }

    pub fn get(&self, owner: OwnerId) -> Option<&HeadlessOwner> {
        self.owners.get(&owner)
    }

    pub fn get_mut(&mut self, owner: OwnerId) -> Option<&mut HeadlessOwner> {
        self.owners.get_mut(&owner)
    }

    pub fn ids(&self) -> Vec<OwnerId> {
        self.owners.keys().copied().collect()
    }

    pub fn set_online(&mut self, owner: OwnerId, online: bool) {
        if let Some(o) = self.owners.get_mut(&owner) {
            o.online = online;
        }
    }

    pub fn move_to(&mut self, owner: OwnerId, pos: DVec3) {
        if let Some(o) = self.owners.get_mut(&owner) {
            o.transform.pos = pos;
        }
    }

    pub fn set_yaw(&mut self, owner: OwnerId, yaw_deg: f32) {
        if let Some(o) = self.owners.get_mut(&owner) {
            o.transform.yaw_deg = yaw_deg;
        }
    }

    pub fn change_world(&mut self, owner: OwnerId, world: &str, pos: DVec3) {
        if let Some(o) = self.owners.get_mut(&owner) {
            o.transform.world = WorldId::new(world);
            o.transform.pos = pos;
        }
    }

    pub fn set_presence(&mut self, owner: OwnerId, presence: Presence) {
        if let Some(o) = self.owners.get_mut(&owner) {
            o.presence = presence;
        }
    }

    pub fn grant(&mut self, owner: OwnerId, node: &str) {
        if let Some(o) = self.owners.get_mut(&owner) {
            o.permissions.insert(node.to_string());
        }
    }
}

impl OwnerDirectory for HeadlessOwners {
    fn is_online(&self, owner: OwnerId) -> bool {
        self.owners.get(&owner).is_some_and(|o| o.online)
    }

    fn transform(&self, owner: OwnerId) -> Option<OwnerTransform> {
        self.owners.get(&owner).map(|o| o.transform.clone())
    }

    fn presence(&self, owner: OwnerId) -> Presence {
        self.owners.get(&owner).map(|o| o.presence).unwrap_or_default()
    }

    fn has_permission(&self, owner: OwnerId, node: &str) -> bool {
        self.owners.get(&owner).is_some_and(|o| o.permissions.contains(node))
    }

    fn find_by_name(&self, name: &str) -> Option<OwnerId> {
        self.owners
            .iter()
            .find(|(_, o)| o.online && o.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id)
    }

    fn name(&self, owner: OwnerId) -> Option<String> {
        self.owners.get(&owner).map(|o| o.name.clone())
    }
}
