//! Active Instance Table: at most one live companion per owner.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::companion::CompanionDefinition;
use crate::gateway::ObjectId;
use crate::owner::{OwnerId, Placement};

/// Bob/sway oscillator phases in radians, kept in [0, 2π).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Phases {
    pub bob: f64,
    pub sway: f64,
}

#[derive(Clone, Debug)]
pub struct ActiveInstance {
    pub owner: OwnerId,
    pub definition: Arc<CompanionDefinition>,
    pub primary: ObjectId,
    pub knot: Option<ObjectId>,
    pub anchor: ObjectId,
    pub last: Placement,
    /// Seconds the owner has been (nearly) still.
    pub idle_s: f64,
    pub phases: Phases,
    pub knot_phases: Phases,
}

impl ActiveInstance {
    pub fn new(
        owner: OwnerId,
        definition: Arc<CompanionDefinition>,
        primary: ObjectId,
        knot: Option<ObjectId>,
        anchor: ObjectId,
        last: Placement,
    ) -> Self {
        Self {
            owner,
            definition,
            primary,
            knot,
            anchor,
            last,
            idle_s: 0.0,
            phases: Phases::default(),
            knot_phases: Phases::default(),
        }
    }

    pub fn companion_id(&self) -> &str {
        &self.definition.id
    }

    /// Whether `id` is one of this instance's handles.
    pub fn holds(&self, id: ObjectId) -> bool {
        self.primary == id || self.anchor == id || self.knot == Some(id)
    }

    pub fn handles(&self) -> impl Iterator<Item = ObjectId> + '_ {
        [Some(self.primary), self.knot, Some(self.anchor)].into_iter().flatten()
    }
}

/// Owner-ordered so update passes are deterministic.
#[derive(Debug, Default)]
pub struct InstanceTable {
    map: BTreeMap<OwnerId, ActiveInstance>,
}

impl InstanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance. The caller must have torn down any previous
    /// instance for this owner; a leftover one is handed back so it can be.
    #[must_use]
    pub fn insert(&mut self, inst: ActiveInstance) -> Option<ActiveInstance> {
        self.map.insert(inst.owner, inst)
    }

    pub fn remove(&mut self, owner: OwnerId) -> Option<ActiveInstance> {
        self.map.remove(&owner)
    }

    pub fn get(&self, owner: OwnerId) -> Option<&ActiveInstance> {
        self.map.get(&owner)
    }

    pub fn get_mut(&mut self, owner: OwnerId) -> Option<&mut ActiveInstance> {
        self.map.get_mut(&owner)
    }

    pub fn contains(&self, owner: OwnerId) -> bool {
        self.map.contains_key(&owner)
    }

    pub fn owners(&self) -> Vec<OwnerId> {
        self.map.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveInstance> {
        self.map.values()
    }

    pub fn drain(&mut self) -> Vec<ActiveInstance> {
        std::mem::take(&mut self.map).into_values().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
