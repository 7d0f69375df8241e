//! In-memory world implementing `WorldGateway`, with failure switches for tests.

use std::collections::{BTreeMap, HashSet};

use glam::{DVec3, Vec3};

use crate::companion::DisplayPayload;
use crate::gateway::{GatewayError, HeadPose, ObjectId, ObjectKind, SpawnConfig, Visual, WorldGateway, WorldObject};
use crate::owner::{OwnerId, Placement, WorldId};

#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessObject {
    pub kind: ObjectKind,
    pub marker: Option<String>,
    pub placement: Placement,
    pub visual: Option<Visual>,
    pub scale: Vec3,
    pub small: bool,
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub pose: HeadPose,
    pub tethered_to: Option<OwnerId>,
}

impl HeadlessObject {
    fn new(kind: ObjectKind, marker: Option<String>, placement: Placement) -> Self {
        Self {
            kind,
            marker,
            placement,
            visual: None,
            scale: Vec3::ONE,
            small: false,
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            pose: HeadPose::default(),
            tethered_to: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct HeadlessWorld {
    next_id: u64,
    objects: BTreeMap<ObjectId, HeadlessObject>,
    unloaded: HashSet<WorldId>,
    failing_spawns: HashSet<ObjectKind>,
    failing_markers: Vec<String>,
    fail_tether: bool,
    fail_resolve: bool,
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, obj: HeadlessObject) -> ObjectId {
        self.next_id = self.next_id.wrapping_add(1);
        let id = ObjectId(self.next_id);
        self.objects.insert(id, obj);
        id
    }

    /// Place an arbitrary object (fixtures, stale companions, bystanders).
    pub fn insert(&mut self, kind: ObjectKind, marker: Option<&str>, at: Placement) -> ObjectId {
        self.alloc(HeadlessObject::new(kind, marker.map(str::to_string), at))
    }

    pub fn get(&self, id: ObjectId) -> Option<&HeadlessObject> {
        self.objects.get(&id)
    }

    /// Move an object behind the service's back.
    pub fn force_move(&mut self, id: ObjectId, pos: DVec3) -> bool {
        match self.objects.get_mut(&id) {
            Some(o) => {
                o.placement.pos = pos;
                true
            }
            None => false,
        }
    }

    /// Simulate a broken leash.
    pub fn drop_tether(&mut self, id: ObjectId) {
        if let Some(o) = self.objects.get_mut(&id) {
            o.tethered_to = None;
        }
    }

    /// Spawns into `world` fail with `UnknownWorld` from now on.
    pub fn unload_world(&mut self, world: WorldId) {
        self.unloaded.insert(world);
    }

    pub fn set_spawn_failure(&mut self, kind: ObjectKind, fail: bool) {
        if fail {
            self.failing_spawns.insert(kind);
        } else {
            self.failing_spawns.remove(&kind);
        }
    }

    /// Reject spawns whose marker starts with `prefix`.
    pub fn fail_spawns_marked(&mut self, prefix: &str) {
        self.failing_markers.push(prefix.to_string());
    }

    pub fn set_tether_failure(&mut self, fail: bool) {
        self.fail_tether = fail;
    }

    pub fn set_resolve_failure(&mut self, fail: bool) {
        self.fail_resolve = fail;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Live objects whose marker starts with `prefix`.
    pub fn count_marked(&self, prefix: &str) -> usize {
        self.objects.values().filter(|o| o.marker.as_deref().is_some_and(|m| m.starts_with(prefix))).count()
    }

    fn get_mut(&mut self, id: ObjectId) -> Result<&mut HeadlessObject, GatewayError> {
        self.objects.get_mut(&id).ok_or(GatewayError::Gone(id))
    }
}

impl WorldGateway for HeadlessWorld {
    fn resolve_visual(&self, payload: &DisplayPayload) -> Result<Visual, GatewayError> {
        if self.fail_resolve {
            return Err(GatewayError::Unresolvable(format!("{payload:?}")));
        }
        Ok(match payload {
            DisplayPayload::Block { block } => Visual::Block(block.clone()),
            DisplayPayload::Item { material, model_data } => {
                Visual::Item { material: material.clone(), model_data: *model_data }
            }
            DisplayPayload::Head { texture } => Visual::Head(Some(texture.clone())),
        })
    }

    fn resolve_block(&self, block: &str) -> Result<Visual, GatewayError> {
        if self.fail_resolve {
            return Err(GatewayError::Unresolvable(block.to_string()));
        }
        Ok(Visual::Block(block.to_string()))
    }

    fn spawn(&mut self, kind: ObjectKind, at: &Placement, config: &SpawnConfig) -> Result<ObjectId, GatewayError> {
        if self.unloaded.contains(&at.world) {
            return Err(GatewayError::UnknownWorld(at.world.0.clone()));
        }
        if self.failing_spawns.contains(&kind) {
            return Err(GatewayError::Spawn(format!("{kind:?} disabled")));
        }
        if self.failing_markers.iter().any(|p| config.marker.starts_with(p.as_str())) {
            return Err(GatewayError::Spawn(format!("'{}' disabled", config.marker)));
        }
        let mut obj = HeadlessObject::new(kind, Some(config.marker.clone()), at.clone());
        obj.visual = config.visual.clone();
        obj.scale = config.scale;
        obj.small = config.small;
        Ok(self.alloc(obj))
    }

    fn teleport(&mut self, id: ObjectId, to: &Placement) -> Result<(), GatewayError> {
        self.get_mut(id)?.placement = to.clone();
        Ok(())
    }

    fn set_rotation(&mut self, id: ObjectId, yaw_deg: f32, pitch_deg: f32) -> Result<(), GatewayError> {
        let o = self.get_mut(id)?;
        o.yaw_deg = yaw_deg;
        o.pitch_deg = pitch_deg;
        Ok(())
    }

    fn set_head_pose(&mut self, id: ObjectId, pose: HeadPose) -> Result<(), GatewayError> {
        let o = self.get_mut(id)?;
        if o.kind == ObjectKind::Display {
            o.pose = pose;
        }
        Ok(())
    }

    fn remove(&mut self, id: ObjectId) -> Result<(), GatewayError> {
        self.objects.remove(&id).map(|_| ()).ok_or(GatewayError::Gone(id))
    }

    fn tether(&mut self, anchor: ObjectId, holder: OwnerId) -> Result<(), GatewayError> {
        if self.fail_tether {
            return Err(GatewayError::Tether(format!("{anchor:?} refused")));
        }
        self.get_mut(anchor)?.tethered_to = Some(holder);
        Ok(())
    }

    fn untether(&mut self, anchor: ObjectId) -> Result<(), GatewayError> {
        self.get_mut(anchor)?.tethered_to = None;
        Ok(())
    }

    fn is_valid(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    fn is_tethered(&self, id: ObjectId) -> bool {
        self.objects.get(&id).is_some_and(|o| o.tethered_to.is_some())
    }

    fn position(&self, id: ObjectId) -> Option<Placement> {
        self.objects.get(&id).map(|o| o.placement.clone())
    }

    fn describe(&self, id: ObjectId) -> Option<WorldObject> {
        self.objects.get(&id).map(|o| WorldObject {
            id,
            kind: o.kind,
            marker: o.marker.clone(),
            placement: o.placement.clone(),
        })
    }

    fn nearby_objects(&self, world: &WorldId, center: DVec3, radius: f64) -> Vec<ObjectId> {
        let r2 = radius * radius;
        self.objects
            .iter()
            .filter(|(_, o)| &o.placement.world == world && o.placement.pos.distance_squared(center) <= r2)
            .map(|(id, _)| *id)
            .collect()
    }

    fn objects(&self) -> Vec<WorldObject> {
        self.objects.keys().filter_map(|&id| self.describe(id)).collect()
    }
}
