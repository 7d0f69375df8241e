//! World Entity Gateway: the capability the core uses to spawn, move and
//! remove simulated objects. Owned by the host; the core never assumes any
//! object outlives a call.

use glam::{DVec3, Vec3};
use thiserror::Error;

use crate::companion::DisplayPayload;
use crate::owner::{OwnerId, Placement, WorldId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Invisible posable carrier for a rendered visual (primary and knot).
    Display,
    /// Invisible creature that holds the tether.
    Anchor,
    /// Fence-style fixture a tether can be tied to.
    TetherHitch,
    /// Dropped tether item lying in the world.
    TetherItem,
    Other,
}

impl ObjectKind {
    #[inline]
    pub fn is_tether_fixture(self) -> bool {
        matches!(self, Self::TetherHitch | Self::TetherItem)
    }
}

/// Host-resolved visual ready to be attached to a display object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Visual {
    Block(String),
    Item { material: String, model_data: i32 },
    /// `None` renders the host's plain head.
    Head(Option<String>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpawnConfig {
    /// Identity marker (see `markers`).
    pub marker: String,
    pub visual: Option<Visual>,
    pub scale: Vec3,
    pub small: bool,
}

/// Euler head orientation in radians.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HeadPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl HeadPose {
    pub fn from_degrees(x: f64, y: f64, z: f64) -> Self {
        Self { x: x.to_radians(), y: y.to_radians(), z: z.to_radians() }
    }
}

/// Snapshot of an object as the host sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub marker: Option<String>,
    pub placement: Placement,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("object {0:?} is gone")]
    Gone(ObjectId),
    #[error("world '{0}' is not loaded")]
    UnknownWorld(String),
    #[error("unresolvable visual: {0}")]
    Unresolvable(String),
    #[error("tether rejected: {0}")]
    Tether(String),
    #[error("spawn rejected: {0}")]
    Spawn(String),
}

pub trait WorldGateway {
    /// Turn a definition payload into a host visual.
    fn resolve_visual(&self, payload: &DisplayPayload) -> Result<Visual, GatewayError>;
    /// Resolve a bare block identifier (knot payloads).
    fn resolve_block(&self, block: &str) -> Result<Visual, GatewayError>;
    fn spawn(&mut self, kind: ObjectKind, at: &Placement, config: &SpawnConfig) -> Result<ObjectId, GatewayError>;
    fn teleport(&mut self, id: ObjectId, to: &Placement) -> Result<(), GatewayError>;
    fn set_rotation(&mut self, id: ObjectId, yaw_deg: f32, pitch_deg: f32) -> Result<(), GatewayError>;
    /// No-op for kinds without pose support.
    fn set_head_pose(&mut self, id: ObjectId, pose: HeadPose) -> Result<(), GatewayError>;
    fn remove(&mut self, id: ObjectId) -> Result<(), GatewayError>;
    fn tether(&mut self, anchor: ObjectId, holder: OwnerId) -> Result<(), GatewayError>;
    fn untether(&mut self, anchor: ObjectId) -> Result<(), GatewayError>;
    fn is_valid(&self, id: ObjectId) -> bool;
    fn is_tethered(&self, id: ObjectId) -> bool;
    fn position(&self, id: ObjectId) -> Option<Placement>;
    fn describe(&self, id: ObjectId) -> Option<WorldObject>;
    fn nearby_objects(&self, world: &WorldId, center: DVec3, radius: f64) -> Vec<ObjectId>;
    /// Every object in every loaded world.
    fn objects(&self) -> Vec<WorldObject>;
}
