//! Lifecycle Manager: equip, unequip, the single teardown path, reload and
//! shutdown. Everything here runs on the tick thread.

use glam::{DVec3, Vec3};
use thiserror::Error;

use crate::CompanionServer;
use crate::companion::{CompanionDefinition, DEFAULT_BLOCK, DEFAULT_KNOT_BLOCK, DisplayPayload};
use crate::gateway::{GatewayError, ObjectId, ObjectKind, SpawnConfig, Visual, WorldGateway};
use crate::instance::ActiveInstance;
use crate::jobs::Job;
use crate::markers::{ObjectMarker, Role};
use crate::owner::{OwnerDirectory, OwnerId, Placement};
use crate::store::{OwnershipStore, StoreError};

#[derive(Debug, Error)]
pub enum EquipError {
    #[error("unknown companion '{0}'")]
    UnknownCompanion(String),
    #[error("missing permission '{0}'")]
    PermissionDenied(String),
    #[error("companion '{0}' is not owned")]
    NotOwned(String),
    #[error("owner {0} is offline")]
    OwnerOffline(OwnerId),
    #[error("spawn failed: {0}")]
    Spawn(#[from] GatewayError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EquipError {
    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownCompanion(_) => "unknown",
            Self::PermissionDenied(_) => "permission",
            Self::NotOwned(_) => "not_owned",
            Self::OwnerOffline(_) => "offline",
            Self::Spawn(_) => "spawn",
            Self::Store(_) => "store",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompanionState {
    Unequipped,
    Equipping,
    Active,
    TeleportPending,
}

/// Release every handle of `inst`. Each step runs regardless of earlier
/// failures; failures are logged and swallowed.
pub(crate) fn release<W: WorldGateway>(world: &mut W, inst: &ActiveInstance, reason: &'static str) {
    if let Err(e) = world.untether(inst.anchor) {
        log::debug!("teardown {}: untether {:?}: {e}", inst.owner, inst.anchor);
    }
    for id in [Some(inst.anchor), inst.knot, Some(inst.primary)].into_iter().flatten() {
        if let Err(e) = world.remove(id) {
            log::debug!("teardown {}: remove {id:?}: {e}", inst.owner);
        }
    }
    metrics::counter!("companions.teardowns_total", "reason" => reason).increment(1);
    log::debug!("teardown {} '{}' ({reason})", inst.owner, inst.companion_id());
}

/// Default visual for a display kind when the host cannot resolve the payload.
fn fallback_visual(payload: &DisplayPayload) -> Visual {
    match payload {
        DisplayPayload::Block { .. } => Visual::Block(DEFAULT_BLOCK.to_string()),
        DisplayPayload::Item { material, model_data } => {
            Visual::Item { material: material.clone(), model_data: *model_data }
        }
        DisplayPayload::Head { .. } => Visual::Head(None),
    }
}

fn remove_quietly<W: WorldGateway>(world: &mut W, ids: &[ObjectId]) {
    for &id in ids {
        if let Err(e) = world.remove(id) {
            log::debug!("rollback: remove {id:?}: {e}");
        }
    }
}

impl<W, D, S> CompanionServer<W, D, S>
where
    W: WorldGateway,
    D: OwnerDirectory,
    S: OwnershipStore,
{
    /// Replace whatever `owner` has with `companion`. On error nothing new
    /// is left in the world or the table.
    pub fn equip(&mut self, owner: OwnerId, companion: &str) -> Result<(), EquipError> {
        let res = self.try_equip(owner, companion);
        match &res {
            Ok(()) => {
                metrics::counter!("companions.equips_total").increment(1);
                log::info!("equip {owner} '{companion}'");
            }
            Err(e) => {
                metrics::counter!("companions.equip_failures_total", "reason" => e.reason()).increment(1);
                log::warn!("equip {owner} '{companion}' failed: {e}");
            }
        }
        self.publish_active();
        res
    }

    fn try_equip(&mut self, owner: OwnerId, companion: &str) -> Result<(), EquipError> {
        let def = self
            .registry
            .get(companion)
            .ok_or_else(|| EquipError::UnknownCompanion(companion.to_string()))?;
        if let Some(node) = &def.permission
            && !self.owners.has_permission(owner, node)
        {
            return Err(EquipError::PermissionDenied(node.clone()));
        }
        if !self.store.owned(owner)?.contains(companion) {
            return Err(EquipError::NotOwned(companion.to_string()));
        }

        self.teardown(owner, "replaced");

        let transform = self
            .owners
            .transform(owner)
            .filter(|_| self.owners.is_online(owner))
            .ok_or(EquipError::OwnerOffline(owner))?;
        let origin = transform.placement();
        let p = &self.physics.physics;
        let primary_at = origin.offset(DVec3::new(def.offset.x, p.base_height + def.offset.y, def.offset.z));
        let anchor_at = primary_at.offset(DVec3::new(0.0, p.anchor_height + p.anchor_offset, 0.0));
        let cleanup_radius = p.cleanup_radius;

        let visual = self.world.resolve_visual(&def.display).unwrap_or_else(|e| {
            log::warn!("equip {owner} '{companion}': {e}; using default {} visual", def.display.kind_name());
            fallback_visual(&def.display)
        });
        let primary = self.world.spawn(
            ObjectKind::Display,
            &primary_at,
            &SpawnConfig {
                marker: ObjectMarker::new(Role::Primary, owner, &def.id).encode(),
                visual: Some(visual),
                scale: def.scale,
                small: false,
            },
        )?;

        let knot = if self.physics.knot.enabled { self.spawn_knot(owner, &def, &primary_at) } else { None };

        self.clear_tether_fixtures(&origin, cleanup_radius);
        let anchor = match self.world.spawn(
            ObjectKind::Anchor,
            &anchor_at,
            &SpawnConfig {
                marker: ObjectMarker::new(Role::Anchor, owner, &def.id).encode(),
                visual: None,
                scale: Vec3::ONE,
                small: true,
            },
        ) {
            Ok(id) => id,
            Err(e) => {
                let spawned: Vec<ObjectId> = knot.into_iter().chain([primary]).collect();
                remove_quietly(&mut self.world, &spawned);
                return Err(e.into());
            }
        };
        if let Err(e) = self.world.tether(anchor, owner) {
            log::warn!("equip {owner} '{companion}': tether failed, update pass will retry: {e}");
        }

        let inst = ActiveInstance::new(owner, def, primary, knot, anchor, origin);
        if let Some(stale) = self.instances.insert(inst) {
            release(&mut self.world, &stale, "replaced");
        }
        if let Err(e) = self.store.set_equipped(owner, Some(companion)) {
            self.teardown(owner, "store");
            return Err(e.into());
        }
        Ok(())
    }

    fn spawn_knot(&mut self, owner: OwnerId, def: &CompanionDefinition, primary_at: &Placement) -> Option<ObjectId> {
        let k = &self.physics.knot;
        let block = def.knot_block.as_deref().unwrap_or(DEFAULT_KNOT_BLOCK);
        let visual = self.world.resolve_block(block).unwrap_or_else(|e| {
            log::warn!("equip {owner} '{}': knot {e}; using {DEFAULT_KNOT_BLOCK}", def.id);
            Visual::Block(DEFAULT_KNOT_BLOCK.to_string())
        });
        let at = primary_at.offset(DVec3::new(0.0, k.offset, 0.0));
        let cfg = SpawnConfig {
            marker: ObjectMarker::new(Role::Knot, owner, &def.id).encode(),
            visual: Some(visual),
            scale: Vec3::splat(k.scale),
            small: false,
        };
        match self.world.spawn(ObjectKind::Display, &at, &cfg) {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("equip {owner} '{}': knot spawn failed, continuing without: {e}", def.id);
                None
            }
        }
    }

    /// Remove stale hitches and dropped tether items around `at`.
    fn clear_tether_fixtures(&mut self, at: &Placement, radius: f64) -> usize {
        let mut removed = 0usize;
        for id in self.world.nearby_objects(&at.world, at.pos, radius) {
            let stale = self.world.describe(id).is_some_and(|o| o.kind.is_tether_fixture());
            if stale && self.world.remove(id).is_ok() {
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("cleared {removed} tether fixtures near {:?}", at.pos);
        }
        removed
    }

    /// Tear down the active companion (if any) and persist "nothing equipped".
    pub fn unequip(&mut self, owner: OwnerId) -> Result<(), StoreError> {
        self.teardown(owner, "unequip");
        self.store.set_equipped(owner, None)
    }

    /// Drop `owner`'s instance from the table and release its handles.
    /// Returns whether there was one.
    pub fn teardown(&mut self, owner: OwnerId, reason: &'static str) -> bool {
        let Some(inst) = self.instances.remove(owner) else {
            return false;
        };
        release(&mut self.world, &inst, reason);
        self.publish_active();
        true
    }

    /// Re-read tuning and definitions, then resume every owner that is still
    /// online and whose companion still exists (queued as `Equip` jobs).
    pub fn reload(&mut self) -> anyhow::Result<usize> {
        let resume: Vec<(OwnerId, String)> =
            self.instances.iter().map(|i| (i.owner, i.companion_id().to_string())).collect();
        for inst in self.instances.drain() {
            release(&mut self.world, &inst, "reload");
        }
        self.registry.clear();
        match self.source.physics() {
            Ok(p) => self.physics = p,
            Err(e) => log::warn!("reload: physics config failed, keeping previous: {e:#}"),
        }
        let loaded = self.registry.reload(&*self.source);
        self.timer.start(self.tick, self.physics.physics.update_interval_ticks);
        let mut resumed = 0usize;
        for (owner, companion) in resume {
            if self.owners.is_online(owner) && self.registry.contains(&companion) {
                self.jobs.push(Job::Equip { owner, companion });
                resumed += 1;
            }
        }
        self.publish_active();
        match &loaded {
            Ok(n) => log::info!("reload: {n} definitions, {resumed} owners queued for resume"),
            Err(e) => log::warn!("reload: definitions failed to load: {e:#}"),
        }
        loaded
    }

    /// Stop the trigger, drop pending work and release every instance.
    pub fn shutdown(&mut self) {
        self.timer.cancel();
        self.jobs.clear();
        let all = self.instances.drain();
        let n = all.len();
        for inst in &all {
            release(&mut self.world, inst, "shutdown");
        }
        self.publish_active();
        log::info!("shutdown: released {n} companions");
    }

    pub fn has_companion(&self, owner: OwnerId) -> bool {
        self.instances.contains(owner)
    }

    pub fn active_count(&self) -> usize {
        self.instances.len()
    }

    pub fn state(&self, owner: OwnerId) -> CompanionState {
        if self.instances.contains(owner) {
            return CompanionState::Active;
        }
        let mut state = CompanionState::Unequipped;
        for job in self.jobs.pending_for(owner) {
            match job {
                Job::Equip { .. } | Job::Restore { .. } => return CompanionState::Equipping,
                Job::TeleportRespawn { .. } => state = CompanionState::TeleportPending,
                _ => {}
            }
        }
        state
    }

    pub(crate) fn publish_active(&self) {
        metrics::gauge!("companions.active").set(self.instances.len() as f64);
    }
}
