//! Tick Update Engine: per-instance integrity checks, then follow/animation.
//!
//! Check order per owner: connected -> equip state -> visibility -> teleport
//! -> tether -> animate. The first failing check tears the instance down and
//! skips the rest; the engine never spawns on its own.

use crate::CompanionServer;
use crate::gateway::{GatewayError, WorldGateway};
use crate::jobs::Job;
use crate::owner::{OwnerDirectory, OwnerId, OwnerTransform, Placement};
use crate::store::OwnershipStore;
use crate::systems::follow::{self, FollowInput, Oscillator};

/// Outcome of the integrity checks for one instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Animate,
    Drop(&'static str),
    Teleported,
}

fn log_move(owner: OwnerId, what: &str, res: Result<(), GatewayError>) {
    if let Err(e) = res {
        log::debug!("update {owner}: {what}: {e}");
    }
}

impl<W, D, S> CompanionServer<W, D, S>
where
    W: WorldGateway,
    D: OwnerDirectory,
    S: OwnershipStore,
{
    /// One update pass over every active instance in owner order.
    pub fn update_all(&mut self) {
        for owner in self.instances.owners() {
            let Some(transform) = self.owners.transform(owner) else {
                self.teardown(owner, "disconnect");
                continue;
            };
            match self.check(owner, &transform) {
                Verdict::Animate => self.animate(owner, &transform),
                Verdict::Drop(reason) => {
                    self.teardown(owner, reason);
                }
                Verdict::Teleported => {
                    self.teardown(owner, "teleport");
                    metrics::counter!("companions.teleports_total").increment(1);
                    let due = self.tick + self.physics.entity.respawn_delay_ticks;
                    self.jobs.schedule(Job::TeleportRespawn { owner }, due);
                    log::debug!("update {owner}: teleport, respawn due at tick {due}");
                }
            }
        }
    }

    /// Integrity checks 1-5. Re-tethers as a side effect.
    pub fn check(&mut self, owner: OwnerId, transform: &OwnerTransform) -> Verdict {
        let Some(inst) = self.instances.get(owner) else {
            return Verdict::Drop("missing");
        };
        if !self.owners.is_online(owner) {
            return Verdict::Drop("disconnect");
        }
        let equipped = self.store.cached(owner).and_then(|r| r.equipped.as_deref());
        if equipped != Some(inst.companion_id()) {
            return Verdict::Drop("desync");
        }
        if !self.visibility.is_visible(owner, &self.owners.presence(owner)) {
            return Verdict::Drop("hidden");
        }
        let jumped = transform.world != inst.last.world
            || transform.pos.distance_squared(inst.last.pos) > self.physics.physics.teleport_threshold_sq;
        if jumped {
            return Verdict::Teleported;
        }
        let anchor = inst.anchor;
        if !self.world.is_valid(anchor) || !self.world.is_tethered(anchor) {
            if let Err(e) = self.world.tether(anchor, owner) {
                log::debug!("update {owner}: re-tether failed: {e}");
                return Verdict::Drop("tether");
            }
            log::debug!("update {owner}: re-tethered {anchor:?}");
        }
        Verdict::Animate
    }

    /// Step 6: integrate idle/phases and move every handle.
    fn animate(&mut self, owner: OwnerId, transform: &OwnerTransform) {
        let Some(inst) = self.instances.get_mut(owner) else {
            return;
        };
        let p = &self.physics.physics;
        let k = &self.physics.knot;
        let step = p.nominal_step_s;

        let movement = transform.pos.distance(inst.last.pos);
        inst.idle_s = follow::accumulate_idle(inst.idle_s, movement, p.idle_threshold, step);
        follow::advance(&mut inst.phases, &Oscillator::primary(p), step);
        follow::advance(&mut inst.knot_phases, &Oscillator::knot(k), step);

        let primary_pos = self.world.position(inst.primary).map_or(transform.pos, |at| at.pos);
        let input = FollowInput {
            owner_pos: transform.pos,
            yaw_deg: transform.yaw_deg,
            primary_pos,
            offset_y: inst.definition.offset.y,
            idle: follow::idle_factor(inst.idle_s, p.max_idle_time),
            phases: inst.phases,
            knot_phases: inst.knot_phases,
        };
        let pose = follow::solve(p, k, &input);
        // Checked on both sides of the move so a target that is itself out of
        // range stays snapped instead of alternating with the smooth pose.
        let resync =
            follow::needs_resync(p, transform.pos, primary_pos) || follow::needs_resync(p, transform.pos, pose.primary);
        let (primary_to, knot_to, anchor_to) = if resync {
            let s = follow::snap(p, k, transform.pos);
            log::debug!("update {owner}: hard resync");
            (s.primary, s.knot, s.anchor)
        } else {
            (pose.primary, pose.knot, pose.anchor)
        };

        let at = |pos| Placement::new(transform.world.clone(), pos);
        let world = &mut self.world;
        log_move(owner, "primary", world.teleport(inst.primary, &at(primary_to)));
        let yaw = transform.yaw_deg + inst.definition.rotation;
        log_move(owner, "primary rotation", world.set_rotation(inst.primary, yaw, 0.0));
        log_move(owner, "primary pose", world.set_head_pose(inst.primary, pose.primary_pose));
        if let Some(knot) = inst.knot {
            log_move(owner, "knot", world.teleport(knot, &at(knot_to)));
            log_move(owner, "knot rotation", world.set_rotation(knot, transform.yaw_deg, 0.0));
            log_move(owner, "knot pose", world.set_head_pose(knot, pose.knot_pose));
        }
        log_move(owner, "anchor", world.teleport(inst.anchor, &at(anchor_to)));

        inst.last = transform.placement();
    }
}
