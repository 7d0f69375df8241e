//! Follow/animation math for one companion, one update pass.
//!
//! Pure functions over plain values so the invariants (phase range, idle
//! factor range, catch-up clamping) are testable without a world.

use std::f64::consts::TAU;

use data_runtime::configs::physics::{FollowCfg, KnotCfg};
use glam::DVec3;

use crate::gateway::HeadPose;
use crate::instance::Phases;

/// Catch-up below this length is ignored.
const CATCH_UP_DEADZONE: f64 = 0.1;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Oscillator {
    pub bob_speed: f64,
    pub sway_speed: f64,
    pub bob_amplitude: f64,
    pub sway_amplitude: f64,
}

impl Oscillator {
    pub fn primary(cfg: &FollowCfg) -> Self {
        Self {
            bob_speed: cfg.bob_speed,
            sway_speed: cfg.sway_speed,
            bob_amplitude: cfg.bob_amplitude,
            sway_amplitude: cfg.sway_amplitude,
        }
    }

    pub fn knot(cfg: &KnotCfg) -> Self {
        Self {
            bob_speed: cfg.bob_speed,
            sway_speed: cfg.sway_speed,
            bob_amplitude: cfg.bob_amplitude,
            sway_amplitude: cfg.sway_amplitude,
        }
    }

    /// (bob, sway) offsets scaled by idle factor.
    #[inline]
    fn offsets(&self, phases: Phases, idle: f64) -> (f64, f64) {
        (
            idle * self.bob_amplitude * phases.bob.sin(),
            idle * self.sway_amplitude * phases.sway.sin(),
        )
    }
}

/// Wrap into [0, 2π).
#[inline]
pub fn wrap_phase(p: f64) -> f64 {
    let w = p.rem_euclid(TAU);
    if w >= TAU || !w.is_finite() { 0.0 } else { w }
}

pub fn advance(phases: &mut Phases, osc: &Oscillator, step: f64) {
    phases.bob = wrap_phase(phases.bob + osc.bob_speed * step);
    phases.sway = wrap_phase(phases.sway + osc.sway_speed * step);
}

/// Grow idle time while the owner is still, reset it on movement.
#[inline]
pub fn accumulate_idle(idle_s: f64, movement: f64, threshold: f64, step: f64) -> f64 {
    if movement < threshold { idle_s + step } else { 0.0 }
}

/// Normalized stillness in [0, 1].
#[inline]
pub fn idle_factor(idle_s: f64, max_idle: f64) -> f64 {
    if max_idle <= 0.0 || !idle_s.is_finite() {
        return 0.0;
    }
    idle_s.clamp(0.0, max_idle) / max_idle
}

#[derive(Copy, Clone, Debug)]
pub struct FollowInput {
    pub owner_pos: DVec3,
    pub yaw_deg: f32,
    /// Where the primary handle is right now.
    pub primary_pos: DVec3,
    /// Definition vertical offset.
    pub offset_y: f64,
    pub idle: f64,
    pub phases: Phases,
    pub knot_phases: Phases,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FollowPose {
    pub primary: DVec3,
    pub primary_pose: HeadPose,
    pub knot: DVec3,
    pub knot_pose: HeadPose,
    pub anchor: DVec3,
}

/// Smooth placement: trail behind the owner, bob/sway while idle, lag
/// toward the owner through a clamped catch-up vector, tilt into motion.
pub fn solve(p: &FollowCfg, k: &KnotCfg, input: &FollowInput) -> FollowPose {
    let a = f64::from(input.yaw_deg).to_radians();
    let (sin_a, cos_a) = a.sin_cos();
    let (bob, sway) = Oscillator::primary(p).offsets(input.phases, input.idle);

    let mut target = input.owner_pos
        + DVec3::new(
            -sin_a * p.follow_distance + sway * cos_a,
            bob,
            -cos_a * p.follow_distance + sway * sin_a,
        )
        + DVec3::new(0.0, p.base_height + input.offset_y, 0.0);

    // Tilt reads the raw catch-up vector; only the translation is clamped.
    let catch_up = input.owner_pos - input.primary_pos;
    let dist = catch_up.length();
    if dist > CATCH_UP_DEADZONE {
        target += catch_up / dist * (dist * p.catch_up_speed).min(p.max_catch_up_speed);
    }

    let pitch = -catch_up.z * p.tilt_multiplier;
    let roll = -catch_up.x * p.tilt_multiplier + input.idle * p.sway_tilt_multiplier * input.phases.sway.sin();

    let (knot_bob, knot_sway) = Oscillator::knot(k).offsets(input.knot_phases, input.idle);
    let knot = target + DVec3::new(knot_sway * cos_a, k.offset + knot_bob, knot_sway * sin_a);
    let knot_pitch = -catch_up.z * k.tilt_multiplier;
    let knot_roll = -catch_up.x * k.tilt_multiplier
        + input.idle * (k.tilt_multiplier * 0.5) * input.knot_phases.sway.sin();

    FollowPose {
        primary: target,
        primary_pose: HeadPose::from_degrees(pitch, 0.0, roll),
        knot,
        knot_pose: HeadPose::from_degrees(knot_pitch, 0.0, knot_roll),
        anchor: target + DVec3::new(0.0, p.anchor_height + p.anchor_offset, 0.0),
    }
}

/// Primary drifted beyond the tolerated distance from the owner.
#[inline]
pub fn needs_resync(p: &FollowCfg, owner_pos: DVec3, primary_pos: DVec3) -> bool {
    primary_pos.distance(owner_pos) > p.max_distance
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SnapPose {
    pub primary: DVec3,
    pub knot: DVec3,
    pub anchor: DVec3,
}

/// Hard resync placement directly above the owner.
pub fn snap(p: &FollowCfg, k: &KnotCfg, owner_pos: DVec3) -> SnapPose {
    let primary = owner_pos + DVec3::new(0.0, p.base_height, 0.0);
    SnapPose {
        primary,
        knot: primary + DVec3::new(0.0, k.offset, 0.0),
        anchor: primary + DVec3::new(0.0, p.anchor_height + p.anchor_offset, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(owner: DVec3, primary: DVec3) -> FollowInput {
        FollowInput {
            owner_pos: owner,
            yaw_deg: 0.0,
            primary_pos: primary,
            offset_y: 0.0,
            idle: 0.0,
            phases: Phases::default(),
            knot_phases: Phases::default(),
        }
    }

    #[test]
    fn phases_stay_in_range_over_many_passes() {
        let osc = Oscillator { bob_speed: 7.3, sway_speed: 123.0, bob_amplitude: 1.0, sway_amplitude: 1.0 };
        let mut ph = Phases::default();
        for _ in 0..100_000 {
            advance(&mut ph, &osc, 0.05);
            assert!((0.0..TAU).contains(&ph.bob), "bob {}", ph.bob);
            assert!((0.0..TAU).contains(&ph.sway), "sway {}", ph.sway);
        }
        assert_eq!(wrap_phase(TAU), 0.0);
        assert!(wrap_phase(-0.1) > 6.0);
    }

    #[test]
    fn idle_factor_is_bounded() {
        for idle in [-5.0, 0.0, 0.5, 2.0, 1e9, f64::INFINITY] {
            let f = idle_factor(idle, 2.0);
            assert!((0.0..=1.0).contains(&f), "{idle} -> {f}");
        }
        assert_eq!(idle_factor(1.0, 2.0), 0.5);
        assert_eq!(idle_factor(10.0, 2.0), 1.0);
    }

    #[test]
    fn idle_accumulates_then_resets() {
        let idle = accumulate_idle(0.0, 0.01, 0.1, 0.05);
        let idle = accumulate_idle(idle, 0.0, 0.1, 0.05);
        assert!((idle - 0.1).abs() < 1e-12);
        assert_eq!(accumulate_idle(idle, 0.5, 0.1, 0.05), 0.0);
    }

    #[test]
    fn settled_companion_trails_behind_owner() {
        let p = FollowCfg::default();
        let k = KnotCfg::default();
        // yaw 0 faces +z; follow distance puts the target at z = -1
        let owner = DVec3::ZERO;
        let settled = DVec3::new(0.0, 0.05, 0.0);
        let pose = solve(&p, &k, &input(owner, settled));
        assert!((pose.primary - DVec3::new(0.0, 2.5, -1.0)).length() < 1e-9);
        assert!((pose.knot.y - (2.5 - 0.3)).abs() < 1e-9);
        assert!((pose.anchor.y - 4.0).abs() < 1e-9);
    }

    #[test]
    fn catch_up_translation_is_clamped_but_tilt_is_not() {
        let p = FollowCfg::default();
        let k = KnotCfg::default();
        let owner = DVec3::new(0.0, 0.0, 0.0);
        let lagging = DVec3::new(0.0, 0.0, -4.0);
        let pose = solve(&p, &k, &input(owner, lagging));
        // base target z = -1, catch-up adds +0.5 (clamped from 4 * 0.3)
        assert!((pose.primary.z - (-0.5)).abs() < 1e-9);
        // pitch = -(4.0) * 30 degrees
        assert!((pose.primary_pose.x - (-120.0f64).to_radians()).abs() < 1e-9);
        assert!((pose.knot_pose.x - (-80.0f64).to_radians()).abs() < 1e-9);
    }

    #[test]
    fn idle_sway_offsets_laterally() {
        let p = FollowCfg::default();
        let k = KnotCfg::default();
        let mut inp = input(DVec3::ZERO, DVec3::new(0.0, 0.05, 0.0));
        inp.idle = 1.0;
        inp.phases.sway = std::f64::consts::FRAC_PI_2;
        let pose = solve(&p, &k, &inp);
        assert!((pose.primary.x - p.sway_amplitude).abs() < 1e-9);
        assert!((pose.primary_pose.z - p.sway_tilt_multiplier.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn snap_is_relative_to_owner() {
        let p = FollowCfg::default();
        let k = KnotCfg::default();
        let s = snap(&p, &k, DVec3::new(10.0, 64.0, -3.0));
        assert_eq!(s.primary, DVec3::new(10.0, 66.5, -3.0));
        assert!((s.knot.y - 66.2).abs() < 1e-9);
        assert_eq!(s.anchor, DVec3::new(10.0, 68.0, -3.0));
        assert!(needs_resync(&p, DVec3::ZERO, DVec3::new(20.0, 0.0, 0.0)));
        assert!(!needs_resync(&p, DVec3::ZERO, DVec3::new(0.0, 2.5, -1.0)));
    }
}
