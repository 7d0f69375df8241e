//! Companion follow/animation tuning loaded from data/config/companions.toml
//! with defaults, clamping and env overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Follow and idle-animation tuning for the primary handle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FollowCfg {
    /// Height of the primary handle above the owner's feet.
    pub base_height: f64,
    /// Per-tick movement below this counts as idle.
    pub idle_threshold: f64,
    pub bob_speed: f64,
    pub sway_speed: f64,
    pub bob_amplitude: f64,
    pub sway_amplitude: f64,
    /// Distance behind the owner along its facing.
    pub follow_distance: f64,
    /// Drift beyond this snaps the companion back to the owner.
    pub max_distance: f64,
    pub anchor_height: f64,
    pub anchor_offset: f64,
    /// Radius around the owner scanned for stale tether fixtures on equip.
    pub cleanup_radius: f64,
    pub catch_up_speed: f64,
    pub max_catch_up_speed: f64,
    /// Degrees of tilt per unit of catch-up vector.
    pub tilt_multiplier: f64,
    pub sway_tilt_multiplier: f64,
    /// Seconds of stillness until idle animation reaches full amplitude.
    pub max_idle_time: f64,
    /// Host ticks between update passes.
    pub update_interval_ticks: u64,
    /// Fixed animation step per update pass (seconds). Not scaled by
    /// `update_interval_ticks`.
    pub nominal_step_s: f64,
    /// Squared owner displacement per pass treated as a teleport.
    pub teleport_threshold_sq: f64,
}

impl Default for FollowCfg {
    fn default() -> Self {
        Self {
            base_height: 2.5,
            idle_threshold: 0.1,
            bob_speed: 2.0,
            sway_speed: 1.5,
            bob_amplitude: 0.15,
            sway_amplitude: 0.1,
            follow_distance: 1.0,
            max_distance: 5.0,
            anchor_height: 1.5,
            anchor_offset: 0.0,
            cleanup_radius: 10.0,
            catch_up_speed: 0.3,
            max_catch_up_speed: 0.5,
            tilt_multiplier: 30.0,
            sway_tilt_multiplier: 15.0,
            max_idle_time: 2.0,
            update_interval_ticks: 1,
            nominal_step_s: 0.05,
            teleport_threshold_sq: 100.0,
        }
    }
}

/// Secondary decorative handle ("knot") tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KnotCfg {
    pub enabled: bool,
    /// Vertical offset from the primary handle.
    pub offset: f64,
    pub scale: f32,
    pub bob_speed: f64,
    pub bob_amplitude: f64,
    pub sway_speed: f64,
    pub sway_amplitude: f64,
    pub tilt_multiplier: f64,
}

impl Default for KnotCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            offset: -0.3,
            scale: 0.4,
            bob_speed: 1.5,
            bob_amplitude: 0.1,
            sway_speed: 1.0,
            sway_amplitude: 0.05,
            tilt_multiplier: 20.0,
        }
    }
}

/// Timers for lifecycle jobs, in host ticks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EntityCfg {
    pub cleanup_startup_delay_ticks: u64,
    pub respawn_delay_ticks: u64,
    pub visibility_restore_delay_ticks: u64,
    pub respawn_restore_delay_ticks: u64,
    pub max_jobs_per_tick: usize,
}

impl Default for EntityCfg {
    fn default() -> Self {
        Self {
            cleanup_startup_delay_ticks: 40,
            respawn_delay_ticks: 3,
            visibility_restore_delay_ticks: 5,
            respawn_restore_delay_ticks: 10,
            max_jobs_per_tick: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CompanionPhysicsCfg {
    pub physics: FollowCfg,
    pub knot: KnotCfg,
    pub entity: EntityCfg,
}

fn clamp(mut cfg: CompanionPhysicsCfg) -> CompanionPhysicsCfg {
    let p = &mut cfg.physics;
    if p.update_interval_ticks == 0 { p.update_interval_ticks = 1; }
    if p.max_idle_time.is_nan() || p.max_idle_time < 0.05 { p.max_idle_time = 0.05; }
    if !p.nominal_step_s.is_finite() || p.nominal_step_s <= 0.0 { p.nominal_step_s = 0.05; }
    if p.max_distance.is_nan() || p.max_distance < 0.5 { p.max_distance = 0.5; }
    if p.teleport_threshold_sq < 1.0 { p.teleport_threshold_sq = 1.0; }
    if p.cleanup_radius < 0.0 { p.cleanup_radius = 0.0; }
    if p.max_catch_up_speed < 0.0 { p.max_catch_up_speed = 0.0; }
    if cfg.knot.scale <= 0.0 { cfg.knot.scale = 0.4; }
    if cfg.entity.max_jobs_per_tick == 0 { cfg.entity.max_jobs_per_tick = 1; }
    cfg
}

fn apply_env(cfg: &mut CompanionPhysicsCfg) {
    if let Some(v) = std::env::var("COMPANION_UPDATE_INTERVAL").ok().and_then(|v| v.parse().ok()) {
        cfg.physics.update_interval_ticks = v;
    }
    if let Some(v) = std::env::var("COMPANION_NOMINAL_STEP").ok().and_then(|v| v.parse().ok()) {
        cfg.physics.nominal_step_s = v;
    }
    if let Some(v) = std::env::var("COMPANION_KNOT_ENABLED").ok().and_then(|v| v.parse().ok()) {
        cfg.knot.enabled = v;
    }
}

/// Parse tuning from TOML text and clamp it. Env overrides are not applied.
pub fn parse(txt: &str) -> Result<CompanionPhysicsCfg> {
    let parsed: CompanionPhysicsCfg = toml::from_str(txt).context("parse companions TOML")?;
    Ok(clamp(parsed))
}

/// Load tuning from `<root>/config/companions.toml`, falling back to
/// defaults when the file is absent, then apply env overrides.
pub fn load_from(root: &Path) -> Result<CompanionPhysicsCfg> {
    let path = root.join("config/companions.toml");
    let mut cfg = if path.is_file() {
        let txt = std::fs::read_to_string(&path)
            .with_context(|| format!("read {}", path.display()))?;
        parse(&txt)?
    } else {
        CompanionPhysicsCfg::default()
    };
    apply_env(&mut cfg);
    Ok(clamp(cfg))
}

pub fn load_default() -> Result<CompanionPhysicsCfg> {
    load_from(&crate::loader::data_root())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let cfg = parse("[physics]\nbase_height = 3.0\n[knot]\nenabled = false\n").expect("parse");
        assert_eq!(cfg.physics.base_height, 3.0);
        assert_eq!(cfg.physics.follow_distance, 1.0);
        assert!(!cfg.knot.enabled);
        assert_eq!(cfg.entity.respawn_delay_ticks, 3);
    }

    #[test]
    fn clamps_degenerate_values() {
        let cfg = parse("[physics]\nupdate_interval_ticks = 0\nmax_idle_time = 0.0\n").expect("parse");
        assert_eq!(cfg.physics.update_interval_ticks, 1);
        assert!(cfg.physics.max_idle_time > 0.0);
    }
}
