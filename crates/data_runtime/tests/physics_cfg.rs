use data_runtime::configs::physics::{CompanionPhysicsCfg, load_from};
use serial_test::serial;
use std::fs;

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    let tmp = tempfile::TempDir::new().unwrap();
    let cfg = load_from(tmp.path()).expect("load");
    assert_eq!(cfg, CompanionPhysicsCfg::default());
    assert_eq!(cfg.physics.teleport_threshold_sq, 100.0);
    assert_eq!(cfg.physics.nominal_step_s, 0.05);
}

#[test]
#[serial]
fn env_overrides_win_over_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/companions.toml"),
        "[physics]\nupdate_interval_ticks = 2\n[knot]\nenabled = true\n",
    )
    .unwrap();
    unsafe {
        std::env::set_var("COMPANION_UPDATE_INTERVAL", "4");
        std::env::set_var("COMPANION_KNOT_ENABLED", "false");
    }
    let cfg = load_from(tmp.path()).expect("load");
    unsafe {
        std::env::remove_var("COMPANION_UPDATE_INTERVAL");
        std::env::remove_var("COMPANION_KNOT_ENABLED");
    }
    assert_eq!(cfg.physics.update_interval_ticks, 4);
    assert!(!cfg.knot.enabled);
}

#[test]
#[serial]
fn shipped_file_parses() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data");
    let cfg = load_from(&root).expect("load shipped config");
    assert!(cfg.physics.base_height > 0.0);
}

#[test]
#[serial]
fn non_finite_tuning_is_clamped() {
    let cfg = data_runtime::configs::physics::parse("[physics]\nmax_idle_time = nan\nmax_distance = nan\n").unwrap();
    assert_eq!(cfg.physics.max_idle_time, 0.05);
    assert_eq!(cfg.physics.max_distance, 0.5);

    let tmp = tempfile::TempDir::new().unwrap();
    unsafe {
        std::env::set_var("COMPANION_NOMINAL_STEP", "NaN");
    }
    let cfg = load_from(tmp.path()).expect("load");
    unsafe {
        std::env::remove_var("COMPANION_NOMINAL_STEP");
    }
    assert_eq!(cfg.physics.nominal_step_s, 0.05);
}
