#![allow(clippy::unwrap_used)]

use companions::demo::{self, DemoOptions};
use server_core::config::FileConfig;

fn opts(seed: u64) -> DemoOptions {
    DemoOptions { ticks: 300, owners: 3, seed, teleport_chance: 0.0, realtime: false }
}

#[test]
fn shipped_data_runs_clean() {
    let root = data_runtime::loader::data_root();
    let summary = demo::run(&opts(1), FileConfig::new(&root)).unwrap();
    assert_eq!(summary.owners, 3);
    assert_eq!(summary.active_at_end, 3);
    assert_eq!(summary.objects_after_shutdown, 0);
}

#[test]
fn teleports_recover_and_runs_are_deterministic() {
    let root = data_runtime::loader::data_root();
    let o = DemoOptions { teleport_chance: 0.02, ..opts(9) };
    let a = demo::run(&o, FileConfig::new(&root)).unwrap();
    let b = demo::run(&o, FileConfig::new(&root)).unwrap();
    assert_eq!(a, b);
    assert!(a.teleports > 0);
    assert_eq!(a.objects_after_shutdown, 0);
}
