use data_runtime::configs::telemetry::load_from;
use serial_test::serial;

#[test]
#[serial]
fn env_overrides_parse() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("config")).unwrap();
    std::fs::write(tmp.path().join("config/telemetry.toml"), "log_level = \"warn\"\njson_logs = true\n").unwrap();
    unsafe {
        std::env::set_var("LOG_LEVEL", "debug");
        std::env::set_var("JSON_LOGS", "false");
    }
    let cfg = load_from(tmp.path()).expect("load");
    unsafe {
        std::env::remove_var("LOG_LEVEL");
        std::env::remove_var("JSON_LOGS");
    }
    assert_eq!(cfg.log_level.as_deref(), Some("debug"));
    assert_eq!(cfg.json_logs, Some(false));
    assert_eq!(cfg.metrics_addr, None);
}
