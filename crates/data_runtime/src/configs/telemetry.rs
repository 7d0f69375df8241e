//! Telemetry configuration loaded from data/config/telemetry.toml with env overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryCfg {
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
    pub metrics_addr: Option<String>, // e.g., 127.0.0.1:9100
}

impl Default for TelemetryCfg {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            json_logs: Some(false),
            metrics_addr: None,
        }
    }
}

pub fn load_from(root: &Path) -> Result<TelemetryCfg> {
    let path = root.join("config/telemetry.toml");
    let mut cfg = if path.is_file() {
        let txt = std::fs::read_to_string(&path)
            .with_context(|| format!("read {}", path.display()))?;
        toml::from_str::<TelemetryCfg>(&txt).context("parse telemetry TOML")?
    } else {
        TelemetryCfg::default()
    };
    // Env overrides
    if let Ok(lvl) = std::env::var("LOG_LEVEL") { cfg.log_level = Some(lvl); }
    if let Ok(addr) = std::env::var("METRICS_ADDR") { cfg.metrics_addr = Some(addr); }
    if let Some(json) = std::env::var("JSON_LOGS").ok().and_then(|v| v.parse().ok()) { cfg.json_logs = Some(json); }
    Ok(cfg)
}

pub fn load_default() -> Result<TelemetryCfg> {
    load_from(&crate::loader::data_root())
}
