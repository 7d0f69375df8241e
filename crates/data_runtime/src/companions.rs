//! Companion definition file (data/companions.toml).
//!
//! Entries are keyed by id under a `[companions]` table. Each entry is
//! decoded on its own so one malformed entry never sinks the whole file;
//! payload validation (exactly one display kind) happens in the server's
//! registry, which owns the typed definition.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScaleCfg {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for ScaleCfg {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0, z: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct OffsetCfg {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One raw definition as written in the file.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CompanionRecord {
    /// Filled from the table key.
    #[serde(skip)]
    pub id: String,
    pub name: Option<String>,
    pub description: Vec<String>,
    pub rarity: Option<String>,
    pub permission: Option<String>,
    /// Solid-block payload: block identifier.
    pub block: Option<String>,
    /// Carried-item payload: custom model data index.
    pub model_data: Option<i32>,
    /// Item material for the carried-item payload.
    pub item: Option<String>,
    /// Textured-head payload: texture reference.
    pub texture: Option<String>,
    pub scale: ScaleCfg,
    pub offset: OffsetCfg,
    pub rotation: f32,
    pub knot_block: Option<String>,
}

impl CompanionRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }
}

/// Parse the definitions file. Entries that fail to decode are skipped with
/// a warning; only a syntactically broken document is an error.
pub fn parse(txt: &str) -> Result<Vec<CompanionRecord>> {
    let doc: toml::Table = toml::from_str(txt).context("parse companions file")?;
    let Some(section) = doc.get("companions") else {
        log::warn!("companions: file has no [companions] table");
        return Ok(Vec::new());
    };
    let Some(entries) = section.as_table() else {
        log::warn!("companions: [companions] is not a table");
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(entries.len());
    for (id, value) in entries {
        match value.clone().try_into::<CompanionRecord>() {
            Ok(mut rec) => {
                rec.id = id.clone();
                out.push(rec);
            }
            Err(e) => log::warn!("companions: skipping '{id}': {e}"),
        }
    }
    Ok(out)
}

/// Load `<root>/companions.toml`. A missing file yields no definitions.
pub fn load_from(root: &Path) -> Result<Vec<CompanionRecord>> {
    let path = root.join("companions.toml");
    if !path.is_file() {
        log::warn!("companions: {} not found; no definitions loaded", path.display());
        return Ok(Vec::new());
    }
    let txt = std::fs::read_to_string(&path)
        .with_context(|| format!("read {}", path.display()))?;
    parse(&txt)
}

pub fn load_default() -> Result<Vec<CompanionRecord>> {
    load_from(&crate::loader::data_root())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_entry_is_skipped_not_fatal() {
        let txt = r#"
            [companions.ok]
            name = "Fine"
            block = "minecraft:red_wool"

            [companions.broken]
            scale = "huge"
        "#;
        let recs = parse(txt).expect("parse");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, "ok");
        assert_eq!(recs[0].scale, ScaleCfg::default());
    }

    #[test]
    fn missing_table_yields_empty() {
        assert!(parse("title = \"x\"").expect("parse").is_empty());
    }
}
