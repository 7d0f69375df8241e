//! Data root resolution and raw file reads.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Env var that relocates the data root (tests, packaged deployments).
pub const DATA_ROOT_ENV: &str = "COMPANIONS_DATA_ROOT";

/// Resolve the data root: `COMPANIONS_DATA_ROOT` when set, else the
/// workspace-level `data/` so tests and tools can run from any crate.
pub fn data_root() -> PathBuf {
    if let Ok(root) = std::env::var(DATA_ROOT_ENV)
        && !root.is_empty()
    {
        return PathBuf::from(root);
    }
    let here = Path::new(env!("CARGO_MANIFEST_DIR"));
    let ws = here.join("../../data");
    if ws.is_dir() { ws } else { here.join("data") }
}

/// Read a text file relative to `root`.
pub fn read_text(root: &Path, rel: impl AsRef<Path>) -> Result<String> {
    let path = root.join(rel);
    fs::read_to_string(&path).with_context(|| format!("read data: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_text_reports_path_on_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_text(dir.path(), "nope.toml").unwrap_err();
        assert!(format!("{err:#}").contains("nope.toml"));
    }
}
