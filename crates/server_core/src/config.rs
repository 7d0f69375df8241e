//! Where the server gets tuning and definitions from on start and reload.

use std::path::PathBuf;

use anyhow::Result;
use data_runtime::companions::CompanionRecord;
use data_runtime::configs::physics::CompanionPhysicsCfg;

pub trait ConfigSource {
    fn physics(&self) -> Result<CompanionPhysicsCfg>;
    fn definitions(&self) -> Result<Vec<CompanionRecord>>;
}

/// TOML files under a data root (`config/companions.toml`, `companions.toml`).
#[derive(Clone, Debug)]
pub struct FileConfig {
    pub root: PathBuf,
}

impl FileConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ConfigSource for FileConfig {
    fn physics(&self) -> Result<CompanionPhysicsCfg> {
        data_runtime::configs::physics::load_from(&self.root)
    }

    fn definitions(&self) -> Result<Vec<CompanionRecord>> {
        data_runtime::companions::load_from(&self.root)
    }
}

/// Fixed in-memory configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticConfig {
    pub physics: CompanionPhysicsCfg,
    pub records: Vec<CompanionRecord>,
}

impl StaticConfig {
    pub fn new(physics: CompanionPhysicsCfg, records: Vec<CompanionRecord>) -> Self {
        Self { physics, records }
    }
}

impl ConfigSource for StaticConfig {
    fn physics(&self) -> Result<CompanionPhysicsCfg> {
        Ok(self.physics.clone())
    }

    fn definitions(&self) -> Result<Vec<CompanionRecord>> {
        Ok(self.records.clone())
    }
}
