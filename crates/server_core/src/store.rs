//! Ownership/equip store: per-owner records behind a read-through cache.
//!
//! The tick engine only ever reads `cached()`; everything else goes through
//! the backend and refreshes the cache on the way back.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::owner::OwnerId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRecord {
    pub owned: BTreeSet<String>,
    pub equipped: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("store backend: {0}")]
    Backend(String),
}

/// Durable storage behind the cache.
pub trait StoreBackend {
    fn fetch(&mut self, owner: OwnerId) -> Result<Option<OwnerRecord>, StoreError>;
    fn save(&mut self, owner: OwnerId, record: &OwnerRecord) -> Result<(), StoreError>;
}

pub trait OwnershipStore {
    fn equipped(&mut self, owner: OwnerId) -> Result<Option<String>, StoreError>;
    fn set_equipped(&mut self, owner: OwnerId, companion: Option<&str>) -> Result<(), StoreError>;
    fn owned(&mut self, owner: OwnerId) -> Result<BTreeSet<String>, StoreError>;
    fn add_owned(&mut self, owner: OwnerId, companion: &str) -> Result<(), StoreError>;
    fn remove_owned(&mut self, owner: OwnerId, companion: &str) -> Result<(), StoreError>;
    /// Insert an empty record if the owner has none yet.
    fn create_owner(&mut self, owner: OwnerId) -> Result<(), StoreError>;
    fn load_into_cache(&mut self, owner: OwnerId) -> Result<(), StoreError>;
    fn unload_from_cache(&mut self, owner: OwnerId);
    /// Synchronous cache read used by the tick engine.
    fn cached(&self, owner: OwnerId) -> Option<&OwnerRecord>;
}

#[derive(Debug)]
pub struct CachedStore<B> {
    backend: B,
    cache: HashMap<OwnerId, OwnerRecord>,
}

impl<B: StoreBackend> CachedStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, cache: HashMap::new() }
    }

    fn record(&mut self, owner: OwnerId) -> Result<OwnerRecord, StoreError> {
        if let Some(r) = self.cache.get(&owner) {
            return Ok(r.clone());
        }
        let rec = self.backend.fetch(owner)?.unwrap_or_default();
        self.cache.insert(owner, rec.clone());
        Ok(rec)
    }

    fn update(&mut self, owner: OwnerId, rec: OwnerRecord) -> Result<(), StoreError> {
        self.backend.save(owner, &rec)?;
        self.cache.insert(owner, rec);
        Ok(())
    }
}

impl<B: StoreBackend> OwnershipStore for CachedStore<B> {
    fn equipped(&mut self, owner: OwnerId) -> Result<Option<String>, StoreError> {
        Ok(self.record(owner)?.equipped)
    }

    fn set_equipped(&mut self, owner: OwnerId, companion: Option<&str>) -> Result<(), StoreError> {
        let mut rec = self.record(owner)?;
        rec.equipped = companion.map(str::to_string);
        self.update(owner, rec)
    }

    fn owned(&mut self, owner: OwnerId) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.record(owner)?.owned)
    }

    fn add_owned(&mut self, owner: OwnerId, companion: &str) -> Result<(), StoreError> {
        let mut rec = self.record(owner)?;
        rec.owned.insert(companion.to_string());
        self.update(owner, rec)
    }

    fn remove_owned(&mut self, owner: OwnerId, companion: &str) -> Result<(), StoreError> {
        let mut rec = self.record(owner)?;
        rec.owned.remove(companion);
        self.update(owner, rec)
    }

    fn create_owner(&mut self, owner: OwnerId) -> Result<(), StoreError> {
        if self.cache.contains_key(&owner) || self.backend.fetch(owner)?.is_some() {
            return Ok(());
        }
        self.update(owner, OwnerRecord::default())
    }

    fn load_into_cache(&mut self, owner: OwnerId) -> Result<(), StoreError> {
        let rec = self.backend.fetch(owner)?.unwrap_or_default();
        self.cache.insert(owner, rec);
        Ok(())
    }

    fn unload_from_cache(&mut self, owner: OwnerId) {
        self.cache.remove(&owner);
    }

    fn cached(&self, owner: OwnerId) -> Option<&OwnerRecord> {
        self.cache.get(&owner)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: HashMap<OwnerId, OwnerRecord>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryBackend {
    fn fetch(&mut self, owner: OwnerId) -> Result<Option<OwnerRecord>, StoreError> {
        Ok(self.records.get(&owner).cloned())
    }

    fn save(&mut self, owner: OwnerId, record: &OwnerRecord) -> Result<(), StoreError> {
        self.records.insert(owner, record.clone());
        Ok(())
    }
}

/// All records in one JSON document, rewritten on every save.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    records: BTreeMap<OwnerId, OwnerRecord>,
}

impl JsonFileBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.is_file() {
            let txt = std::fs::read_to_string(&path)?;
            if txt.trim().is_empty() { BTreeMap::new() } else { serde_json::from_str(&txt)? }
        } else {
            BTreeMap::new()
        };
        log::info!("store: opened {} ({} owners)", path.display(), records.len());
        Ok(Self { path, records })
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        let txt = serde_json::to_string_pretty(&self.records)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, txt)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StoreBackend for JsonFileBackend {
    fn fetch(&mut self, owner: OwnerId) -> Result<Option<OwnerRecord>, StoreError> {
        Ok(self.records.get(&owner).cloned())
    }

    fn save(&mut self, owner: OwnerId, record: &OwnerRecord) -> Result<(), StoreError> {
        self.records.insert(owner, record.clone());
        self.flush()
    }
}
