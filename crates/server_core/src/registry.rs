//! Definition Registry: immutable catalog of companion definitions, replaced
//! wholesale on reload.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;

use crate::companion::CompanionDefinition;
use crate::config::ConfigSource;

#[derive(Debug, Default)]
pub struct Registry {
    defs: BTreeMap<String, Arc<CompanionDefinition>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from `source`. Invalid entries are skipped with a
    /// warning; returns the number of accepted definitions.
    pub fn load(&mut self, source: &dyn ConfigSource) -> Result<usize> {
        let records = match source.definitions() {
            Ok(r) => r,
            Err(e) => {
                self.defs.clear();
                return Err(e);
            }
        };
        let mut next = BTreeMap::new();
        for rec in records {
            let id = rec.id.clone();
            match CompanionDefinition::try_from(rec) {
                Ok(def) => {
                    log::info!("registry: loaded companion '{id}' ({})", def.display.kind_name());
                    next.insert(id, Arc::new(def));
                }
                Err(e) => log::warn!("registry: skipping companion '{id}': {e}"),
            }
        }
        self.defs = next;
        metrics::gauge!("companions.definitions").set(self.defs.len() as f64);
        Ok(self.defs.len())
    }

    /// Same as `load`; the previous catalog is never partially visible.
    pub fn reload(&mut self, source: &dyn ConfigSource) -> Result<usize> {
        self.load(source)
    }

    pub fn clear(&mut self) {
        self.defs.clear();
    }

    pub fn get(&self, id: &str) -> Option<Arc<CompanionDefinition>> {
        self.defs.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    /// Stable id-ordered iteration.
    pub fn all(&self) -> impl Iterator<Item = &Arc<CompanionDefinition>> {
        self.defs.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Listing order: rarity tier, then id.
    pub fn by_rarity(&self) -> Vec<Arc<CompanionDefinition>> {
        let mut v: Vec<_> = self.defs.values().cloned().collect();
        v.sort_by(|a, b| a.rarity.cmp(&b.rarity).then_with(|| a.id.cmp(&b.id)));
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companion::Rarity;
    use crate::config::StaticConfig;
    use data_runtime::companions::CompanionRecord;

    fn rec(id: &str, rarity: &str, block: Option<&str>) -> CompanionRecord {
        let mut r = CompanionRecord::new(id);
        r.rarity = Some(rarity.into());
        r.block = block.map(str::to_string);
        r
    }

    #[test]
    fn invalid_entries_skipped_rest_loaded() {
        let src = StaticConfig {
            records: vec![rec("a", "epic", Some("stone")), rec("bad", "rare", None), rec("c", "???", Some("dirt"))],
            ..Default::default()
        };
        let mut reg = Registry::new();
        assert_eq!(reg.load(&src).unwrap(), 2);
        assert!(reg.get("bad").is_none());
        assert_eq!(reg.get("c").unwrap().rarity, Rarity::Common);
    }

    #[test]
    fn reload_replaces_wholesale_and_sorts_by_rarity() {
        let mut reg = Registry::new();
        reg.load(&StaticConfig { records: vec![rec("old", "common", Some("stone"))], ..Default::default() })
            .unwrap();
        let src = StaticConfig {
            records: vec![
                rec("z_leg", "legendary", Some("gold_block")),
                rec("b_com", "common", Some("stone")),
                rec("a_rare", "rare", Some("dirt")),
            ],
            ..Default::default()
        };
        reg.reload(&src).unwrap();
        assert!(!reg.contains("old"));
        let order: Vec<_> = reg.by_rarity().iter().map(|d| d.id.clone()).collect();
        assert_eq!(order, vec!["b_com", "a_rare", "z_leg"]);
        let ids: Vec<_> = reg.all().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a_rare", "b_com", "z_leg"]);
    }
}
