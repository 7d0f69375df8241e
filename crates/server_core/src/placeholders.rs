//! Text placeholders for chat/scoreboard integrations. Reads only the cached
//! owner record, so it is safe to call from the tick thread at any time.

use crate::CompanionServer;
use crate::gateway::WorldGateway;
use crate::owner::{OwnerDirectory, OwnerId};
use crate::store::OwnershipStore;

const NONE: &str = "None";

impl<W, D, S> CompanionServer<W, D, S>
where
    W: WorldGateway,
    D: OwnerDirectory,
    S: OwnershipStore,
{
    /// `None` for uncached owners and unknown parameters.
    pub fn placeholder(&self, owner: OwnerId, param: &str) -> Option<String> {
        let rec = self.store.cached(owner)?;
        let value = match param {
            "equipped" => rec
                .equipped
                .as_deref()
                .and_then(|id| self.registry.get(id))
                .map_or_else(|| NONE.to_string(), |d| d.name.clone()),
            "equipped_id" => rec.equipped.clone().unwrap_or_else(|| NONE.to_string()),
            "owned_count" => rec.owned.len().to_string(),
            "total" => self.registry.len().to_string(),
            "collection_progress" => {
                let total = self.registry.len();
                if total == 0 {
                    "0".to_string()
                } else {
                    format!("{:.1}", rec.owned.len() as f64 / total as f64 * 100.0)
                }
            }
            _ => {
                if let Some(id) = param.strip_prefix("has_") {
                    rec.owned.contains(id).to_string()
                } else if let Some(id) = param.strip_prefix("equipped_") {
                    (rec.equipped.as_deref() == Some(id)).to_string()
                } else {
                    return None;
                }
            }
        };
        Some(value)
    }
}
