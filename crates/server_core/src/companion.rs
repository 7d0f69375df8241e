//! Typed companion definitions built from raw data records.

use data_runtime::companions::CompanionRecord;
use glam::{DVec3, Vec3};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Mythic,
    Legendary,
}

impl Rarity {
    /// Case-insensitive parse; anything unknown maps to `Common`.
    pub fn parse_or_common(s: Option<&str>) -> Self {
        match s.map(str::to_ascii_lowercase).as_deref() {
            Some("uncommon") => Self::Uncommon,
            Some("rare") => Self::Rare,
            Some("epic") => Self::Epic,
            Some("mythic") => Self::Mythic,
            Some("legendary") => Self::Legendary,
            _ => Self::Common,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Mythic => "Mythic",
            Self::Legendary => "Legendary",
        }
    }
}

/// What the primary handle renders. One variant per display kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayPayload {
    /// Solid-block-like: a block identifier.
    Block { block: String },
    /// Carried-item-like: an item with a custom model data index.
    Item { material: String, model_data: i32 },
    /// Textured-head-like: a texture reference.
    Head { texture: String },
}

impl DisplayPayload {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Block { .. } => "block",
            Self::Item { .. } => "item",
            Self::Head { .. } => "head",
        }
    }
}

pub const DEFAULT_ITEM_MATERIAL: &str = "minecraft:paper";
/// Stand-in when a block payload does not resolve.
pub const DEFAULT_BLOCK: &str = "minecraft:stone";
pub const DEFAULT_KNOT_BLOCK: &str = "minecraft:oak_fence";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("no display payload (need one of block, model_data, texture)")]
    MissingPayload,
    #[error("multiple display payloads: {0:?}")]
    AmbiguousPayload(Vec<&'static str>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompanionDefinition {
    pub id: String,
    pub name: String,
    pub description: Vec<String>,
    pub rarity: Rarity,
    pub permission: Option<String>,
    pub display: DisplayPayload,
    pub scale: Vec3,
    pub offset: DVec3,
    /// Degrees added to the owner's yaw when orienting the primary handle.
    pub rotation: f32,
    /// Block identifier for the secondary decorative handle.
    pub knot_block: Option<String>,
}

impl TryFrom<CompanionRecord> for CompanionDefinition {
    type Error = DefinitionError;

    fn try_from(rec: CompanionRecord) -> Result<Self, Self::Error> {
        let mut payloads = Vec::with_capacity(1);
        if let Some(block) = rec.block.clone() {
            payloads.push(DisplayPayload::Block { block });
        }
        if let Some(model_data) = rec.model_data {
            let material = rec.item.clone().unwrap_or_else(|| DEFAULT_ITEM_MATERIAL.to_string());
            payloads.push(DisplayPayload::Item { material, model_data });
        }
        if let Some(texture) = rec.texture.clone() {
            payloads.push(DisplayPayload::Head { texture });
        }
        let display = match payloads.len() {
            0 => return Err(DefinitionError::MissingPayload),
            1 => payloads.remove(0),
            _ => {
                return Err(DefinitionError::AmbiguousPayload(
                    payloads.iter().map(DisplayPayload::kind_name).collect(),
                ));
            }
        };
        Ok(Self {
            name: rec.name.unwrap_or_else(|| rec.id.clone()),
            rarity: Rarity::parse_or_common(rec.rarity.as_deref()),
            description: rec.description,
            permission: rec.permission.filter(|p| !p.is_empty()),
            display,
            scale: Vec3::new(rec.scale.x, rec.scale.y, rec.scale.z),
            offset: DVec3::new(rec.offset.x, rec.offset.y, rec.offset.z),
            rotation: rec.rotation,
            knot_block: rec.knot_block,
            id: rec.id,
        })
    }
}
