use super::tile::Biome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemCategory {
    Material,
    Food,
    Tool,
    Weapon,
    Building,
    Ritual,
}

/// One catalog entry. The catalog is frozen per seed at world creation;
/// definitions never change after genesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    pub weight: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durability: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<u16>,
    pub natural_spawn: bool,
    pub allowed_biomes: Vec<Biome>,
}

/// Ordered input item ids and a single result. Input compositions may drift
/// over a run; `result` never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub inputs: Vec<String>,
    pub result: String,
    pub tech_required: u8,
}
