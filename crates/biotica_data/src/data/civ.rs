use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Faction-level posture, re-evaluated from the culture vector and
/// environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Expand,
    Consolidate,
    Trade,
    Militarize,
    Spiritual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureVector {
    pub collectivism: f32,
    pub aggression: f32,
    pub curiosity: f32,
    pub spirituality: f32,
    pub trade_affinity: f32,
}

impl CultureVector {
    pub fn clamp(&mut self) {
        self.collectivism = self.collectivism.clamp(0.0, 1.0);
        self.aggression = self.aggression.clamp(0.0, 1.0);
        self.curiosity = self.curiosity.clamp(0.0, 1.0);
        self.spirituality = self.spirituality.clamp(0.0, 1.0);
        self.trade_affinity = self.trade_affinity.clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    /// 1-based; 0 is reserved for "unclaimed" in the territory owner map.
    pub id: u32,
    /// Null until a narrative name is applied by the (non-authoritative)
    /// text service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub founding_species_id: String,
    pub dominant_species_id: String,
    pub population: u32,
    pub tech_level: u8,
    pub literacy_level: f32,
    pub strategy: Strategy,
    pub culture: CultureVector,
    pub home_x: u16,
    pub home_y: u16,
    /// Tiles where this faction currently holds ownership. Kept equal to the
    /// owner-map census each territory step.
    pub claimed_tiles: u32,
    pub founded_tick: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentRole {
    Forager,
    Hunter,
    Crafter,
    Builder,
    Scribe,
    Shaman,
    Warrior,
    Leader,
}

/// Closed intent set; one is active per agent per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentIntent {
    Gather,
    Hunt,
    Craft,
    Build,
    Move,
    Rest,
    Trade,
    Worship,
    Patrol,
    Flee,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceInventory {
    pub food: u16,
    pub wood: u16,
    pub stone: u16,
    pub ore: u16,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
}

/// Aggregated perception state. `last_reason_codes` is bounded by the agent
/// update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentalState {
    pub perceived_food_level: f32,
    pub perceived_threat_level: f32,
    pub stress_level: f32,
    pub loyalty_to_faction: f32,
    pub last_reason_codes: Vec<String>,
}

impl Default for MentalState {
    fn default() -> Self {
        Self {
            perceived_food_level: 0.5,
            perceived_threat_level: 0.0,
            stress_level: 0.0,
            loyalty_to_faction: 0.8,
            last_reason_codes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: u64,
    pub faction_id: u32,
    pub species_id: String,
    pub ethnicity_id: u8,
    pub role: AgentRole,
    pub x: u16,
    pub y: u16,
    pub energy: f32,
    pub hydration: f32,
    pub age: u32,
    pub intent: AgentIntent,
    /// Ticks spent on the current intent.
    pub activity_ticks: u16,
    pub resources: ResourceInventory,
    /// Crafted/collected items by catalog id. BTreeMap for deterministic
    /// iteration.
    pub items: BTreeMap<String, u32>,
    pub equipment: Equipment,
    pub mind: MentalState,
    /// Proposed intent for next tick, if the agent re-planned mid-activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_intent: Option<AgentIntent>,
    /// Short rolling buffer of legible thought strings.
    pub thoughts: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureKind {
    Hut,
    Storehouse,
    Workshop,
    Shrine,
    Palisade,
}

impl StructureKind {
    /// (wood, stone) consumed per build tick while in progress.
    #[must_use]
    pub const fn material_cost(self) -> (u16, u16) {
        match self {
            Self::Hut => (1, 0),
            Self::Storehouse => (2, 1),
            Self::Workshop => (1, 2),
            Self::Shrine => (0, 2),
            Self::Palisade => (2, 0),
        }
    }

    #[must_use]
    pub const fn build_ticks(self) -> u16 {
        match self {
            Self::Hut => 40,
            Self::Storehouse => 80,
            Self::Workshop => 100,
            Self::Shrine => 120,
            Self::Palisade => 60,
        }
    }

    #[must_use]
    pub const fn max_hp(self) -> f32 {
        match self {
            Self::Hut => 60.0,
            Self::Storehouse => 120.0,
            Self::Workshop => 100.0,
            Self::Shrine => 80.0,
            Self::Palisade => 160.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub id: u64,
    pub kind: StructureKind,
    pub faction_id: u32,
    pub x: u16,
    pub y: u16,
    /// `[0, 1]`; stalls without error when materials are missing.
    pub progress: f32,
    pub completed: bool,
    pub hp: f32,
    pub max_hp: f32,
}

/// Scribe-authored token content tied to the tile where it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub faction_id: u32,
    pub author_agent_id: u64,
    pub x: u16,
    pub y: u16,
    pub tick: u64,
    pub tokens: Vec<String>,
    /// Filled in later by the external best-effort translator; never read by
    /// the kernel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationStatus {
    Neutral,
    Trade,
    Ally,
    War,
}

/// Directed relation `(from, to)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub from: u32,
    pub to: u32,
    pub status: RelationStatus,
    pub trust: f32,
    pub tension: f32,
    pub intensity: f32,
}

impl Relation {
    #[must_use]
    pub fn new(from: u32, to: u32) -> Self {
        Self {
            from,
            to,
            status: RelationStatus::Neutral,
            trust: 0.5,
            tension: 0.0,
            intensity: 0.0,
        }
    }
}
