//! Read-only projection of kernel state, produced once per committed tick.
//! The shape is stable and versioned; external consumers (renderers, UIs,
//! text services) only ever see this, never the live kernel.

use crate::events::EventOverlay;
use biotica_data::{
    AgentIntent, DietType, LogEntry, RelationStatus, SizeClass, Strategy, StructureKind,
};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: u32 = 1;
const LOG_TAIL: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSummary {
    pub id: String,
    pub common_name: String,
    pub population: u32,
    pub diet: DietType,
    pub size_class: SizeClass,
    pub color: [u8; 3],
    pub created_tick: u64,
    pub parent_species_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSummary {
    pub id: u64,
    pub species_id: String,
    pub x: u16,
    pub y: u16,
    pub energy: f32,
    pub age: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionSummary {
    pub id: u32,
    pub name: Option<String>,
    pub dominant_species_id: String,
    pub population: u32,
    pub tech_level: u8,
    pub literacy_level: f32,
    pub strategy: Strategy,
    pub claimed_tiles: u32,
    pub home: (u16, u16),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: u64,
    pub faction_id: u32,
    pub x: u16,
    pub y: u16,
    pub intent: AgentIntent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSummary {
    pub id: u64,
    pub kind: StructureKind,
    pub faction_id: u32,
    pub x: u16,
    pub y: u16,
    pub progress: f32,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSummary {
    pub from: u32,
    pub to: u32,
    pub status: RelationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: u64,
    pub kind: String,
    pub x: u16,
    pub y: u16,
    pub radius: u16,
    pub elapsed_ticks: u32,
    pub duration_ticks: u32,
    pub intensity: f32,
}

/// The per-tick snapshot. Safe to hand to other threads: everything is
/// owned, nothing aliases kernel state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub version: u32,
    pub tick: u64,
    pub seed: u32,
    pub width: u16,
    pub height: u16,
    pub tiles: Vec<u8>,
    pub temperature: Vec<u8>,
    pub humidity: Vec<u8>,
    pub fertility: Vec<u8>,
    pub hazard: Vec<u8>,
    pub plant_biomass: Vec<u8>,
    pub territory_owner: Vec<u8>,
    pub territory_version: u64,
    pub overlay: EventOverlay,
    pub species: Vec<SpeciesSummary>,
    pub creatures: Vec<CreatureSummary>,
    pub factions: Vec<FactionSummary>,
    pub agents: Vec<AgentSummary>,
    pub structures: Vec<StructureSummary>,
    pub relations: Vec<RelationSummary>,
    pub active_events: Vec<EventSummary>,
    pub log_tail: Vec<LogEntry>,
}

impl WorldSnapshot {
    #[must_use]
    pub fn population(&self) -> usize {
        self.creatures.len()
    }
}

pub(crate) fn log_tail_len() -> usize {
    LOG_TAIL
}
