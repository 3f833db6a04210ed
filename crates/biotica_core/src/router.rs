//! Read-only query facade over the kernel for external consumers (UIs,
//! tools, text services). Every call returns plain values; missing ids and
//! bad ranges come back as structured errors, never panics, and nothing
//! here mutates state.

use crate::kernel::{EraEntry, Simulation};
use crate::snapshot::{CreatureSummary, EventSummary, FactionSummary, SpeciesSummary};
use biotica_data::{Biome, LogCategory, LogEntry, SpeciesRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum QueryError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("coordinates ({x}, {y}) outside {width}x{height} world")]
    OutOfRange {
        x: i64,
        y: i64,
        width: u16,
        height: u16,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSummary {
    pub name: String,
    pub tick: u64,
    pub seed: u32,
    pub width: u16,
    pub height: u16,
    pub population: usize,
    pub species_count: usize,
    pub faction_count: usize,
    pub active_events: usize,
    pub territory_version: u64,
    pub current_era: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryInfo {
    pub faction_id: u32,
    pub claimed_tiles: u32,
    pub territory_version: u64,
    pub home: (u16, u16),
    pub border_tiles: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
    pub biomes: BTreeMap<String, u32>,
    pub mean_temperature: u8,
    pub mean_humidity: u8,
    pub mean_plant_biomass: u8,
    pub creature_ids: Vec<u64>,
    pub owners: BTreeMap<u32, u32>,
}

/// Borrowing facade; construct per query batch, between ticks.
pub struct ToolRouter<'a> {
    sim: &'a Simulation,
}

impl<'a> ToolRouter<'a> {
    #[must_use]
    pub fn new(sim: &'a Simulation) -> Self {
        Self { sim }
    }

    #[must_use]
    pub fn get_world_summary(&self) -> WorldSummary {
        let sim = self.sim;
        WorldSummary {
            name: sim.profile.name.clone(),
            tick: sim.world.tick,
            seed: sim.world.seed,
            width: sim.world.width,
            height: sim.world.height,
            population: sim.creatures.len(),
            species_count: sim.registry.species.len(),
            faction_count: sim.civ.factions.len(),
            active_events: sim.events.active.len(),
            territory_version: sim.civ.territory.version,
            current_era: sim
                .chronicle
                .last()
                .map(|e| e.name.clone())
                .unwrap_or_default(),
        }
    }

    /// Species by population, descending; ties by id for stability.
    #[must_use]
    pub fn get_top_species(&self, page: usize, size: usize) -> Vec<SpeciesSummary> {
        let mut ordered: Vec<&SpeciesRecord> = self.sim.registry.species.iter().collect();
        ordered.sort_by(|a, b| b.population.cmp(&a.population).then(a.id.cmp(&b.id)));
        ordered
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .map(summarize_species)
            .collect()
    }

    pub fn get_species(&self, id: &str) -> Result<SpeciesRecord, QueryError> {
        self.sim
            .registry
            .get(id)
            .cloned()
            .ok_or(QueryError::NotFound {
                kind: "species",
                id: id.to_string(),
            })
    }

    /// Full ancestry chain, oldest first, ending with the species itself.
    pub fn get_species_lineage(&self, id: &str) -> Result<Vec<SpeciesRecord>, QueryError> {
        let rec = self.get_species(id)?;
        let mut chain = Vec::with_capacity(rec.lineage_ids.len());
        for ancestor_id in &rec.lineage_ids {
            chain.push(self.get_species(ancestor_id)?);
        }
        Ok(chain)
    }

    pub fn get_creature(&self, id: u64) -> Result<biotica_data::Creature, QueryError> {
        self.sim
            .creatures
            .get(id)
            .cloned()
            .ok_or(QueryError::NotFound {
                kind: "creature",
                id: id.to_string(),
            })
    }

    /// Substring match over creature name, id, and species common name.
    #[must_use]
    pub fn search_creatures(&self, query: &str, limit: usize) -> Vec<CreatureSummary> {
        let needle = query.to_lowercase();
        self.sim
            .creatures
            .creatures
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c.id.to_string() == needle
                    || c.species_id.to_lowercase().contains(&needle)
                    || self
                        .sim
                        .registry
                        .get(&c.species_id)
                        .is_some_and(|s| s.common_name.to_lowercase().contains(&needle))
            })
            .take(limit)
            .map(|c| CreatureSummary {
                id: c.id,
                species_id: c.species_id.clone(),
                x: c.x,
                y: c.y,
                energy: c.energy,
                age: c.age,
                generation: c.generation,
            })
            .collect()
    }

    pub fn get_civ(&self, id: u32) -> Result<FactionSummary, QueryError> {
        self.sim
            .civ
            .faction(id)
            .map(|f| FactionSummary {
                id: f.id,
                name: f.name.clone(),
                dominant_species_id: f.dominant_species_id.clone(),
                population: f.population,
                tech_level: f.tech_level,
                literacy_level: f.literacy_level,
                strategy: f.strategy,
                claimed_tiles: f.claimed_tiles,
                home: (f.home_x, f.home_y),
            })
            .ok_or(QueryError::NotFound {
                kind: "faction",
                id: id.to_string(),
            })
    }

    #[must_use]
    pub fn list_civs(&self, limit: usize) -> Vec<FactionSummary> {
        self.sim
            .civ
            .factions
            .iter()
            .take(limit)
            .map(|f| FactionSummary {
                id: f.id,
                name: f.name.clone(),
                dominant_species_id: f.dominant_species_id.clone(),
                population: f.population,
                tech_level: f.tech_level,
                literacy_level: f.literacy_level,
                strategy: f.strategy,
                claimed_tiles: f.claimed_tiles,
                home: (f.home_x, f.home_y),
            })
            .collect()
    }

    pub fn get_territory(&self, civ_id: u32) -> Result<TerritoryInfo, QueryError> {
        let faction = self.sim.civ.faction(civ_id).ok_or(QueryError::NotFound {
            kind: "faction",
            id: civ_id.to_string(),
        })?;
        let territory = &self.sim.civ.territory;
        let mut border_tiles = 0;
        for y in 0..self.sim.world.height {
            for x in 0..self.sim.world.width {
                if u32::from(territory.owner_at(x, y)) == civ_id && territory.is_border(x, y) {
                    border_tiles += 1;
                }
            }
        }
        Ok(TerritoryInfo {
            faction_id: civ_id,
            claimed_tiles: faction.claimed_tiles,
            territory_version: territory.version,
            home: (faction.home_x, faction.home_y),
            border_tiles,
        })
    }

    #[must_use]
    pub fn list_active_events(&self) -> Vec<EventSummary> {
        self.sim
            .events
            .active
            .iter()
            .map(|e| EventSummary {
                id: e.id,
                kind: e.kind.label().to_string(),
                x: e.x,
                y: e.y,
                radius: e.radius,
                elapsed_ticks: e.elapsed_ticks,
                duration_ticks: e.duration_ticks,
                intensity: e.intensity,
            })
            .collect()
    }

    pub fn get_event(&self, id: u64) -> Result<EventSummary, QueryError> {
        self.sim
            .events
            .find(id)
            .map(|e| EventSummary {
                id: e.id,
                kind: e.kind.label().to_string(),
                x: e.x,
                y: e.y,
                radius: e.radius,
                elapsed_ticks: e.elapsed_ticks,
                duration_ticks: e.duration_ticks,
                intensity: e.intensity,
            })
            .ok_or(QueryError::NotFound {
                kind: "event",
                id: id.to_string(),
            })
    }

    #[must_use]
    pub fn list_eras(&self) -> Vec<EraEntry> {
        self.sim.chronicle.clone()
    }

    pub fn get_era(&self, id: u32) -> Result<EraEntry, QueryError> {
        self.sim
            .chronicle
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(QueryError::NotFound {
                kind: "era",
                id: id.to_string(),
            })
    }

    pub fn query_region(
        &self,
        x0: i64,
        y0: i64,
        x1: i64,
        y1: i64,
    ) -> Result<RegionInfo, QueryError> {
        let world = &self.sim.world;
        for &(x, y) in &[(x0, y0), (x1, y1)] {
            if x < 0 || y < 0 || x >= i64::from(world.width) || y >= i64::from(world.height) {
                return Err(QueryError::OutOfRange {
                    x,
                    y,
                    width: world.width,
                    height: world.height,
                });
            }
        }
        let (x0, x1) = (x0.min(x1) as u16, x0.max(x1) as u16);
        let (y0, y1) = (y0.min(y1) as u16, y0.max(y1) as u16);

        let mut biomes: BTreeMap<String, u32> = BTreeMap::new();
        let mut owners: BTreeMap<u32, u32> = BTreeMap::new();
        let mut t_sum: u64 = 0;
        let mut h_sum: u64 = 0;
        let mut p_sum: u64 = 0;
        let mut count: u64 = 0;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let idx = world.index(x, y);
                *biomes.entry(biome_name(world.tiles[idx]).into()).or_insert(0) += 1;
                let owner = self.sim.civ.territory.owner_at(x, y);
                if owner != 0 {
                    *owners.entry(u32::from(owner)).or_insert(0) += 1;
                }
                t_sum += u64::from(world.temperature[idx]);
                h_sum += u64::from(world.humidity[idx]);
                p_sum += u64::from(world.plant_biomass[idx]);
                count += 1;
            }
        }

        Ok(RegionInfo {
            x0,
            y0,
            x1,
            y1,
            biomes,
            mean_temperature: (t_sum / count) as u8,
            mean_humidity: (h_sum / count) as u8,
            mean_plant_biomass: (p_sum / count) as u8,
            creature_ids: self.sim.creatures.query_creatures_in_rect(x0, y0, x1, y1),
            owners,
        })
    }

    #[must_use]
    pub fn get_recent_logs(
        &self,
        filter: Option<LogCategory>,
        page: usize,
        limit: usize,
    ) -> Vec<LogEntry> {
        self.sim.log.recent(filter, page, limit)
    }
}

fn summarize_species(s: &SpeciesRecord) -> SpeciesSummary {
    SpeciesSummary {
        id: s.id.clone(),
        common_name: s.common_name.clone(),
        population: s.population,
        diet: s.diet_kind,
        size_class: s.size_class,
        color: s.color,
        created_tick: s.created_tick,
        parent_species_id: s.parent_species_id.clone(),
    }
}

fn biome_name(b: Biome) -> &'static str {
    match b {
        Biome::DeepWater => "deep_water",
        Biome::ShallowWater => "shallow_water",
        Biome::Beach => "beach",
        Biome::Grassland => "grassland",
        Biome::Forest => "forest",
        Biome::Jungle => "jungle",
        Biome::Desert => "desert",
        Biome::Savanna => "savanna",
        Biome::Swamp => "swamp",
        Biome::Hills => "hills",
        Biome::Mountain => "mountain",
        Biome::Snow => "snow",
        Biome::Rock => "rock",
        Biome::Lava => "lava",
        Biome::Scorched => "scorched",
    }
}
