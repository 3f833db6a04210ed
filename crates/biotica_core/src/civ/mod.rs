//! Tribal civilizations: agents, factions, territory claim, structures,
//! crafting, proto-language and diplomacy. The phase order inside this
//! subsystem is fixed: agents → factions → territory → structures → crafting
//! → language → diplomacy → founding/splits.

pub mod agents;
pub mod diplomacy;
pub mod language;
pub mod territory;

use crate::crafting::{CraftingEvolution, ItemCatalog};
use crate::log::{EventLog, LogEvent};
use crate::rng::KernelRng;
use crate::species::SpeciesRegistry;
use crate::world::WorldState;
use agents::AgentPhaseCtx;
use biotica_data::{
    Agent, AgentIntent, AgentRole, Creature, CultureVector, Faction, LogCategory, Note, Relation,
    ResourceInventory, Strategy, Structure, StructureKind,
};
use language::Lexicon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use territory::TerritoryMap;

/// Territory owners are stored as `u8`; the cap keeps faction ids in range
/// with room to spare.
pub const MAX_FACTIONS: u32 = 24;
/// Cognition score at which a species awakens into a faction.
pub const AWAKENING_THRESHOLD: f32 = 1.0;
pub const FOUNDING_MIN_POPULATION: u32 = 12;
pub const FOUNDING_AGENTS: usize = 6;
pub const SPLIT_POPULATION: u32 = 40;
pub const SPLIT_TERRITORY: u32 = 600;
const FOUNDING_CHECK_PERIOD: u64 = 32;
const FACTION_REVIEW_PERIOD: u64 = 64;
const SPAWN_FOOD_COST: u16 = 5;

const ROLE_CYCLE: [AgentRole; 8] = [
    AgentRole::Forager,
    AgentRole::Hunter,
    AgentRole::Crafter,
    AgentRole::Builder,
    AgentRole::Scribe,
    AgentRole::Shaman,
    AgentRole::Warrior,
    AgentRole::Leader,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CivSystem {
    pub enabled: bool,
    pub factions: Vec<Faction>,
    pub agents: Vec<Agent>,
    pub structures: Vec<Structure>,
    pub notes: Vec<Note>,
    pub relations: Vec<Relation>,
    pub territory: TerritoryMap,
    pub lexicons: BTreeMap<u32, Lexicon>,
    pub crafting: CraftingEvolution,
    /// Per-species cognition meters feeding the awakening check.
    pub cognition: BTreeMap<String, f32>,
    next_faction_id: u32,
    next_agent_id: u64,
    next_structure_id: u64,
    next_note_id: u64,
    pub rng: KernelRng,
}

impl CivSystem {
    #[must_use]
    pub fn new(width: u16, height: u16, catalog: &ItemCatalog, rng: KernelRng, enabled: bool) -> Self {
        Self {
            enabled,
            factions: Vec::new(),
            agents: Vec::new(),
            structures: Vec::new(),
            notes: Vec::new(),
            relations: Vec::new(),
            territory: TerritoryMap::new(width, height),
            lexicons: BTreeMap::new(),
            crafting: CraftingEvolution::new(catalog),
            cognition: BTreeMap::new(),
            next_faction_id: 1,
            next_agent_id: 0,
            next_structure_id: 0,
            next_note_id: 0,
            rng,
        }
    }

    #[must_use]
    pub fn faction(&self, id: u32) -> Option<&Faction> {
        self.factions.iter().find(|f| f.id == id)
    }

    #[must_use]
    pub fn counters(&self) -> (u32, u64, u64, u64) {
        (
            self.next_faction_id,
            self.next_agent_id,
            self.next_structure_id,
            self.next_note_id,
        )
    }

    pub fn restore_counters(&mut self, faction: u32, agent: u64, structure: u64, note: u64) {
        self.next_faction_id = faction;
        self.next_agent_id = agent;
        self.next_structure_id = structure;
        self.next_note_id = note;
    }

    pub fn step(
        &mut self,
        world: &mut WorldState,
        creatures: &[Creature],
        registry: &SpeciesRegistry,
        catalog: &ItemCatalog,
        log: &mut EventLog,
        tick: u64,
    ) {
        if !self.enabled {
            return;
        }

        self.update_cognition(world, registry, tick);
        if tick % FOUNDING_CHECK_PERIOD == 0 {
            self.check_founding(creatures, world.width, world.height, log, tick);
        }

        // 1. Agent update.
        {
            let mut ctx = AgentPhaseCtx {
                world,
                factions: &self.factions,
                structures: &mut self.structures,
                relations: &mut self.relations,
                lexicons: &self.lexicons,
                notes: &mut self.notes,
                crafting: &mut self.crafting,
                catalog,
                log,
                tick,
                rng: &mut self.rng,
                next_structure_id: &mut self.next_structure_id,
                next_note_id: &mut self.next_note_id,
            };
            agents::step_agents(&mut self.agents, &mut ctx);
        }

        // 2. Faction update.
        self.update_factions(log, tick);

        // 3. Territory step.
        for agent in &self.agents {
            self.territory
                .apply_presence(agent.x, agent.y, agent.faction_id as u8);
        }
        self.territory.decay(tick);
        let census = self.territory.census();
        for faction in &mut self.factions {
            faction.claimed_tiles = census.get(&(faction.id as u8)).copied().unwrap_or(0);
        }

        // 4. Structures.
        self.step_structures(log, tick);

        // 5. Crafting evolution.
        for fi in 0..self.factions.len() {
            let (id, tech) = (self.factions[fi].id, self.factions[fi].tech_level);
            self.crafting
                .step_faction(catalog, id, tech, &mut self.rng, tick);
        }

        // 6. Language.
        for faction in &self.factions {
            if let Some(lex) = self.lexicons.get_mut(&faction.id) {
                lex.grow(faction.literacy_level, &mut self.rng);
            }
        }

        // 7. Diplomacy.
        diplomacy::ensure_relations(&self.factions, &mut self.relations);
        diplomacy::step(&self.factions, &mut self.relations, &self.territory, log, tick);

        // 8. Splits.
        if tick % FACTION_REVIEW_PERIOD == 0 {
            self.check_splits(log, tick);
        }
    }

    /// Cognition accrues with population, perception, and event pressure
    /// (mean hazard stands in for how eventful the world is).
    fn update_cognition(&mut self, world: &WorldState, registry: &SpeciesRegistry, _tick: u64) {
        let hazard_pressure = {
            let sum: u64 = world.hazard.iter().map(|&h| u64::from(h)).sum();
            (sum as f32 / world.cell_count() as f32) / 255.0
        };
        for rec in &registry.species {
            if rec.population < FOUNDING_MIN_POPULATION {
                continue;
            }
            let meter = self.cognition.entry(rec.id.clone()).or_insert(0.0);
            if *meter >= AWAKENING_THRESHOLD {
                continue;
            }
            let perception_factor =
                f32::from(rec.centroid.perception_radius) / f32::from(biotica_data::genome::PERCEPTION_MAX);
            let pop_factor = (rec.population as f32 / 64.0).min(1.0);
            *meter += 0.0015 * pop_factor * (0.5 + perception_factor) + hazard_pressure * 0.0005;
        }
    }

    fn check_founding(
        &mut self,
        creatures: &[Creature],
        width: u16,
        height: u16,
        log: &mut EventLog,
        tick: u64,
    ) {
        if self.next_faction_id > MAX_FACTIONS {
            return;
        }
        let awakened: Vec<String> = self
            .cognition
            .iter()
            .filter(|(id, m)| {
                **m >= AWAKENING_THRESHOLD
                    && !self.factions.iter().any(|f| &f.founding_species_id == *id)
            })
            .map(|(id, _)| id.clone())
            .collect();

        for species_id in awakened {
            let members: Vec<&Creature> = creatures
                .iter()
                .filter(|c| c.species_id == species_id)
                .collect();
            if (members.len() as u32) < FOUNDING_MIN_POPULATION {
                continue;
            }
            let (sx, sy) = members.iter().fold((0u64, 0u64), |(ax, ay), c| {
                (ax + u64::from(c.x), ay + u64::from(c.y))
            });
            let home_x = (sx / members.len() as u64) as u16;
            let home_y = (sy / members.len() as u64) as u16;

            self.found_faction(&species_id, home_x, home_y, width, height, log, tick);
            if self.next_faction_id > MAX_FACTIONS {
                break;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn found_faction(
        &mut self,
        species_id: &str,
        home_x: u16,
        home_y: u16,
        width: u16,
        height: u16,
        log: &mut EventLog,
        tick: u64,
    ) {
        let id = self.next_faction_id;
        self.next_faction_id += 1;

        let culture = CultureVector {
            collectivism: 0.3 + self.rng.next_float() * 0.5,
            aggression: 0.2 + self.rng.next_float() * 0.5,
            curiosity: 0.3 + self.rng.next_float() * 0.5,
            spirituality: 0.2 + self.rng.next_float() * 0.6,
            trade_affinity: 0.2 + self.rng.next_float() * 0.6,
        };
        let mut lexicon = Lexicon::default();
        lexicon.seed(&mut self.rng);
        self.lexicons.insert(id, lexicon);

        self.factions.push(Faction {
            id,
            name: None,
            founding_species_id: species_id.to_string(),
            dominant_species_id: species_id.to_string(),
            population: FOUNDING_AGENTS as u32,
            tech_level: 1,
            literacy_level: 0.0,
            strategy: Strategy::Expand,
            culture,
            home_x,
            home_y,
            claimed_tiles: 0,
            founded_tick: tick,
        });

        for k in 0..FOUNDING_AGENTS {
            let agent_id = self.next_agent_id;
            self.next_agent_id += 1;
            let dx = (k as i32 % 3) - 1;
            let dy = (k as i32 / 3) - 1;
            let x = (i32::from(home_x) + dx).clamp(0, i32::from(width) - 1) as u16;
            let y = (i32::from(home_y) + dy).clamp(0, i32::from(height) - 1) as u16;
            self.agents.push(Agent {
                id: agent_id,
                faction_id: id,
                species_id: species_id.to_string(),
                ethnicity_id: (id % 8) as u8,
                role: ROLE_CYCLE[k % ROLE_CYCLE.len()],
                x,
                y,
                energy: 80.0,
                hydration: 80.0,
                age: 0,
                intent: AgentIntent::Gather,
                activity_ticks: 0,
                resources: ResourceInventory {
                    food: 4,
                    wood: 0,
                    stone: 0,
                    ore: 0,
                },
                items: BTreeMap::new(),
                equipment: Default::default(),
                mind: Default::default(),
                proposed_intent: None,
                thoughts: Vec::new(),
            });
        }

        LogEvent::new(
            tick,
            LogCategory::CivFounding,
            format!("species {species_id} awakened; faction {id} founded"),
        )
        .at(home_x, home_y)
        .faction(id)
        .payload(serde_json::json!({ "species": species_id }))
        .emit(log);
    }

    fn update_factions(&mut self, _log: &mut EventLog, tick: u64) {
        for fi in 0..self.factions.len() {
            let fid = self.factions[fi].id;
            let members: Vec<usize> = self
                .agents
                .iter()
                .enumerate()
                .filter(|(_, a)| a.faction_id == fid)
                .map(|(i, _)| i)
                .collect();

            // Demographics.
            self.factions[fi].population = members.len() as u32;
            let mut by_species: BTreeMap<&str, u32> = BTreeMap::new();
            for &mi in &members {
                *by_species.entry(self.agents[mi].species_id.as_str()).or_insert(0) += 1;
            }
            if let Some((dominant, _)) = by_species.iter().max_by_key(|(id, n)| (**n, *id)) {
                self.factions[fi].dominant_species_id = (*dominant).to_string();
            }

            // Tech from structures and population composition.
            let workshops = completed_count(&self.structures, fid, StructureKind::Workshop);
            let storehouses = completed_count(&self.structures, fid, StructureKind::Storehouse);
            let shrines = completed_count(&self.structures, fid, StructureKind::Shrine);
            let huts = completed_count(&self.structures, fid, StructureKind::Hut);
            let pop_tier = (self.factions[fi].population / 15) as u8;
            self.factions[fi].tech_level = (1 + workshops + storehouses / 2 + pop_tier).min(5);

            // Literacy from scribes, notes and shrines.
            let scribes = members
                .iter()
                .filter(|&&mi| self.agents[mi].role == AgentRole::Scribe)
                .count() as f32;
            let notes = self
                .notes
                .iter()
                .filter(|n| n.faction_id == fid)
                .count() as f32;
            self.factions[fi].literacy_level =
                (scribes * 0.08 + notes * 0.01 + f32::from(shrines) * 0.15).clamp(0.0, 1.0);

            // Culture drift from what the members actually do.
            let worshippers = members
                .iter()
                .filter(|&&mi| self.agents[mi].intent == AgentIntent::Worship)
                .count() as f32;
            let c = &mut self.factions[fi].culture;
            c.spirituality += worshippers * 0.0002;
            c.clamp();

            // Strategy review on a slow cadence.
            if tick % FACTION_REVIEW_PERIOD == 0 {
                self.factions[fi].strategy = self.pick_strategy(fi);
            }

            // Population growth: huts shelter new members, food pays for them.
            let capacity = FOUNDING_AGENTS as u32 + u32::from(huts) * 4;
            if self.factions[fi].population < capacity && tick % 96 == 0 {
                self.try_spawn_agent(fi, &members);
            }
        }
    }

    fn pick_strategy(&self, fi: usize) -> Strategy {
        let f = &self.factions[fi];
        let threat = self
            .relations
            .iter()
            .filter(|r| r.from == f.id)
            .map(|r| r.tension)
            .fold(0.0f32, f32::max);
        let has_partner = self.relations.iter().any(|r| {
            r.from == f.id && matches!(r.status, biotica_data::RelationStatus::Trade)
        });

        let pressure = (f.population as f32 / 50.0).min(1.0);
        let scored = [
            (Strategy::Expand, f.culture.curiosity * 0.6 + (1.0 - pressure) * 0.4),
            (Strategy::Consolidate, f.culture.collectivism * 0.7 + pressure * 0.3),
            (
                Strategy::Trade,
                f.culture.trade_affinity * 0.7 + if has_partner { 0.3 } else { 0.0 },
            ),
            (Strategy::Militarize, f.culture.aggression * 0.5 + threat * 0.5),
            (Strategy::Spiritual, f.culture.spirituality * 0.8),
        ];
        scored
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(s, _)| *s)
            .unwrap_or(Strategy::Consolidate)
    }

    fn try_spawn_agent(&mut self, fi: usize, members: &[usize]) {
        let fid = self.factions[fi].id;
        // The best-fed member pays the food cost.
        let payer = members
            .iter()
            .copied()
            .max_by_key(|&mi| (self.agents[mi].resources.food, std::cmp::Reverse(self.agents[mi].id)));
        let Some(payer) = payer else { return };
        if self.agents[payer].resources.food < SPAWN_FOOD_COST {
            return;
        }
        self.agents[payer].resources.food -= SPAWN_FOOD_COST;

        let id = self.next_agent_id;
        self.next_agent_id += 1;
        let role = ROLE_CYCLE[(id % ROLE_CYCLE.len() as u64) as usize];
        let home = (self.factions[fi].home_x, self.factions[fi].home_y);
        let species = self.factions[fi].dominant_species_id.clone();
        self.agents.push(Agent {
            id,
            faction_id: fid,
            species_id: species,
            ethnicity_id: (fid % 8) as u8,
            role,
            x: home.0,
            y: home.1,
            energy: 70.0,
            hydration: 80.0,
            age: 0,
            intent: AgentIntent::Gather,
            activity_ticks: 0,
            resources: ResourceInventory::default(),
            items: BTreeMap::new(),
            equipment: Default::default(),
            mind: Default::default(),
            proposed_intent: None,
            thoughts: Vec::new(),
        });
        self.factions[fi].population += 1;
    }

    /// In-progress structures pull one unit of material per tick from an
    /// adjacent member; no materials means the build stalls without error.
    fn step_structures(&mut self, log: &mut EventLog, tick: u64) {
        for si in 0..self.structures.len() {
            if self.structures[si].completed {
                continue;
            }
            let (fid, sx, sy, kind) = {
                let s = &self.structures[si];
                (s.faction_id, s.x, s.y, s.kind)
            };
            let (need_wood, need_stone) = kind.material_cost();

            let supplier = self.agents.iter_mut().find(|a| {
                a.faction_id == fid
                    && a.x.abs_diff(sx).max(a.y.abs_diff(sy)) <= 1
                    && (a.resources.wood >= need_wood.min(1) || need_wood == 0)
                    && (a.resources.stone >= need_stone.min(1) || need_stone == 0)
            });
            let Some(supplier) = supplier else {
                continue;
            };
            supplier.resources.wood = supplier.resources.wood.saturating_sub(need_wood.min(1));
            supplier.resources.stone = supplier.resources.stone.saturating_sub(need_stone.min(1));

            let s = &mut self.structures[si];
            s.progress += 1.0 / f32::from(kind.build_ticks());
            if s.progress >= 1.0 {
                s.progress = 1.0;
                s.completed = true;
                LogEvent::new(
                    tick,
                    LogCategory::CivStructure,
                    format!("faction {} completed a {:?}", fid, kind),
                )
                .at(sx, sy)
                .faction(fid)
                .emit(log);
            }
        }
    }

    /// Factions over the population or territory threshold shed a splinter
    /// faction inheriting part of the culture and the outlying members.
    fn check_splits(&mut self, log: &mut EventLog, tick: u64) {
        if self.next_faction_id > MAX_FACTIONS {
            return;
        }
        let split_candidate = self
            .factions
            .iter()
            .position(|f| f.population > SPLIT_POPULATION || f.claimed_tiles > SPLIT_TERRITORY);
        let Some(fi) = split_candidate else { return };
        let old = self.factions[fi].clone();

        // Members beyond the mean distance from home leave.
        let mut distances: Vec<(u64, u32)> = self
            .agents
            .iter()
            .filter(|a| a.faction_id == old.id)
            .map(|a| {
                let d = u32::from(a.x.abs_diff(old.home_x)) + u32::from(a.y.abs_diff(old.home_y));
                (a.id, d)
            })
            .collect();
        if distances.len() < FOUNDING_AGENTS * 2 {
            return;
        }
        let mean: u32 =
            distances.iter().map(|(_, d)| d).sum::<u32>() / distances.len() as u32;
        distances.retain(|(_, d)| *d > mean);
        if distances.len() < FOUNDING_AGENTS / 2 {
            return;
        }

        let new_id = self.next_faction_id;
        self.next_faction_id += 1;

        let leavers: Vec<u64> = distances.iter().map(|(id, _)| *id).collect();
        let (sx, sy, n) = self
            .agents
            .iter()
            .filter(|a| leavers.contains(&a.id))
            .fold((0u64, 0u64, 0u64), |(ax, ay, n), a| {
                (ax + u64::from(a.x), ay + u64::from(a.y), n + 1)
            });
        let home_x = (sx / n) as u16;
        let home_y = (sy / n) as u16;

        let mut culture = old.culture.clone();
        culture.collectivism += self.rng.next_gaussish() * 0.1;
        culture.aggression += self.rng.next_gaussish() * 0.1;
        culture.curiosity += self.rng.next_gaussish() * 0.1;
        culture.clamp();

        for a in &mut self.agents {
            if leavers.contains(&a.id) {
                a.faction_id = new_id;
                a.mind.loyalty_to_faction = 0.6;
            }
        }
        self.factions[fi].population = self.factions[fi]
            .population
            .saturating_sub(leavers.len() as u32);

        let mut lexicon = self.lexicons.get(&old.id).cloned().unwrap_or_default();
        // The splinter keeps the vocabulary but coins a few of its own words.
        for _ in 0..3 {
            lexicon.grow(1.0, &mut self.rng);
        }
        self.lexicons.insert(new_id, lexicon);

        self.factions.push(Faction {
            id: new_id,
            name: None,
            founding_species_id: old.founding_species_id.clone(),
            dominant_species_id: old.dominant_species_id.clone(),
            population: leavers.len() as u32,
            tech_level: old.tech_level.saturating_sub(1).max(1),
            literacy_level: old.literacy_level * 0.5,
            strategy: Strategy::Expand,
            culture,
            home_x,
            home_y,
            claimed_tiles: 0,
            founded_tick: tick,
        });

        // Outlying territory follows the splinter.
        let (ohx, ohy) = (old.home_x, old.home_y);
        self.territory.transfer_region(old.id as u8, new_id as u8, |x, y| {
            let d_old = u32::from(x.abs_diff(ohx)) + u32::from(y.abs_diff(ohy));
            let d_new = u32::from(x.abs_diff(home_x)) + u32::from(y.abs_diff(home_y));
            d_new < d_old
        });

        LogEvent::new(
            tick,
            LogCategory::CivFounding,
            format!("faction {} split from faction {}", new_id, old.id),
        )
        .at(home_x, home_y)
        .faction(new_id)
        .payload(serde_json::json!({ "parent_faction": old.id }))
        .emit(log);
    }
}

fn completed_count(structures: &[Structure], faction_id: u32, kind: StructureKind) -> u8 {
    structures
        .iter()
        .filter(|s| s.faction_id == faction_id && s.completed && s.kind == kind)
        .count()
        .min(255) as u8
}
