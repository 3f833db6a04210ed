//! Individual fauna: perception, decision, movement, feeding, reproduction,
//! death. One pass per tick over the population in stable id order.
//!
//! Perception reads a start-of-tick view of the population; mutation happens
//! on the live records. Deaths are collected during the pass and applied
//! after it, so iteration order never shifts mid-tick. Creatures born this
//! tick are appended after the pass and do not act until the next one.

use crate::log::{EventLog, LogEvent};
use crate::rng::KernelRng;
use crate::spatial::{SpatialGrid, DEFAULT_CELL_SIZE};
use crate::species::{blend, mutate, SpeciesRegistry};
use crate::world::WorldState;
use biotica_data::{Creature, DietType, Genome, LogCategory, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_CREATURES: usize = 300;
pub const MIN_BREED_AGE: u32 = 120;
const THIRST_THRESHOLD: f32 = 25.0;
const DRINK_AMOUNT: f32 = 40.0;
const MAX_HYDRATION: f32 = 100.0;
const FEED_BITE_BIOMASS: u8 = 40;
const FEED_ENERGY_PER_BIOMASS: f32 = 0.35;
const PREDATION_BASE_CHANCE: f32 = 0.25;
const PREDATION_AGGRESSION_SCALE: f32 = 0.55;
const PREY_ENERGY_YIELD: f32 = 0.5;
const HAZARD_DAMAGE_FLOOR: u8 = 128;
const START_HEALTH: f32 = 100.0;

/// Cause strings recorded in the `deaths` log payload.
mod cause {
    pub const STARVATION: &str = "starvation";
    pub const OLD_AGE: &str = "old_age";
    pub const PREDATION: &str = "predation";
    pub const EVENT: &str = "event";
}

/// Start-of-tick view used for perception and mate checks.
#[derive(Clone, Copy)]
struct CreatureView {
    id: u64,
    x: u16,
    y: u16,
    energy: f32,
    max_energy: f32,
    age: u32,
    diet: DietType,
    species_hash: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureSystem {
    pub creatures: Vec<Creature>,
    next_id: u64,
    pub rng: KernelRng,
    #[serde(skip, default = "default_grid")]
    grid: SpatialGrid,
}

fn default_grid() -> SpatialGrid {
    SpatialGrid::new(DEFAULT_CELL_SIZE, 1, 1)
}

impl CreatureSystem {
    #[must_use]
    pub fn new(rng: KernelRng) -> Self {
        Self {
            creatures: Vec::new(),
            next_id: 0,
            rng,
            grid: default_grid(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn restore_counter(&mut self, next_id: u64) {
        self.next_id = next_id;
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Creature> {
        self.creatures
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|i| &self.creatures[i])
    }

    /// Rebuild the (non-serialized) spatial index, e.g. after a load.
    pub fn rebuild_index(&mut self, world: &WorldState) {
        self.rebuild_grid(world);
    }

    /// Ids inside the inclusive rectangle, ascending. Backed by the spatial
    /// index as of the last completed tick.
    #[must_use]
    pub fn query_creatures_in_rect(&self, x0: u16, y0: u16, x1: u16, y1: u16) -> Vec<u64> {
        let mut out = Vec::new();
        self.grid.query_rect(x0, y0, x1, y1, &mut out);
        out
    }

    /// Initial population placement: walkable tiles, genomes sampled around
    /// the base-species archetypes.
    pub fn spawn_initial(
        &mut self,
        world: &WorldState,
        registry: &mut SpeciesRegistry,
        count: usize,
    ) {
        let archetypes: Vec<Genome> = registry.species.iter().map(|s| s.centroid.clone()).collect();
        if archetypes.is_empty() {
            return;
        }
        let mut placed = 0;
        let mut attempts = 0;
        while placed < count && attempts < count * 20 {
            attempts += 1;
            let x = self.rng.next_int(u32::from(world.width)) as u16;
            let y = self.rng.next_int(u32::from(world.height)) as u16;
            if !world.biome_at(x, y).walkable() || world.biome_at(x, y).is_water() {
                continue;
            }
            let base = &archetypes[self.rng.next_int(archetypes.len() as u32) as usize];
            let genome = mutate(base, &mut self.rng, 0.05);
            let (species_id, _) = registry.assign_species(&genome, world.tick);
            let id = self.alloc_id();
            self.creatures.push(Creature {
                id,
                name: format!("c-{id}"),
                energy: genome.max_energy * 0.6,
                health: START_HEALTH,
                hydration: 80.0,
                water_need: 0.25 + self.rng.next_float() * 0.3,
                age: self.rng.next_int(200),
                max_age: genome.max_age,
                x,
                y,
                generation: 0,
                parent_ids: Vec::new(),
                temp_stress: 0.0,
                humidity_stress: 0.0,
                description: None,
                species_id,
                genome,
            });
            placed += 1;
        }
        self.creatures.sort_by_key(|c| c.id);
        self.rebuild_grid(world);
        self.publish_census(registry);
    }

    pub fn step(
        &mut self,
        world: &mut WorldState,
        registry: &mut SpeciesRegistry,
        log: &mut EventLog,
        tick: u64,
    ) {
        self.rebuild_grid(world);

        let views: Vec<CreatureView> = self
            .creatures
            .iter()
            .map(|c| CreatureView {
                id: c.id,
                x: c.x,
                y: c.y,
                energy: c.energy,
                max_energy: c.genome.max_energy,
                age: c.age,
                diet: c.genome.diet,
                species_hash: species_hash(&c.species_id),
            })
            .collect();
        let id_to_view: BTreeMap<u64, usize> =
            views.iter().enumerate().map(|(i, v)| (v.id, i)).collect();

        let mut killed: BTreeMap<u64, &'static str> = BTreeMap::new();
        let mut births: Vec<Creature> = Vec::new();
        let mut occupancy = tile_occupancy(world, &self.creatures);
        let mut neighbors = Vec::new();

        for i in 0..self.creatures.len() {
            if killed.contains_key(&self.creatures[i].id) {
                continue;
            }

            // -- Perception --------------------------------------------------
            let (cx, cy) = (self.creatures[i].x, self.creatures[i].y);
            let radius = u16::from(self.creatures[i].genome.perception_radius.min(6));
            let diet = self.creatures[i].genome.diet;
            let view_i = id_to_view[&self.creatures[i].id];

            let sensed = sense(world, &views, &self.grid, view_i, radius, &mut neighbors, &killed);

            // -- Stress ------------------------------------------------------
            let idx = world.index(cx, cy);
            let tile_temp = f32::from(world.temperature[idx]) / 255.0;
            let tile_hum = f32::from(world.humidity[idx]) / 255.0;
            {
                let g = self.creatures[i].genome.clone();
                self.creatures[i].temp_stress =
                    ((tile_temp - g.preferred_temp).abs() - g.temp_tolerance).max(0.0);
                self.creatures[i].humidity_stress =
                    ((tile_hum - g.preferred_humidity).abs() - g.humidity_tolerance).max(0.0);
            }

            // -- Decision (priority; first match wins) -----------------------
            let mut moved = false;
            let repro_threshold = effective_repro_threshold(&self.creatures[i].genome, world);
            // Feeding applies up to the breeding threshold; mating takes
            // over above it.
            let hungry = self.creatures[i].energy
                < repro_threshold * self.creatures[i].genome.max_energy;
            let thirsty = self.creatures[i].hydration < THIRST_THRESHOLD;

            if thirsty && sensed.water.is_some() {
                if world.biome_at(cx, cy).is_water() {
                    let c = &mut self.creatures[i];
                    c.hydration = (c.hydration + DRINK_AMOUNT).min(MAX_HYDRATION);
                } else {
                    let (wx, wy) = sensed.water.expect("checked");
                    moved = self.step_toward(world, &mut occupancy, i, wx, wy, true);
                }
            } else if hungry && diet.eats_plants() && sensed.food_tile.is_some() {
                let (fx, fy) = sensed.food_tile.expect("checked");
                if cx == fx && cy == fy {
                    let fidx = world.index(fx, fy);
                    let bite = world.plant_biomass[fidx].min(FEED_BITE_BIOMASS);
                    world.plant_biomass[fidx] -= bite;
                    let c = &mut self.creatures[i];
                    c.energy = (c.energy
                        + f32::from(bite) * FEED_ENERGY_PER_BIOMASS * c.genome.efficiency)
                        .min(c.genome.max_energy);
                } else {
                    moved = self.step_toward(world, &mut occupancy, i, fx, fy, false);
                }
            } else if hungry && diet.eats_creatures() && sensed.prey.is_some() {
                let prey_id = sensed.prey.expect("checked");
                let prey_view = &views[id_to_view[&prey_id]];
                let adjacent = dist_chebyshev(cx, cy, prey_view.x, prey_view.y) <= 1;
                if adjacent {
                    let aggression = self.creatures[i].genome.aggression;
                    let p = PREDATION_BASE_CHANCE + PREDATION_AGGRESSION_SCALE * aggression;
                    if self.rng.chance(p) {
                        killed.insert(prey_id, cause::PREDATION);
                        let gain =
                            prey_view.energy.max(10.0) * PREY_ENERGY_YIELD * self.creatures[i].genome.efficiency;
                        let c = &mut self.creatures[i];
                        c.energy = (c.energy + gain).min(c.genome.max_energy);
                    }
                } else {
                    moved =
                        self.step_toward(world, &mut occupancy, i, prey_view.x, prey_view.y, false);
                }
            } else if let Some(mate_id) = sensed.mate {
                let self_ready = self.creatures[i].energy
                    >= repro_threshold * self.creatures[i].genome.max_energy
                    && self.creatures[i].age > MIN_BREED_AGE;
                if self_ready {
                    if let Some(baby) = self.try_reproduce(
                        world,
                        registry,
                        log,
                        &mut occupancy,
                        i,
                        mate_id,
                        tick,
                    ) {
                        births.push(baby);
                    }
                } else {
                    moved = self.wander(world, &mut occupancy, i);
                }
            } else {
                moved = self.wander(world, &mut occupancy, i);
            }

            // -- Metabolism --------------------------------------------------
            {
                let tuning_metabolism = world.tuning.base_metabolism;
                let c = &mut self.creatures[i];
                let g = &c.genome;
                let move_term = if moved { g.move_cost } else { 0.0 };
                c.energy -= tuning_metabolism
                    * g.metabolism_rate
                    * (1.0 + 0.5 * c.temp_stress + 0.4 * c.humidity_stress + move_term);
                c.hydration -= c.water_need + 0.2 * c.temp_stress;
                if c.hydration <= 0.0 {
                    c.hydration = 0.0;
                    c.energy -= 0.5;
                }
                c.energy = c.energy.min(g.max_energy);

                // Hazard exposure wears health down; calm tiles heal it.
                let hz = world.hazard[world_index(world, c.x, c.y)];
                if hz > HAZARD_DAMAGE_FLOOR {
                    c.health -= f32::from(hz - HAZARD_DAMAGE_FLOOR) / 32.0;
                } else if c.health < START_HEALTH && c.energy > g.max_energy * 0.5 {
                    c.health = (c.health + 0.25).min(START_HEALTH);
                }
            }

            // -- Ageing ------------------------------------------------------
            self.creatures[i].age += 1;
        }

        // -- Deaths, applied after the pass ---------------------------------
        let mut removed: Vec<(Creature, &'static str)> = Vec::new();
        self.creatures.retain(|c| {
            let cause = if let Some(k) = killed.get(&c.id) {
                Some(*k)
            } else if c.energy <= 0.0 {
                Some(cause::STARVATION)
            } else if c.age >= c.max_age {
                Some(cause::OLD_AGE)
            } else if c.health <= 0.0 {
                Some(cause::EVENT)
            } else {
                None
            };
            match cause {
                Some(cause) => {
                    removed.push((c.clone(), cause));
                    false
                }
                None => true,
            }
        });
        for (c, cause) in &removed {
            LogEvent::new(tick, LogCategory::Deaths, format!("{} died", c.name))
                .at(c.x, c.y)
                .subject(format!("{}", c.id))
                .payload(serde_json::json!({ "cause": cause, "species": c.species_id }))
                .emit(log);
        }

        // -- Births, appended after the pass --------------------------------
        for baby in births {
            LogEvent::new(tick, LogCategory::Births, format!("{} born", baby.name))
                .at(baby.x, baby.y)
                .subject(format!("{}", baby.id))
                .payload(serde_json::json!({ "species": baby.species_id, "generation": baby.generation }))
                .emit(log);
            self.creatures.push(baby);
        }
        debug_assert!(self.creatures.windows(2).all(|w| w[0].id < w[1].id));

        self.repair_species_links(registry, log, tick);
        self.rebuild_grid(world);
        self.publish_census(registry);
    }

    fn try_reproduce(
        &mut self,
        world: &WorldState,
        registry: &mut SpeciesRegistry,
        log: &mut EventLog,
        occupancy: &mut [u16],
        i: usize,
        mate_id: u64,
        tick: u64,
    ) -> Option<Creature> {
        let slot = free_adjacent_tile(world, occupancy, self.creatures[i].x, self.creatures[i].y)?;
        let j = self.creatures.binary_search_by_key(&mate_id, |c| c.id).ok()?;
        if i == j {
            return None;
        }

        let genome = {
            let (a, b) = (&self.creatures[i].genome, &self.creatures[j].genome);
            mutate(&blend(a, b, &mut self.rng), &mut self.rng, world.tuning.mutation_rate)
        };
        let (species_id, created) = registry.assign_species(&genome, tick);

        let cost = effective_repro_cost(&self.creatures[i].genome, world);
        let id = self.alloc_id();
        let generation = self.creatures[i].generation.max(self.creatures[j].generation) + 1;
        let parent_ids = vec![self.creatures[i].id, self.creatures[j].id];
        self.creatures[i].energy -= cost;
        self.creatures[j].energy -= effective_repro_cost(&self.creatures[j].genome, world);

        occupancy[world_index(world, slot.0, slot.1)] += 1;
        let baby = Creature {
            id,
            name: format!("c-{id}"),
            energy: genome.max_energy * 0.4,
            health: START_HEALTH,
            hydration: 70.0,
            water_need: (self.creatures[i].water_need + self.creatures[j].water_need) * 0.5,
            age: 0,
            max_age: genome.max_age,
            x: slot.0,
            y: slot.1,
            generation,
            parent_ids,
            temp_stress: 0.0,
            humidity_stress: 0.0,
            description: None,
            species_id: species_id.clone(),
            genome,
        };
        if created {
            LogEvent::new(
                tick,
                LogCategory::Speciation,
                format!("new species {species_id}"),
            )
            .subject(format!("{id}"))
            .payload(serde_json::json!({ "species": species_id, "trigger_creature": id }))
            .emit(log);
        }
        Some(baby)
    }

    fn wander(&mut self, world: &WorldState, occupancy: &mut [u16], i: usize) -> bool {
        const DIRS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        let pick = self.rng.next_int(5);
        if pick == 4 {
            return false;
        }
        let (dx, dy) = DIRS[pick as usize];
        self.try_move(world, occupancy, i, dx, dy, false)
    }

    fn step_toward(
        &mut self,
        world: &WorldState,
        occupancy: &mut [u16],
        i: usize,
        tx: u16,
        ty: u16,
        allow_water: bool,
    ) -> bool {
        let (cx, cy) = (self.creatures[i].x, self.creatures[i].y);
        let dx = (i32::from(tx) - i32::from(cx)).signum();
        let dy = (i32::from(ty) - i32::from(cy)).signum();
        // Axis with the larger remaining distance moves first; ties go to x.
        let x_first = (i32::from(tx) - i32::from(cx)).abs() >= (i32::from(ty) - i32::from(cy)).abs();
        let attempts = if x_first {
            [(dx, 0), (0, dy)]
        } else {
            [(0, dy), (dx, 0)]
        };
        for (ax, ay) in attempts {
            if (ax, ay) != (0, 0) && self.try_move(world, occupancy, i, ax, ay, allow_water) {
                return true;
            }
        }
        false
    }

    fn try_move(
        &mut self,
        world: &WorldState,
        occupancy: &mut [u16],
        i: usize,
        dx: i32,
        dy: i32,
        allow_water: bool,
    ) -> bool {
        let nx = i32::from(self.creatures[i].x) + dx;
        let ny = i32::from(self.creatures[i].y) + dy;
        if !world.in_bounds(nx, ny) {
            return false;
        }
        let (nx, ny) = (nx as u16, ny as u16);
        let biome = world.biome_at(nx, ny);
        if !biome.walkable() || (biome.is_water() && !allow_water) {
            return false;
        }
        let old = world_index(world, self.creatures[i].x, self.creatures[i].y);
        let new = world_index(world, nx, ny);
        occupancy[old] = occupancy[old].saturating_sub(1);
        occupancy[new] += 1;
        self.creatures[i].x = nx;
        self.creatures[i].y = ny;
        true
    }

    /// A creature whose species vanished from the registry is a consistency
    /// bug, not a runtime condition for the caller: log a warning and
    /// reassign to the nearest centroid.
    fn repair_species_links(
        &mut self,
        registry: &mut SpeciesRegistry,
        log: &mut EventLog,
        tick: u64,
    ) {
        for i in 0..self.creatures.len() {
            if registry.get(&self.creatures[i].species_id).is_none() {
                tracing::warn!(
                    creature = self.creatures[i].id,
                    species = %self.creatures[i].species_id,
                    "creature referenced unknown species; reassigning"
                );
                let (species_id, _) = registry.assign_species(&self.creatures[i].genome, tick);
                LogEvent::new(
                    tick,
                    LogCategory::Info,
                    format!(
                        "creature {} reassigned from missing species to {species_id}",
                        self.creatures[i].id
                    ),
                )
                .severity(Severity::Warn)
                .emit(log);
                self.creatures[i].species_id = species_id;
            }
        }
    }

    fn rebuild_grid(&mut self, world: &WorldState) {
        self.grid = SpatialGrid::new(DEFAULT_CELL_SIZE, world.width, world.height);
        self.grid
            .rebuild(self.creatures.iter().map(|c| (c.id, c.x, c.y)));
    }

    fn publish_census(&self, registry: &mut SpeciesRegistry) {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for c in &self.creatures {
            *counts.entry(c.species_id.clone()).or_insert(0) += 1;
        }
        registry.set_population_counts(&counts);
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

struct Sensed {
    water: Option<(u16, u16)>,
    food_tile: Option<(u16, u16)>,
    prey: Option<u64>,
    mate: Option<u64>,
}

fn sense(
    world: &WorldState,
    views: &[CreatureView],
    grid: &SpatialGrid,
    view_i: usize,
    radius: u16,
    scratch: &mut Vec<u64>,
    killed: &BTreeMap<u64, &'static str>,
) -> Sensed {
    let me = &views[view_i];
    let r = i32::from(radius);

    // Tile scan: nearest water, best plant tile.
    let mut water: Option<(i32, u16, u16)> = None;
    let mut food: Option<(u8, i32, u16, u16)> = None;
    for dy in -r..=r {
        for dx in -r..=r {
            let nx = i32::from(me.x) + dx;
            let ny = i32::from(me.y) + dy;
            if !world.in_bounds(nx, ny) {
                continue;
            }
            let (ux, uy) = (nx as u16, ny as u16);
            let idx = world.index(ux, uy);
            let d2 = dx * dx + dy * dy;
            if world.tiles[idx].is_water() {
                let better = water.map_or(true, |(bd, ..)| d2 < bd);
                if better {
                    water = Some((d2, ux, uy));
                }
            }
            let biomass = world.plant_biomass[idx];
            if biomass > 8 {
                let better = food.map_or(true, |(bb, bd, ..)| {
                    biomass > bb || (biomass == bb && d2 < bd)
                });
                if better {
                    food = Some((biomass, d2, ux, uy));
                }
            }
        }
    }

    // Population scan: prey and mates, id-ascending from the grid.
    grid.query_radius(me.x, me.y, radius, scratch);
    let mut prey: Option<(i32, u64)> = None;
    let mut mate: Option<(i32, u64)> = None;
    for &other_id in scratch.iter() {
        if other_id == me.id || killed.contains_key(&other_id) {
            continue;
        }
        let Some(other) = views.iter().find(|v| v.id == other_id) else {
            continue;
        };
        let d2 = {
            let dx = i32::from(other.x) - i32::from(me.x);
            let dy = i32::from(other.y) - i32::from(me.y);
            dx * dx + dy * dy
        };
        if me.diet.eats_creatures()
            && (other.species_hash != me.species_hash || other.energy < me.energy * 0.6)
            && other.energy < me.energy
            && prey.map_or(true, |(bd, _)| d2 < bd)
        {
            prey = Some((d2, other.id));
        }
        if other.species_hash == me.species_hash
            && other.age > MIN_BREED_AGE
            && other.energy >= other.max_energy * 0.6
            && mate.map_or(true, |(bd, _)| d2 < bd)
        {
            mate = Some((d2, other.id));
        }
    }

    Sensed {
        water: water.map(|(_, x, y)| (x, y)),
        food_tile: food.map(|(_, _, x, y)| (x, y)),
        prey: prey.map(|(_, id)| id),
        mate: mate.map(|(_, id)| id),
    }
}

/// Blend of the individual knob and the world baseline; both stay live.
fn effective_repro_threshold(g: &Genome, world: &WorldState) -> f32 {
    (g.reproduction_threshold + world.tuning.reproduction_threshold) * 0.5
}

fn effective_repro_cost(g: &Genome, world: &WorldState) -> f32 {
    (g.reproduction_cost + world.tuning.reproduction_cost) * 0.5
}

fn free_adjacent_tile(
    world: &WorldState,
    occupancy: &[u16],
    x: u16,
    y: u16,
) -> Option<(u16, u16)> {
    const NEIGHBORS: [(i32, i32); 8] = [
        (1, 0),
        (-1, 0),
        (0, 1),
        (0, -1),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ];
    for (dx, dy) in NEIGHBORS {
        let nx = i32::from(x) + dx;
        let ny = i32::from(y) + dy;
        if !world.in_bounds(nx, ny) {
            continue;
        }
        let (nx, ny) = (nx as u16, ny as u16);
        let biome = world.biome_at(nx, ny);
        if biome.walkable() && !biome.is_water() && occupancy[world_index(world, nx, ny)] == 0 {
            return Some((nx, ny));
        }
    }
    None
}

fn tile_occupancy(world: &WorldState, creatures: &[Creature]) -> Vec<u16> {
    let mut occ = vec![0u16; world.cell_count()];
    for c in creatures {
        occ[world_index(world, c.x, c.y)] += 1;
    }
    occ
}

#[inline]
fn world_index(world: &WorldState, x: u16, y: u16) -> usize {
    y as usize * world.width as usize + x as usize
}

fn dist_chebyshev(ax: u16, ay: u16, bx: u16, by: u16) -> u16 {
    let dx = ax.abs_diff(bx);
    let dy = ay.abs_diff(by);
    dx.max(dy)
}

/// Stable per-run species key for cheap equality in the hot perception loop.
fn species_hash(id: &str) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in id.as_bytes() {
        h ^= u64::from(*b);
        h = h.wrapping_mul(0x100_0000_01b3);
    }
    h
}
