//! The simulation kernel: owns every subsystem, advances them in the fixed
//! per-tick order, and is the single writer of world state.
//!
//! Tick data flow (a contract, not an implementation detail):
//! events → environment → plants → creatures → civ → log/snapshot.

use crate::civ::CivSystem;
use crate::crafting::ItemCatalog;
use crate::creatures::{CreatureSystem, DEFAULT_CREATURES};
use crate::environment::{EnvironmentUpdater, DEFAULT_CELL_BUDGET};
use crate::events::{EventPhase, EventSystem};
use crate::genesis::{GenesisOutcome, GenesisSummary};
use crate::log::{EventLog, LogEvent};
use crate::plants::{PlantSystem, DEFAULT_PLANT_BUDGET};
use crate::rng::{KernelRng, STREAM_CIV, STREAM_CREATURES, STREAM_EVENTS};
use crate::snapshot::{
    self, AgentSummary, CreatureSummary, EventSummary, FactionSummary, RelationSummary,
    SpeciesSummary, StructureSummary, WorldSnapshot, SNAPSHOT_VERSION,
};
use crate::species::SpeciesRegistry;
use crate::terrain::{self, TerrainParams};
use crate::world::WorldState;
use biotica_data::{LogCategory, Severity, SimTuning, TuningPatch};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Preset {
    Lush,
    #[default]
    Temperate,
    Arid,
    Archipelago,
}

impl Preset {
    /// Preset-specific tuning baseline; the genesis patch may refine it.
    #[must_use]
    pub fn tuning(self) -> SimTuning {
        let mut t = SimTuning::default();
        match self {
            Preset::Lush => {
                t.set_plant_base_growth(9.0);
                t.set_plant_max_biomass(255.0);
            }
            Preset::Temperate => {}
            Preset::Arid => {
                t.set_plant_base_growth(3.5);
                t.set_plant_decay(2.0);
                t.set_event_rate(1.4);
            }
            Preset::Archipelago => {
                t.set_plant_base_growth(7.0);
            }
        }
        t
    }

    #[must_use]
    pub fn default_tree_density(self) -> f32 {
        match self {
            Preset::Lush => 0.8,
            Preset::Temperate => 0.5,
            Preset::Arid => 0.2,
            Preset::Archipelago => 0.6,
        }
    }
}

/// Immutable inputs of a run. Everything the save contract calls the "world
/// profile" lives here; wall-clock only ever appears as metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldProfile {
    pub name: String,
    pub seed: u32,
    pub preset: Preset,
    pub width: u16,
    pub height: u16,
    pub event_rate: f32,
    pub tree_density: f32,
    pub volcano_count: u8,
    pub enable_civs: bool,
    pub enable_predators: bool,
    pub enable_gene_agent: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct WorldInit {
    pub name: String,
    pub seed: u32,
    pub preset: Preset,
    pub width: u16,
    pub height: u16,
    pub event_rate: f32,
    pub tree_density: Option<f32>,
    pub volcano_count: u8,
    pub simulation_speed: f32,
    pub initial_creatures: usize,
    pub enable_civs: bool,
    pub enable_predators: bool,
    pub enable_gene_agent: bool,
}

impl Default for WorldInit {
    fn default() -> Self {
        Self {
            name: "world".into(),
            seed: 1,
            preset: Preset::Temperate,
            width: 128,
            height: 80,
            event_rate: 1.0,
            tree_density: None,
            volcano_count: 1,
            simulation_speed: 1.0,
            initial_creatures: DEFAULT_CREATURES,
            enable_civs: true,
            enable_predators: true,
            enable_gene_agent: false,
        }
    }
}

/// A derived epoch of the run's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraEntry {
    pub id: u32,
    pub name: String,
    pub start_tick: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub profile: WorldProfile,
    pub world: WorldState,
    pub events: EventSystem,
    pub environment: EnvironmentUpdater,
    pub plants: PlantSystem,
    pub creatures: CreatureSystem,
    pub registry: SpeciesRegistry,
    pub civ: CivSystem,
    pub catalog: ItemCatalog,
    pub log: EventLog,
    pub genesis: GenesisSummary,
    pub chronicle: Vec<EraEntry>,
    reset_token: u64,
}

impl Simulation {
    #[must_use]
    pub fn new(init: WorldInit) -> Self {
        Self::with_reset_token(init, 0)
    }

    fn with_reset_token(init: WorldInit, reset_token: u64) -> Self {
        let tree_density = init
            .tree_density
            .unwrap_or_else(|| init.preset.default_tree_density());
        let terrain = terrain::generate(
            init.width,
            init.height,
            init.seed,
            &TerrainParams {
                tree_density,
                volcano_count: init.volcano_count.min(1),
            },
        );
        let mut tuning = init.preset.tuning();
        tuning.set_event_rate(init.event_rate);
        tuning.set_simulation_speed(init.simulation_speed);

        let world = WorldState::new(
            init.width,
            init.height,
            init.seed,
            terrain.tiles,
            terrain.temperature,
            terrain.humidity,
            terrain.fertility,
            terrain.volcano,
            tuning,
        );

        let catalog = ItemCatalog::generate(init.seed);
        let mut registry = SpeciesRegistry::new(init.seed);
        registry.ensure_base_species(init.enable_predators);
        let mut creatures = CreatureSystem::new(KernelRng::stream(init.seed, STREAM_CREATURES));
        creatures.spawn_initial(&world, &mut registry, init.initial_creatures);
        let civ = CivSystem::new(
            init.width,
            init.height,
            &catalog,
            KernelRng::stream(init.seed, STREAM_CIV),
            init.enable_civs,
        );

        let mut log = EventLog::default();
        log.record(
            0,
            Severity::Info,
            LogCategory::Info,
            format!("world '{}' created (seed {})", init.name, init.seed),
        );

        let mut sim = Self {
            profile: WorldProfile {
                name: init.name,
                seed: init.seed,
                preset: init.preset,
                width: init.width,
                height: init.height,
                event_rate: init.event_rate,
                tree_density,
                volcano_count: init.volcano_count.min(1),
                enable_civs: init.enable_civs,
                enable_predators: init.enable_predators,
                enable_gene_agent: init.enable_gene_agent,
                created_at: crate::log::wall_clock(),
            },
            world,
            events: EventSystem::new(KernelRng::stream(init.seed, STREAM_EVENTS)),
            environment: EnvironmentUpdater::new(),
            plants: PlantSystem::new(),
            creatures,
            registry,
            civ,
            catalog,
            log,
            genesis: GenesisSummary::default(),
            chronicle: Vec::new(),
            reset_token,
        };
        sim.chronicle.push(EraEntry {
            id: 0,
            name: "Dawn".into(),
            start_tick: 0,
        });
        sim
    }

    /// Advance exactly one tick. Subsystem order is a contract; no subsystem
    /// observes another mid-tick, and no error escapes: failures become log
    /// entries.
    pub fn step(&mut self) {
        let tick = self.world.tick;

        // 1. Events.
        let finished = self.events.step(&mut self.world, tick);
        for ev in &self.events.active {
            if ev.start_tick == tick && ev.phase == EventPhase::Active {
                LogEvent::new(
                    tick,
                    LogCategory::Events,
                    format!("{} begins", ev.kind.label()),
                )
                .at(ev.x, ev.y)
                .subject(format!("ev-{}", ev.id))
                .emit(&mut self.log);
            }
        }
        for ev in finished {
            LogEvent::new(tick, LogCategory::Events, format!("{} ends", ev.kind.label()))
                .at(ev.x, ev.y)
                .subject(format!("ev-{}", ev.id))
                .emit(&mut self.log);
        }

        // 2. Environment diffusion.
        self.environment.step(&mut self.world, DEFAULT_CELL_BUDGET);

        // 3. Plants.
        self.plants.step(&mut self.world, DEFAULT_PLANT_BUDGET);

        // 4. Creatures.
        self.creatures
            .step(&mut self.world, &mut self.registry, &mut self.log, tick);

        // 5. Civilization.
        self.civ.step(
            &mut self.world,
            &self.creatures.creatures,
            &self.registry,
            &self.catalog,
            &mut self.log,
            tick,
        );

        // 6. Chronicle + commit.
        self.update_chronicle(tick);
        self.world.tick = tick + 1;
    }

    pub fn run_ticks(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Rebuild the transient (non-serialized) acceleration structures after
    /// deserialization. Loaders must call this before serving queries.
    pub fn rehydrate(&mut self) {
        self.creatures.rebuild_index(&self.world);
    }

    #[must_use]
    pub fn reset_token(&self) -> u64 {
        self.reset_token
    }

    pub fn restore_reset_token(&mut self, token: u64) {
        self.reset_token = token;
    }

    /// Rebuild the world from its immutable profile with a new seed. Bumps
    /// the reset token so in-flight async setup for the old world aborts.
    pub fn reset(&mut self, seed: u32) {
        let token = self.reset_token + 1;
        let profile = self.profile.clone();
        *self = Self::with_reset_token(
            WorldInit {
                name: profile.name,
                seed,
                preset: profile.preset,
                width: profile.width,
                height: profile.height,
                event_rate: profile.event_rate,
                tree_density: Some(profile.tree_density),
                volcano_count: profile.volcano_count,
                simulation_speed: self.world.tuning.simulation_speed,
                initial_creatures: DEFAULT_CREATURES,
                enable_civs: profile.enable_civs,
                enable_predators: profile.enable_predators,
                enable_gene_agent: profile.enable_gene_agent,
            },
            token,
        );
    }

    /// Accept an externally produced tuning patch. Applied at most once per
    /// world, only when the proposing task's token is current.
    pub fn accept_genesis(
        &mut self,
        patch: &TuningPatch,
        reason_codes: Vec<String>,
        token: u64,
    ) -> GenesisOutcome {
        if token != self.reset_token {
            return GenesisOutcome::StaleToken;
        }
        if self.genesis.applied {
            return GenesisOutcome::AlreadyApplied;
        }
        self.world.tuning.apply_patch(patch);
        self.genesis = GenesisSummary {
            applied: true,
            applied_tick: self.world.tick,
            reason_codes: reason_codes.clone(),
        };
        LogEvent::new(
            self.world.tick,
            LogCategory::Info,
            "genesis tuning applied".to_string(),
        )
        .payload(serde_json::json!({ "reason_codes": reason_codes }))
        .emit(&mut self.log);
        GenesisOutcome::Applied
    }

    fn update_chronicle(&mut self, tick: u64) {
        let next = self.chronicle.len();
        let reached = match next {
            1 => self.registry.species.len() >= 5,
            2 => !self.civ.factions.is_empty(),
            3 => {
                self.civ.factions.len() >= 3
                    || self
                        .civ
                        .relations
                        .iter()
                        .any(|r| r.status == biotica_data::RelationStatus::War)
            }
            4 => self.civ.factions.iter().any(|f| f.tech_level >= 4),
            _ => false,
        };
        if reached {
            let name = match next {
                1 => "Flourishing",
                2 => "Awakening",
                3 => "Dominion",
                _ => "Mastery",
            };
            self.chronicle.push(EraEntry {
                id: next as u32,
                name: name.into(),
                start_tick: tick,
            });
            self.log.record(
                tick,
                Severity::Info,
                LogCategory::Info,
                format!("a new era dawns: {name}"),
            );
        }
    }

    /// Immutable projection for external consumers.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            version: SNAPSHOT_VERSION,
            tick: self.world.tick,
            seed: self.world.seed,
            width: self.world.width,
            height: self.world.height,
            tiles: self.world.tiles_as_bytes(),
            temperature: self.world.temperature.clone(),
            humidity: self.world.humidity.clone(),
            fertility: self.world.fertility.clone(),
            hazard: self.world.hazard.clone(),
            plant_biomass: self.world.plant_biomass.clone(),
            territory_owner: self.civ.territory.owner.clone(),
            territory_version: self.civ.territory.version,
            overlay: self.events.overlay,
            species: self
                .registry
                .species
                .iter()
                .map(|s| SpeciesSummary {
                    id: s.id.clone(),
                    common_name: s.common_name.clone(),
                    population: s.population,
                    diet: s.diet_kind,
                    size_class: s.size_class,
                    color: s.color,
                    created_tick: s.created_tick,
                    parent_species_id: s.parent_species_id.clone(),
                })
                .collect(),
            creatures: self
                .creatures
                .creatures
                .iter()
                .map(|c| CreatureSummary {
                    id: c.id,
                    species_id: c.species_id.clone(),
                    x: c.x,
                    y: c.y,
                    energy: c.energy,
                    age: c.age,
                    generation: c.generation,
                })
                .collect(),
            factions: self
                .civ
                .factions
                .iter()
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
                .collect(),
            agents: self
                .civ
                .agents
                .iter()
                .map(|a| AgentSummary {
                    id: a.id,
                    faction_id: a.faction_id,
                    x: a.x,
                    y: a.y,
                    intent: a.intent,
                })
                .collect(),
            structures: self
                .civ
                .structures
                .iter()
                .map(|s| StructureSummary {
                    id: s.id,
                    kind: s.kind,
                    faction_id: s.faction_id,
                    x: s.x,
                    y: s.y,
                    progress: s.progress,
                    completed: s.completed,
                })
                .collect(),
            relations: self
                .civ
                .relations
                .iter()
                .map(|r| RelationSummary {
                    from: r.from,
                    to: r.to,
                    status: r.status,
                })
                .collect(),
            active_events: self
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
                .collect(),
            log_tail: self.log.recent(None, 0, snapshot::log_tail_len()),
        }
    }

    /// SHA-256 over the deterministic state. Wall-clock metadata and
    /// non-authoritative text (descriptions, note translations) are stripped
    /// before hashing, per the determinism contract.
    #[must_use]
    pub fn state_hash(&self) -> String {
        #[derive(Serialize)]
        struct Projection<'a> {
            world: &'a WorldState,
            events: &'a EventSystem,
            environment: &'a EnvironmentUpdater,
            plants: &'a PlantSystem,
            creatures: CreatureSystem,
            registry: &'a SpeciesRegistry,
            civ: CivSystem,
            catalog: &'a ItemCatalog,
            genesis: &'a GenesisSummary,
            chronicle: &'a Vec<EraEntry>,
            log: Vec<biotica_data::LogEntry>,
        }

        let mut creatures = self.creatures.clone();
        for c in &mut creatures.creatures {
            c.description = None;
        }
        let mut civ = self.civ.clone();
        for n in &mut civ.notes {
            n.translation = None;
        }
        let log = self
            .log
            .iter()
            .cloned()
            .map(|mut e| {
                e.time = String::new();
                e
            })
            .collect();

        let projection = Projection {
            world: &self.world,
            events: &self.events,
            environment: &self.environment,
            plants: &self.plants,
            creatures,
            registry: &self.registry,
            civ,
            catalog: &self.catalog,
            genesis: &self.genesis,
            chronicle: &self.chronicle,
            log,
        };
        let bytes = serde_json::to_vec(&projection).expect("state serializes");
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_init(seed: u32) -> WorldInit {
        WorldInit {
            seed,
            width: 48,
            height: 32,
            initial_creatures: 80,
            ..WorldInit::default()
        }
    }

    #[test]
    fn two_runs_agree_bit_for_bit() {
        let mut a = Simulation::new(small_init(12345));
        let mut b = Simulation::new(small_init(12345));
        a.run_ticks(150);
        b.run_ticks(150);
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Simulation::new(small_init(1));
        let mut b = Simulation::new(small_init(2));
        a.run_ticks(50);
        b.run_ticks(50);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn tick_advances_exactly_once_per_step() {
        let mut sim = Simulation::new(small_init(7));
        assert_eq!(sim.world.tick, 0);
        sim.step();
        assert_eq!(sim.world.tick, 1);
        sim.run_ticks(9);
        assert_eq!(sim.world.tick, 10);
    }

    #[test]
    fn genesis_applies_once_and_respects_token() {
        let mut sim = Simulation::new(small_init(3));
        let patch = TuningPatch {
            mutation_rate: Some(0.4),
            ..TuningPatch::default()
        };
        assert_eq!(
            sim.accept_genesis(&patch, vec!["balance:flora".into()], 1),
            GenesisOutcome::StaleToken
        );
        assert_eq!(
            sim.accept_genesis(&patch, vec!["balance:flora".into()], 0),
            GenesisOutcome::Applied
        );
        assert_eq!(sim.world.tuning.mutation_rate, 0.4);
        assert_eq!(
            sim.accept_genesis(&patch, vec![], 0),
            GenesisOutcome::AlreadyApplied
        );
        assert!(sim.genesis.applied);
        assert_eq!(sim.genesis.reason_codes, vec!["balance:flora".to_string()]);
    }

    #[test]
    fn reset_bumps_token_and_restarts() {
        let mut sim = Simulation::new(small_init(5));
        sim.run_ticks(20);
        sim.reset(99);
        assert_eq!(sim.world.tick, 0);
        assert_eq!(sim.world.seed, 99);
        assert_eq!(sim.reset_token(), 1);
    }

    #[test]
    fn snapshot_matches_kernel_counts() {
        let mut sim = Simulation::new(small_init(11));
        sim.run_ticks(30);
        let snap = sim.snapshot();
        assert_eq!(snap.version, SNAPSHOT_VERSION);
        assert_eq!(snap.tick, sim.world.tick);
        assert_eq!(snap.population(), sim.creatures.len());
        assert_eq!(snap.tiles.len(), sim.world.cell_count());
        assert_eq!(snap.species.len(), sim.registry.species.len());
    }

    #[test]
    fn population_counts_stay_conserved() {
        let mut sim = Simulation::new(small_init(2024));
        for _ in 0..100 {
            sim.step();
            assert_eq!(sim.registry.total_population(), sim.creatures.len() as u64);
        }
    }
}
