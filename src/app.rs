//! Host-side application shell: owns the kernel plus the fixed-step
//! scheduler and drives them from wall-clock frames. The kernel itself
//! never sees wall time; it only ever receives whole ticks.

use anyhow::Result;
use biotica_core::{Scheduler, Simulation, WorldInit};
use biotica_io::{SaveRecord, SaveStore};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub struct App {
    pub sim: Simulation,
    pub scheduler: Scheduler,
    pub store: SaveStore,
    pub world_id: Uuid,
}

impl App {
    #[must_use]
    pub fn create(init: WorldInit, save_dir: PathBuf) -> Self {
        Self {
            sim: Simulation::new(init),
            scheduler: Scheduler::new(),
            store: SaveStore::new(save_dir),
            world_id: Uuid::new_v4(),
        }
    }

    pub fn load(world_id: Uuid, slot: Option<&str>, save_dir: PathBuf) -> biotica_io::Result<Self> {
        let store = SaveStore::new(save_dir);
        let record = store.load_world(world_id, slot)?;
        let sim = record.restore()?;
        Ok(Self {
            sim,
            scheduler: Scheduler::new(),
            store,
            world_id,
        })
    }

    /// Advance as fast as the machine allows; used for headless batch runs.
    pub fn run_fast(&mut self, ticks: u64) {
        self.sim.run_ticks(ticks);
    }

    /// Drive the scheduler from real frames until `ticks` have elapsed.
    /// Frame pacing only affects when ticks fire, never what they compute.
    pub fn run_realtime(&mut self, ticks: u64) {
        let target = self.sim.world.tick + ticks;
        let mut last_frame = Instant::now();
        while self.sim.world.tick < target {
            let now = Instant::now();
            let frame_ms = now.duration_since(last_frame).as_secs_f64() * 1000.0;
            last_frame = now;

            let steps = self
                .scheduler
                .advance(frame_ms, self.sim.world.tuning.simulation_speed);
            for _ in 0..steps {
                if self.sim.world.tick >= target {
                    break;
                }
                self.sim.step();
            }
            std::thread::sleep(Duration::from_millis(4));
        }
    }

    pub fn pause(&mut self) {
        self.scheduler.pause();
    }

    pub fn resume(&mut self) {
        self.scheduler.resume();
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.scheduler.set_speed(speed);
    }

    /// Reset to a new seed; the scheduler state is cleared with it.
    pub fn reset(&mut self, seed: u32) {
        self.sim.reset(seed);
        self.scheduler.reset();
    }

    pub fn save(&self, slot: &str) -> biotica_io::Result<PathBuf> {
        let record = SaveRecord::build(&self.sim, self.world_id);
        self.store.write(&record, slot)
    }

    pub fn summary(&self) -> Result<String> {
        Ok(format!(
            "world '{}' seed {} tick {} | population {} | species {} | factions {} | hash {}",
            self.sim.profile.name,
            self.sim.world.seed,
            self.sim.world.tick,
            self.sim.creatures.len(),
            self.sim.registry.species.len(),
            self.sim.civ.factions.len(),
            self.sim.state_hash(),
        ))
    }
}
