//! Shared builders for the scenario suite.
#![allow(dead_code)]

use biotica_core::{Preset, Simulation, WorldInit};

pub struct SimBuilder {
    init: WorldInit,
    mutation_rate: Option<f32>,
    event_rate: Option<f32>,
}

impl SimBuilder {
    pub fn new() -> Self {
        Self {
            init: WorldInit::default(),
            mutation_rate: None,
            event_rate: None,
        }
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.init.seed = seed;
        self
    }

    pub fn size(mut self, width: u16, height: u16) -> Self {
        self.init.width = width;
        self.init.height = height;
        self
    }

    pub fn creatures(mut self, n: usize) -> Self {
        self.init.initial_creatures = n;
        self
    }

    pub fn preset(mut self, preset: Preset) -> Self {
        self.init.preset = preset;
        self
    }

    pub fn civs(mut self, enabled: bool) -> Self {
        self.init.enable_civs = enabled;
        self
    }

    pub fn predators(mut self, enabled: bool) -> Self {
        self.init.enable_predators = enabled;
        self
    }

    pub fn volcanoes(mut self, n: u8) -> Self {
        self.init.volcano_count = n;
        self
    }

    pub fn mutation_rate(mut self, rate: f32) -> Self {
        self.mutation_rate = Some(rate);
        self
    }

    pub fn event_rate(mut self, rate: f32) -> Self {
        self.event_rate = Some(rate);
        self
    }

    pub fn build(self) -> Simulation {
        let mut sim = Simulation::new(self.init);
        if let Some(rate) = self.mutation_rate {
            sim.world.tuning.set_mutation_rate(rate);
        }
        if let Some(rate) = self.event_rate {
            sim.world.tuning.set_event_rate(rate);
        }
        sim
    }
}

impl Default for SimBuilder {
    fn default() -> Self {
        Self::new()
    }
}
