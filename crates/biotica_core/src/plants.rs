//! Plant biomass growth/decay per tile. No species-level state: biomass is a
//! single byte per tile, fed by fertility and humidity, gated by biome.

use crate::world::WorldState;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PLANT_BUDGET: usize = 4096;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantSystem {
    cursor: usize,
}

impl PlantSystem {
    #[must_use]
    pub fn new() -> Self {
        Self { cursor: 0 }
    }

    /// `biomass_next = clamp(biomass + growth - decay, 0, plant_max_biomass)`
    /// for a budgeted slice of tiles. Growth is zero where the biome rejects
    /// plants. Because each tile is only visited every `n / budget` ticks,
    /// per-visit growth is whole units and the math stays in integers.
    pub fn step(&mut self, world: &mut WorldState, budget_cells: usize) {
        let n = world.cell_count();
        if n == 0 {
            return;
        }
        let budget = budget_cells.min(n);
        let max_biomass = world.tuning.plant_max_biomass as u16;
        let base_growth = world.tuning.plant_base_growth;
        let decay = world.tuning.plant_decay as u16;

        for k in 0..budget {
            let idx = (self.cursor + k) % n;
            let biome = world.tiles[idx];
            let current = u16::from(world.plant_biomass[idx]);

            let next = if biome.supports_plants() {
                let fertility = u32::from(world.fertility[idx]);
                let humidity = u32::from(world.humidity[idx]);
                // growth = base * biome/8 * fertility/255 * (1/2 + humidity/510),
                // computed as one rounded integer expression so small rates do
                // not quantize to zero.
                let base8 = (base_growth * 8.0) as u32;
                let num = base8 * u32::from(biome.growth_eighths()) * fertility * (255 + humidity);
                const DEN: u32 = 8 * 8 * 255 * 510;
                let growth = ((num + DEN / 2) / DEN) as u16;
                let grown = current + growth;
                grown.saturating_sub(decay).min(max_biomass)
            } else {
                // Stray biomass on newly scorched/flooded tiles drains away.
                current.saturating_sub(decay.max(1))
            };

            world.plant_biomass[idx] = next.min(255) as u8;
        }

        self.cursor = (self.cursor + budget) % n;
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biotica_data::{Biome, SimTuning};

    fn world_of(biome: Biome) -> WorldState {
        let n = 8 * 8;
        WorldState::new(
            8,
            8,
            1,
            vec![biome; n],
            vec![128; n],
            vec![200; n],
            vec![220; n],
            None,
            SimTuning::default(),
        )
    }

    #[test]
    fn grassland_accumulates_biomass() {
        let mut w = world_of(Biome::Grassland);
        let mut plants = PlantSystem::new();
        for _ in 0..50 {
            plants.step(&mut w, 64);
        }
        assert!(w.plant_biomass.iter().all(|&b| b > 0));
    }

    #[test]
    fn biomass_respects_tuning_cap() {
        let mut w = world_of(Biome::Jungle);
        w.tuning.set_plant_max_biomass(64.0);
        let mut plants = PlantSystem::new();
        for _ in 0..500 {
            plants.step(&mut w, 64);
        }
        assert!(w.plant_biomass.iter().all(|&b| b <= 64));
        assert!(w.plant_biomass.iter().any(|&b| b == 64));
    }

    #[test]
    fn water_and_lava_stay_bare() {
        for biome in [Biome::DeepWater, Biome::Lava, Biome::Snow] {
            let mut w = world_of(biome);
            w.plant_biomass.fill(40);
            let mut plants = PlantSystem::new();
            for _ in 0..100 {
                plants.step(&mut w, 64);
            }
            assert!(w.plant_biomass.iter().all(|&b| b == 0), "{biome:?}");
        }
    }
}
