use serde::{Deserialize, Serialize};

/// Closed record of scalar simulation knobs. Owned exclusively by the kernel;
/// every setter clamps to the declared bounds, so a `SimTuning` read back out
/// of the kernel is always in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimTuning {
    pub plant_base_growth: f32,
    pub plant_max_biomass: f32,
    pub plant_decay: f32,
    pub base_metabolism: f32,
    pub reproduction_threshold: f32,
    pub reproduction_cost: f32,
    pub mutation_rate: f32,
    pub event_rate: f32,
    pub simulation_speed: f32,
}

pub const PLANT_BASE_GROWTH: (f32, f32) = (0.1, 12.0);
pub const PLANT_MAX_BIOMASS: (f32, f32) = (32.0, 255.0);
pub const PLANT_DECAY: (f32, f32) = (0.0, 8.0);
pub const BASE_METABOLISM: (f32, f32) = (0.05, 2.0);
pub const TUNING_REPRO_THRESHOLD: (f32, f32) = (0.3, 1.0);
pub const TUNING_REPRO_COST: (f32, f32) = (5.0, 80.0);
pub const MUTATION_RATE: (f32, f32) = (0.0, 1.0);
pub const EVENT_RATE: (f32, f32) = (0.0, 4.0);
pub const SIMULATION_SPEED: (f32, f32) = (0.1, 10.0);

impl Default for SimTuning {
    fn default() -> Self {
        Self {
            plant_base_growth: 6.0,
            plant_max_biomass: 220.0,
            plant_decay: 1.0,
            base_metabolism: 0.35,
            reproduction_threshold: 0.75,
            reproduction_cost: 28.0,
            mutation_rate: 0.12,
            event_rate: 1.0,
            simulation_speed: 1.0,
        }
    }
}

impl SimTuning {
    pub fn set_plant_base_growth(&mut self, v: f32) {
        self.plant_base_growth = v.clamp(PLANT_BASE_GROWTH.0, PLANT_BASE_GROWTH.1);
    }
    pub fn set_plant_max_biomass(&mut self, v: f32) {
        self.plant_max_biomass = v.clamp(PLANT_MAX_BIOMASS.0, PLANT_MAX_BIOMASS.1);
    }
    pub fn set_plant_decay(&mut self, v: f32) {
        self.plant_decay = v.clamp(PLANT_DECAY.0, PLANT_DECAY.1);
    }
    pub fn set_base_metabolism(&mut self, v: f32) {
        self.base_metabolism = v.clamp(BASE_METABOLISM.0, BASE_METABOLISM.1);
    }
    pub fn set_reproduction_threshold(&mut self, v: f32) {
        self.reproduction_threshold = v.clamp(TUNING_REPRO_THRESHOLD.0, TUNING_REPRO_THRESHOLD.1);
    }
    pub fn set_reproduction_cost(&mut self, v: f32) {
        self.reproduction_cost = v.clamp(TUNING_REPRO_COST.0, TUNING_REPRO_COST.1);
    }
    pub fn set_mutation_rate(&mut self, v: f32) {
        self.mutation_rate = v.clamp(MUTATION_RATE.0, MUTATION_RATE.1);
    }
    pub fn set_event_rate(&mut self, v: f32) {
        self.event_rate = v.clamp(EVENT_RATE.0, EVENT_RATE.1);
    }
    pub fn set_simulation_speed(&mut self, v: f32) {
        self.simulation_speed = v.clamp(SIMULATION_SPEED.0, SIMULATION_SPEED.1);
    }
}

/// Partial update produced by an external tuner; applied through the genesis
/// acceptance path, each field clamped by the matching setter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TuningPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_base_growth: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_max_biomass: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_decay: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_metabolism: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reproduction_threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reproduction_cost: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_rate: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_rate: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_speed: Option<f32>,
}

impl SimTuning {
    /// Apply a patch, clamping each present field.
    pub fn apply_patch(&mut self, patch: &TuningPatch) {
        if let Some(v) = patch.plant_base_growth {
            self.set_plant_base_growth(v);
        }
        if let Some(v) = patch.plant_max_biomass {
            self.set_plant_max_biomass(v);
        }
        if let Some(v) = patch.plant_decay {
            self.set_plant_decay(v);
        }
        if let Some(v) = patch.base_metabolism {
            self.set_base_metabolism(v);
        }
        if let Some(v) = patch.reproduction_threshold {
            self.set_reproduction_threshold(v);
        }
        if let Some(v) = patch.reproduction_cost {
            self.set_reproduction_cost(v);
        }
        if let Some(v) = patch.mutation_rate {
            self.set_mutation_rate(v);
        }
        if let Some(v) = patch.event_rate {
            self.set_event_rate(v);
        }
        if let Some(v) = patch.simulation_speed {
            self.set_simulation_speed(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp() {
        let mut t = SimTuning::default();
        t.set_mutation_rate(7.0);
        assert_eq!(t.mutation_rate, 1.0);
        t.set_event_rate(-1.0);
        assert_eq!(t.event_rate, 0.0);
        t.set_simulation_speed(1000.0);
        assert_eq!(t.simulation_speed, SIMULATION_SPEED.1);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut t = SimTuning::default();
        let before = t.clone();
        t.apply_patch(&TuningPatch {
            mutation_rate: Some(0.5),
            ..TuningPatch::default()
        });
        assert_eq!(t.mutation_rate, 0.5);
        assert_eq!(t.plant_base_growth, before.plant_base_growth);
    }
}
