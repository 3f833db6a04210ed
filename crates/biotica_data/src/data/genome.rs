use serde::{Deserialize, Serialize};

/// Feeding strategy. `Predator` transitions are never spontaneous; mutation
/// only flips between `Herbivore` and `Omnivore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DietType {
    Herbivore = 0,
    Predator = 1,
    Omnivore = 2,
}

impl DietType {
    #[must_use]
    pub fn eats_plants(self) -> bool {
        matches!(self, DietType::Herbivore | DietType::Omnivore)
    }

    #[must_use]
    pub fn eats_creatures(self) -> bool {
        matches!(self, DietType::Predator | DietType::Omnivore)
    }
}

/// Inclusive bounds for one continuous genome field.
#[derive(Debug, Clone, Copy)]
pub struct FieldBounds {
    pub min: f32,
    pub max: f32,
}

impl FieldBounds {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn clamp(&self, v: f32) -> f32 {
        v.clamp(self.min, self.max)
    }

    #[must_use]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

pub const METABOLISM_RATE: FieldBounds = FieldBounds::new(0.4, 2.5);
pub const MOVE_COST: FieldBounds = FieldBounds::new(0.1, 1.5);
pub const PREFERRED_TEMP: FieldBounds = FieldBounds::new(0.0, 1.0);
pub const TEMP_TOLERANCE: FieldBounds = FieldBounds::new(0.05, 0.5);
pub const PREFERRED_HUMIDITY: FieldBounds = FieldBounds::new(0.0, 1.0);
pub const HUMIDITY_TOLERANCE: FieldBounds = FieldBounds::new(0.05, 0.5);
pub const AGGRESSION: FieldBounds = FieldBounds::new(0.0, 1.0);
pub const REPRODUCTION_THRESHOLD: FieldBounds = FieldBounds::new(0.4, 0.95);
pub const REPRODUCTION_COST: FieldBounds = FieldBounds::new(10.0, 60.0);
pub const EFFICIENCY: FieldBounds = FieldBounds::new(0.3, 0.95);
pub const MAX_ENERGY: FieldBounds = FieldBounds::new(60.0, 240.0);
pub const PERCEPTION_MIN: u8 = 1;
pub const PERCEPTION_MAX: u8 = 6;
pub const MAX_AGE_MIN: u32 = 400;
pub const MAX_AGE_MAX: u32 = 4000;

/// Quantitative genome with a fixed 14-field schema. Every mutation path
/// must go through [`Genome::clamp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub metabolism_rate: f32,
    pub move_cost: f32,
    pub preferred_temp: f32,
    pub temp_tolerance: f32,
    pub preferred_humidity: f32,
    pub humidity_tolerance: f32,
    pub aggression: f32,
    pub reproduction_threshold: f32,
    pub reproduction_cost: f32,
    pub perception_radius: u8,
    pub diet: DietType,
    pub efficiency: f32,
    pub max_energy: f32,
    pub max_age: u32,
}

impl Genome {
    /// A mid-range herbivore baseline. Species archetypes and mutation start
    /// from here.
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            metabolism_rate: 1.0,
            move_cost: 0.4,
            preferred_temp: 0.5,
            temp_tolerance: 0.2,
            preferred_humidity: 0.5,
            humidity_tolerance: 0.2,
            aggression: 0.2,
            reproduction_threshold: 0.7,
            reproduction_cost: 30.0,
            perception_radius: 3,
            diet: DietType::Herbivore,
            efficiency: 0.6,
            max_energy: 120.0,
            max_age: 1600,
        }
    }

    /// Clamp every field into its declared bounds.
    pub fn clamp(&mut self) {
        self.metabolism_rate = METABOLISM_RATE.clamp(self.metabolism_rate);
        self.move_cost = MOVE_COST.clamp(self.move_cost);
        self.preferred_temp = PREFERRED_TEMP.clamp(self.preferred_temp);
        self.temp_tolerance = TEMP_TOLERANCE.clamp(self.temp_tolerance);
        self.preferred_humidity = PREFERRED_HUMIDITY.clamp(self.preferred_humidity);
        self.humidity_tolerance = HUMIDITY_TOLERANCE.clamp(self.humidity_tolerance);
        self.aggression = AGGRESSION.clamp(self.aggression);
        self.reproduction_threshold = REPRODUCTION_THRESHOLD.clamp(self.reproduction_threshold);
        self.reproduction_cost = REPRODUCTION_COST.clamp(self.reproduction_cost);
        self.perception_radius = self.perception_radius.clamp(PERCEPTION_MIN, PERCEPTION_MAX);
        self.efficiency = EFFICIENCY.clamp(self.efficiency);
        self.max_energy = MAX_ENERGY.clamp(self.max_energy);
        self.max_age = self.max_age.clamp(MAX_AGE_MIN, MAX_AGE_MAX);
    }

    /// True when every field already sits inside its bounds.
    #[must_use]
    pub fn in_bounds(&self) -> bool {
        let mut c = self.clone();
        c.clamp();
        c == *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_is_in_bounds() {
        assert!(Genome::baseline().in_bounds());
    }

    #[test]
    fn clamp_pulls_fields_into_range() {
        let mut g = Genome::baseline();
        g.metabolism_rate = 99.0;
        g.perception_radius = 42;
        g.max_age = 7;
        g.clamp();
        assert_eq!(g.metabolism_rate, METABOLISM_RATE.max);
        assert_eq!(g.perception_radius, PERCEPTION_MAX);
        assert_eq!(g.max_age, MAX_AGE_MIN);
    }
}
