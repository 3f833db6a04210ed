use super::genome::Genome;
use serde::{Deserialize, Serialize};

/// One individual. Mutated only inside the creature pass; everything the
/// save contract needs lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub id: u64,
    pub species_id: String,
    pub name: String,
    pub energy: f32,
    pub health: f32,
    pub hydration: f32,
    /// Per-tick hydration drain, `[0, 1]`.
    pub water_need: f32,
    pub age: u32,
    pub max_age: u32,
    pub x: u16,
    pub y: u16,
    pub generation: u32,
    pub parent_ids: Vec<u64>,
    pub genome: Genome,
    pub temp_stress: f32,
    pub humidity_stress: f32,
    /// Non-authoritative prose from the text service. Never read by the
    /// kernel and excluded from state hashes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Creature {
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.energy <= 0.0 || self.age >= self.max_age
    }
}
