use super::genome::{DietType, Genome};
use super::tile::Biome;
use serde::{Deserialize, Serialize};

/// Broad habitat description derived from a species centroid at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HabitatHint {
    Shoreline,
    Plains,
    Woodland,
    Wetland,
    Arid,
    Highland,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

/// A species. Records are append-only: once registered, a species is never
/// deleted, even at zero population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    /// `sp-<seed>-<index>`.
    pub id: String,
    pub index: u32,
    pub created_tick: u64,
    /// Deterministic display color from `(seed, index)`.
    pub color: [u8; 3],
    /// Running weighted mean genome. Updated with
    /// `alpha = 1 / max(18, samples + 1)`.
    pub centroid: Genome,
    pub centroid_samples: u32,
    /// Frozen at creation from the founding centroid; sorted by biome byte.
    pub allowed_biomes: Vec<Biome>,
    pub habitat_hint: HabitatHint,
    pub diet_kind: DietType,
    pub size_class: SizeClass,
    /// Unique within the run, deterministic from `(seed, index)`.
    pub common_name: String,
    pub parent_species_id: Option<String>,
    /// Ordered ancestry, oldest first, always ending with `id`.
    pub lineage_ids: Vec<String>,
    pub population: u32,
}

impl SpeciesRecord {
    /// Lineage invariant: the chain ends with this species' own id.
    #[must_use]
    pub fn lineage_is_wellformed(&self) -> bool {
        self.lineage_ids.last().map(String::as_str) == Some(self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lineage_must_end_with_self() {
        let rec = SpeciesRecord {
            id: "sp-1-0".into(),
            index: 0,
            created_tick: 0,
            color: [10, 20, 30],
            centroid: Genome::baseline(),
            centroid_samples: 1,
            allowed_biomes: vec![Biome::Grassland],
            habitat_hint: HabitatHint::Plains,
            diet_kind: DietType::Herbivore,
            size_class: SizeClass::Medium,
            common_name: "Plains Runner".into(),
            parent_species_id: None,
            lineage_ids: vec!["sp-1-0".into()],
            population: 0,
        };
        assert!(rec.lineage_is_wellformed());

        let mut bad = rec;
        bad.lineage_ids = vec!["sp-1-9".into()];
        assert!(!bad.lineage_is_wellformed());
    }
}
