//! Deterministic description fallbacks: pure functions of the entity and
//! the world seed, so UIs render sensible prose even when no text service
//! is reachable. These never feed back into the kernel.

use biotica_data::{Creature, DietType, Faction, HabitatHint, SizeClass, SpeciesRecord, Strategy};

const TEMPERAMENTS: [&str; 6] = ["wary", "placid", "restless", "bold", "skittish", "stubborn"];
const GAITS: [&str; 5] = ["loping", "shuffling", "darting", "ambling", "prowling"];
const HIDES: [&str; 6] = [
    "mottled", "sleek", "bristled", "dust-colored", "banded", "scarred",
];

#[must_use]
pub fn creature_description(creature: &Creature, species: Option<&SpeciesRecord>, seed: u32) -> String {
    let h = mix(seed, creature.id as u32);
    let temperament = TEMPERAMENTS[(h % 6) as usize];
    let gait = GAITS[((h >> 8) % 5) as usize];
    let hide = HIDES[((h >> 16) % 6) as usize];
    let kind = species
        .map(|s| s.common_name.as_str())
        .unwrap_or("creature");
    let diet = match creature.genome.diet {
        DietType::Herbivore => "grazing where the ground is green",
        DietType::Predator => "trailing weaker animals at a distance",
        DietType::Omnivore => "eating whatever the day provides",
    };
    format!(
        "A {temperament}, {hide} {kind} with a {gait} gait, {diet}. Generation {}.",
        creature.generation
    )
}

#[must_use]
pub fn species_description(species: &SpeciesRecord, seed: u32) -> String {
    let h = mix(seed, species.index);
    let size = match species.size_class {
        SizeClass::Small => "small-bodied",
        SizeClass::Medium => "mid-sized",
        SizeClass::Large => "heavy-set",
    };
    let habitat = match species.habitat_hint {
        HabitatHint::Shoreline => "along shorelines",
        HabitatHint::Plains => "across open plains",
        HabitatHint::Woodland => "under forest canopy",
        HabitatHint::Wetland => "in standing wetlands",
        HabitatHint::Arid => "over dry country",
        HabitatHint::Highland => "among the high slopes",
    };
    let note = ["seldom seen alone", "fiercely territorial", "quick to scatter"][(h % 3) as usize];
    format!(
        "{} is a {size} species ranging {habitat}, {note}.",
        species.common_name
    )
}

#[must_use]
pub fn faction_description(faction: &Faction, seed: u32) -> String {
    let h = mix(seed, faction.id);
    let mood = match faction.strategy {
        Strategy::Expand => "restless and land-hungry",
        Strategy::Consolidate => "inward-looking and orderly",
        Strategy::Trade => "open-handed with strangers",
        Strategy::Militarize => "wary, with watchers on every ridge",
        Strategy::Spiritual => "given to long rites and quiet",
    };
    let craft = ["stoneworkers", "weavers", "bone-carvers"][(h % 3) as usize];
    format!(
        "A tribe of {} souls, {mood}; known as patient {craft}.",
        faction.population
    )
}

/// Stable cache keys for the description service.
#[must_use]
pub fn creature_key(id: u64) -> String {
    format!("creature:{id}")
}

#[must_use]
pub fn species_key(id: &str) -> String {
    format!("species:{id}")
}

#[must_use]
pub fn civ_key(id: u32) -> String {
    format!("civ:{id}")
}

fn mix(a: u32, b: u32) -> u32 {
    let mut x = a ^ b.rotate_left(11);
    x = x.wrapping_mul(0x45D9_F3B);
    x ^= x >> 16;
    x.wrapping_mul(0x45D9_F3B)
}

#[cfg(test)]
mod tests {
    use super::*;
    use biotica_data::Genome;

    fn creature(id: u64) -> Creature {
        Creature {
            id,
            species_id: "sp-1-0".into(),
            name: format!("c-{id}"),
            energy: 50.0,
            health: 100.0,
            hydration: 50.0,
            water_need: 0.3,
            age: 10,
            max_age: 1000,
            x: 0,
            y: 0,
            generation: 2,
            parent_ids: Vec::new(),
            genome: Genome::baseline(),
            temp_stress: 0.0,
            humidity_stress: 0.0,
            description: None,
        }
    }

    #[test]
    fn fallbacks_are_pure_functions() {
        let c = creature(42);
        assert_eq!(
            creature_description(&c, None, 7),
            creature_description(&c, None, 7)
        );
        assert_ne!(
            creature_description(&creature(1), None, 7),
            creature_description(&creature(2), None, 7)
        );
    }

    #[test]
    fn cache_keys_are_stable() {
        assert_eq!(creature_key(9), "creature:9");
        assert_eq!(species_key("sp-1-2"), "species:sp-1-2");
        assert_eq!(civ_key(3), "civ:3");
    }
}
