//! Species registry: centroid-based assignment with drift and speciation.
//!
//! Species are append-only. Assignment computes a weighted L1 distance over
//! normalized genome fields against every centroid; within the threshold the
//! creature joins the nearest species and drags its centroid by an
//! exponential moving average, beyond it a new species is founded with the
//! nearest as parent.

use crate::rng::KernelRng;
use biotica_data::{
    genome, Biome, DietType, Genome, HabitatHint, SizeClass, SpeciesRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Calibration constant. Tunable in principle, fixed by default; tests pin it.
pub const SPECIATION_THRESHOLD: f32 = 1.55;
/// Fixed penalty added when diets differ.
pub const DIET_MISMATCH_PENALTY: f32 = 0.75;
/// Spontaneous diet flips only ever exchange Herbivore and Omnivore.
const DIET_FLIP_BASE: f32 = 0.03;
const DIET_FLIP_RATE_SCALE: f32 = 0.2;
/// Mutation step, as a fraction of a field's span per unit rate.
const MUTATION_SPAN_SCALE: f32 = 0.35;

struct FieldWeight {
    weight: f32,
    get: fn(&Genome) -> f32,
    span: f32,
}

/// Per-field weights of the genetic distance. Calibration constants; the
/// ordering here is the canonical field order of the schema.
fn field_weights() -> [FieldWeight; 13] {
    [
        FieldWeight { weight: 1.0, get: |g| g.metabolism_rate, span: genome::METABOLISM_RATE.span() },
        FieldWeight { weight: 0.6, get: |g| g.move_cost, span: genome::MOVE_COST.span() },
        FieldWeight { weight: 1.2, get: |g| g.preferred_temp, span: genome::PREFERRED_TEMP.span() },
        FieldWeight { weight: 0.8, get: |g| g.temp_tolerance, span: genome::TEMP_TOLERANCE.span() },
        FieldWeight { weight: 1.0, get: |g| g.preferred_humidity, span: genome::PREFERRED_HUMIDITY.span() },
        FieldWeight { weight: 0.6, get: |g| g.humidity_tolerance, span: genome::HUMIDITY_TOLERANCE.span() },
        FieldWeight { weight: 1.0, get: |g| g.aggression, span: genome::AGGRESSION.span() },
        FieldWeight { weight: 0.6, get: |g| g.reproduction_threshold, span: genome::REPRODUCTION_THRESHOLD.span() },
        FieldWeight { weight: 0.5, get: |g| g.reproduction_cost, span: genome::REPRODUCTION_COST.span() },
        FieldWeight { weight: 0.7, get: |g| f32::from(g.perception_radius), span: f32::from(genome::PERCEPTION_MAX - genome::PERCEPTION_MIN) },
        FieldWeight { weight: 0.8, get: |g| g.efficiency, span: genome::EFFICIENCY.span() },
        FieldWeight { weight: 1.0, get: |g| g.max_energy, span: genome::MAX_ENERGY.span() },
        FieldWeight { weight: 0.7, get: |g| g.max_age as f32, span: (genome::MAX_AGE_MAX - genome::MAX_AGE_MIN) as f32 },
    ]
}

/// Weighted L1 over normalized fields, plus a fixed diet-mismatch penalty.
#[must_use]
pub fn genetic_distance(a: &Genome, b: &Genome) -> f32 {
    let mut dist = 0.0;
    for fw in field_weights() {
        dist += fw.weight * ((fw.get)(a) - (fw.get)(b)).abs() / fw.span;
    }
    if a.diet != b.diet {
        dist += DIET_MISMATCH_PENALTY;
    }
    dist
}

/// Perturb each continuous field by a pseudo-gaussian step scaled by `rate`;
/// integer fields are rounded. The diet may flip between Herbivore and
/// Omnivore; Predator transitions are controlled elsewhere and never
/// spontaneous.
#[must_use]
pub fn mutate(base: &Genome, rng: &mut KernelRng, rate: f32) -> Genome {
    let mut g = base.clone();
    let step = |rng: &mut KernelRng, span: f32| rng.next_gaussish() * rate * span * MUTATION_SPAN_SCALE;

    g.metabolism_rate += step(rng, genome::METABOLISM_RATE.span());
    g.move_cost += step(rng, genome::MOVE_COST.span());
    g.preferred_temp += step(rng, genome::PREFERRED_TEMP.span());
    g.temp_tolerance += step(rng, genome::TEMP_TOLERANCE.span());
    g.preferred_humidity += step(rng, genome::PREFERRED_HUMIDITY.span());
    g.humidity_tolerance += step(rng, genome::HUMIDITY_TOLERANCE.span());
    g.aggression += step(rng, genome::AGGRESSION.span());
    g.reproduction_threshold += step(rng, genome::REPRODUCTION_THRESHOLD.span());
    g.reproduction_cost += step(rng, genome::REPRODUCTION_COST.span());
    g.efficiency += step(rng, genome::EFFICIENCY.span());
    g.max_energy += step(rng, genome::MAX_ENERGY.span());

    let perception_delta = step(rng, f32::from(genome::PERCEPTION_MAX));
    g.perception_radius =
        (f32::from(g.perception_radius) + perception_delta).round().clamp(0.0, 255.0) as u8;
    let age_delta = step(rng, (genome::MAX_AGE_MAX - genome::MAX_AGE_MIN) as f32);
    g.max_age = (g.max_age as f32 + age_delta).round().max(0.0) as u32;

    if rng.chance(DIET_FLIP_BASE + rate * DIET_FLIP_RATE_SCALE) {
        g.diet = match g.diet {
            DietType::Herbivore => DietType::Omnivore,
            DietType::Omnivore => DietType::Herbivore,
            DietType::Predator => DietType::Predator,
        };
    }

    g.clamp();
    g
}

/// Midpoint blend of two parent genomes. Continuous fields average; integer
/// fields average-and-round; an unshared diet is drawn from either parent.
#[must_use]
pub fn blend(a: &Genome, b: &Genome, rng: &mut KernelRng) -> Genome {
    let mut g = Genome {
        metabolism_rate: (a.metabolism_rate + b.metabolism_rate) * 0.5,
        move_cost: (a.move_cost + b.move_cost) * 0.5,
        preferred_temp: (a.preferred_temp + b.preferred_temp) * 0.5,
        temp_tolerance: (a.temp_tolerance + b.temp_tolerance) * 0.5,
        preferred_humidity: (a.preferred_humidity + b.preferred_humidity) * 0.5,
        humidity_tolerance: (a.humidity_tolerance + b.humidity_tolerance) * 0.5,
        aggression: (a.aggression + b.aggression) * 0.5,
        reproduction_threshold: (a.reproduction_threshold + b.reproduction_threshold) * 0.5,
        reproduction_cost: (a.reproduction_cost + b.reproduction_cost) * 0.5,
        perception_radius: ((u16::from(a.perception_radius) + u16::from(b.perception_radius) + 1)
            / 2) as u8,
        diet: if a.diet == b.diet {
            a.diet
        } else if rng.chance(0.5) {
            a.diet
        } else {
            b.diet
        },
        efficiency: (a.efficiency + b.efficiency) * 0.5,
        max_energy: (a.max_energy + b.max_energy) * 0.5,
        max_age: (a.max_age + b.max_age) / 2,
    };
    g.clamp();
    g
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesRegistry {
    pub seed: u32,
    pub species: Vec<SpeciesRecord>,
    next_index: u32,
}

impl SpeciesRegistry {
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            species: Vec::new(),
            next_index: 0,
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SpeciesRecord> {
        self.species.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SpeciesRecord> {
        self.species.iter_mut().find(|s| s.id == id)
    }

    #[must_use]
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    pub fn restore_counter(&mut self, next_index: u32) {
        self.next_index = next_index;
    }

    /// Assign a genome to a species, creating one if nothing is close enough.
    /// Returns `(species_id, newly_created)`.
    pub fn assign_species(&mut self, g: &Genome, tick: u64) -> (String, bool) {
        let mut best: Option<(usize, f32)> = None;
        for (i, rec) in self.species.iter().enumerate() {
            let d = genetic_distance(g, &rec.centroid);
            let better = match best {
                None => true,
                Some((bi, bd)) => {
                    d < bd
                        || (d == bd
                            && (rec.created_tick, &rec.id)
                                < (self.species[bi].created_tick, &self.species[bi].id))
                }
            };
            if better {
                best = Some((i, d));
            }
        }

        if let Some((i, d)) = best {
            if d <= SPECIATION_THRESHOLD {
                let rec = &mut self.species[i];
                let alpha = 1.0 / (rec.centroid_samples + 1).max(18) as f32;
                ema_update(&mut rec.centroid, g, alpha);
                rec.centroid_samples += 1;
                return (rec.id.clone(), false);
            }
        }

        let parent = best.map(|(i, _)| self.species[i].id.clone());
        let id = self.create_species(g, tick, parent);
        (id, true)
    }

    /// Found a species from a genome. The registry invariant holds by
    /// construction: a non-null parent is already registered, and the
    /// lineage chain ends with the new id.
    pub fn create_species(&mut self, g: &Genome, tick: u64, parent: Option<String>) -> String {
        if let Some(p) = &parent {
            assert!(self.get(p).is_some(), "parent species {p} not registered");
        }
        let index = self.next_index;
        self.next_index += 1;
        let id = format!("sp-{}-{}", self.seed, index);

        let mut lineage_ids = parent
            .as_ref()
            .and_then(|p| self.get(p))
            .map(|p| p.lineage_ids.clone())
            .unwrap_or_default();
        lineage_ids.push(id.clone());

        let allowed_biomes = allowed_biomes_for(g);
        let habitat_hint = habitat_for(&allowed_biomes);
        let common_name = self.unique_common_name(index);

        self.species.push(SpeciesRecord {
            id: id.clone(),
            index,
            created_tick: tick,
            color: species_color(self.seed, index),
            centroid: g.clone(),
            centroid_samples: 1,
            allowed_biomes,
            habitat_hint,
            diet_kind: g.diet,
            size_class: size_class_for(g),
            common_name,
            parent_species_id: parent,
            lineage_ids,
            population: 0,
        });
        id
    }

    /// Seed the registry with starting archetypes for an empty world.
    pub fn ensure_base_species(&mut self, enable_predators: bool) -> Vec<String> {
        if !self.species.is_empty() {
            return Vec::new();
        }
        let mut ids = Vec::new();

        let mut grazer = Genome::baseline();
        grazer.preferred_humidity = 0.45;
        ids.push(self.create_species(&grazer, 0, None));

        let mut browser = Genome::baseline();
        browser.diet = DietType::Omnivore;
        browser.preferred_humidity = 0.7;
        browser.preferred_temp = 0.4;
        browser.efficiency = 0.55;
        browser.max_energy = 150.0;
        ids.push(self.create_species(&browser, 0, None));

        if enable_predators {
            let mut stalker = Genome::baseline();
            stalker.diet = DietType::Predator;
            stalker.aggression = 0.75;
            stalker.move_cost = 0.6;
            stalker.perception_radius = 5;
            stalker.max_energy = 180.0;
            stalker.metabolism_rate = 1.3;
            ids.push(self.create_species(&stalker, 0, None));
        }
        ids
    }

    /// Overwrite per-species populations with the census from the creature
    /// pass. Species absent from the census drop to zero but are never
    /// removed.
    pub fn set_population_counts(&mut self, counts: &BTreeMap<String, u32>) {
        for rec in &mut self.species {
            rec.population = counts.get(&rec.id).copied().unwrap_or(0);
        }
    }

    #[must_use]
    pub fn total_population(&self) -> u64 {
        self.species.iter().map(|s| u64::from(s.population)).sum()
    }

    fn unique_common_name(&self, index: u32) -> String {
        let base = common_name(self.seed, index);
        if !self.species.iter().any(|s| s.common_name == base) {
            return base;
        }
        // Deterministic collision handling: retry with a suffixed salt.
        for salt in 1..32u32 {
            let candidate = format!("{} {}", common_name(self.seed ^ salt.rotate_left(16), index), roman(salt + 1));
            if !self.species.iter().any(|s| s.common_name == candidate) {
                return candidate;
            }
        }
        format!("{base} {index}")
    }
}

fn ema_update(centroid: &mut Genome, sample: &Genome, alpha: f32) {
    centroid.metabolism_rate += alpha * (sample.metabolism_rate - centroid.metabolism_rate);
    centroid.move_cost += alpha * (sample.move_cost - centroid.move_cost);
    centroid.preferred_temp += alpha * (sample.preferred_temp - centroid.preferred_temp);
    centroid.temp_tolerance += alpha * (sample.temp_tolerance - centroid.temp_tolerance);
    centroid.preferred_humidity += alpha * (sample.preferred_humidity - centroid.preferred_humidity);
    centroid.humidity_tolerance +=
        alpha * (sample.humidity_tolerance - centroid.humidity_tolerance);
    centroid.aggression += alpha * (sample.aggression - centroid.aggression);
    centroid.reproduction_threshold +=
        alpha * (sample.reproduction_threshold - centroid.reproduction_threshold);
    centroid.reproduction_cost += alpha * (sample.reproduction_cost - centroid.reproduction_cost);
    centroid.efficiency += alpha * (sample.efficiency - centroid.efficiency);
    centroid.max_energy += alpha * (sample.max_energy - centroid.max_energy);
    centroid.perception_radius = ((1.0 - alpha) * f32::from(centroid.perception_radius)
        + alpha * f32::from(sample.perception_radius))
    .round() as u8;
    centroid.max_age = ((1.0 - alpha) * centroid.max_age as f32 + alpha * sample.max_age as f32)
        .round() as u32;
    centroid.clamp();
}

/// Candidate land biomes with climate archetypes `(temp, humidity)`.
const BIOME_CLIMATE: [(Biome, f32, f32); 9] = [
    (Biome::Beach, 0.6, 0.5),
    (Biome::Grassland, 0.5, 0.45),
    (Biome::Forest, 0.42, 0.6),
    (Biome::Jungle, 0.75, 0.85),
    (Biome::Desert, 0.85, 0.1),
    (Biome::Savanna, 0.75, 0.35),
    (Biome::Swamp, 0.5, 0.9),
    (Biome::Hills, 0.4, 0.4),
    (Biome::Mountain, 0.25, 0.35),
];

fn allowed_biomes_for(g: &Genome) -> Vec<Biome> {
    let mut out: Vec<Biome> = BIOME_CLIMATE
        .iter()
        .filter(|(_, t, h)| {
            (t - g.preferred_temp).abs() <= g.temp_tolerance + 0.22
                && (h - g.preferred_humidity).abs() <= g.humidity_tolerance + 0.28
        })
        .map(|(b, _, _)| *b)
        .collect();
    if out.is_empty() {
        out.push(Biome::Grassland);
    }
    out.sort_by_key(|b| *b as u8);
    out
}

fn habitat_for(biomes: &[Biome]) -> HabitatHint {
    let first = biomes.first().copied().unwrap_or(Biome::Grassland);
    match first {
        Biome::Beach => HabitatHint::Shoreline,
        Biome::Forest | Biome::Jungle => HabitatHint::Woodland,
        Biome::Swamp => HabitatHint::Wetland,
        Biome::Desert | Biome::Savanna => HabitatHint::Arid,
        Biome::Hills | Biome::Mountain => HabitatHint::Highland,
        _ => HabitatHint::Plains,
    }
}

fn size_class_for(g: &Genome) -> SizeClass {
    if g.max_energy < 110.0 {
        SizeClass::Small
    } else if g.max_energy < 170.0 {
        SizeClass::Medium
    } else {
        SizeClass::Large
    }
}

fn species_color(seed: u32, index: u32) -> [u8; 3] {
    let h = mix(seed, index);
    // Keep channels out of the mud: floor each at 64.
    [
        64 + (h & 0xBF) as u8,
        64 + ((h >> 8) & 0xBF) as u8,
        64 + ((h >> 16) & 0xBF) as u8,
    ]
}

const NAME_PREFIX: [&str; 12] = [
    "Ash", "Brook", "Cinder", "Dusk", "Fen", "Gale", "Moss", "Reed", "Shale", "Thorn", "Vale",
    "Wold",
];
const NAME_STEM: [&str; 10] = [
    "back", "claw", "fang", "horn", "hide", "mane", "pelt", "tail", "wing", "snout",
];
const NAME_EPITHET: [&str; 8] = [
    "Strider", "Grazer", "Stalker", "Burrower", "Drifter", "Forager", "Warden", "Skulker",
];

fn common_name(seed: u32, index: u32) -> String {
    let h = mix(seed, index.wrapping_mul(0x85EB_CA6B));
    let p = NAME_PREFIX[(h % 12) as usize];
    let s = NAME_STEM[((h >> 8) % 10) as usize];
    let e = NAME_EPITHET[((h >> 16) % 8) as usize];
    format!("{p}{s} {e}")
}

fn roman(n: u32) -> String {
    const PAIRS: [(u32, &str); 7] = [
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut n = n;
    let mut out = String::new();
    for (v, s) in PAIRS {
        while n >= v {
            out.push_str(s);
            n -= v;
        }
    }
    out
}

fn mix(a: u32, b: u32) -> u32 {
    let mut x = a ^ b.rotate_left(13);
    x = x.wrapping_mul(0x45D9_F3B);
    x ^= x >> 16;
    x = x.wrapping_mul(0x45D9_F3B);
    x ^ (x >> 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_zero_for_identical_genomes() {
        let g = Genome::baseline();
        assert_eq!(genetic_distance(&g, &g), 0.0);
    }

    #[test]
    fn diet_mismatch_adds_fixed_penalty() {
        let a = Genome::baseline();
        let mut b = a.clone();
        b.diet = DietType::Omnivore;
        assert_eq!(genetic_distance(&a, &b), DIET_MISMATCH_PENALTY);
    }

    #[test]
    fn close_genome_joins_existing_species() {
        let mut reg = SpeciesRegistry::new(777);
        let g = Genome::baseline();
        let id0 = reg.create_species(&g, 0, None);
        let mut near = g.clone();
        near.aggression += 0.05;
        let (assigned, created) = reg.assign_species(&near, 5);
        assert_eq!(assigned, id0);
        assert!(!created);
        assert_eq!(reg.get(&id0).unwrap().centroid_samples, 2);
    }

    #[test]
    fn distant_genome_founds_child_species() {
        let mut reg = SpeciesRegistry::new(777);
        let g = Genome::baseline();
        let id0 = reg.create_species(&g, 0, None);
        let mut far = g.clone();
        far.diet = DietType::Omnivore;
        far.preferred_temp = 1.0;
        far.max_energy = 240.0;
        far.aggression = 1.0;
        far.metabolism_rate = 2.5;
        far.efficiency = 0.95;
        far.max_age = 4000;
        assert!(genetic_distance(&far, &g) > SPECIATION_THRESHOLD);
        let (id1, created) = reg.assign_species(&far, 9);
        assert!(created);
        assert_ne!(id1, id0);
        let rec = reg.get(&id1).unwrap();
        assert_eq!(rec.parent_species_id.as_deref(), Some(id0.as_str()));
        assert_eq!(rec.lineage_ids, vec![id0.clone(), id1.clone()]);
        assert_eq!(rec.created_tick, 9);
    }

    #[test]
    fn mutation_respects_bounds() {
        let mut rng = KernelRng::new(99);
        let base = Genome::baseline();
        for _ in 0..500 {
            let m = mutate(&base, &mut rng, 1.0);
            assert!(m.in_bounds());
        }
    }

    #[test]
    fn mutation_never_produces_spontaneous_predators() {
        let mut rng = KernelRng::new(3);
        let base = Genome::baseline();
        for _ in 0..2000 {
            assert_ne!(mutate(&base, &mut rng, 1.0).diet, DietType::Predator);
        }
    }

    #[test]
    fn common_names_are_unique() {
        let mut reg = SpeciesRegistry::new(5);
        for i in 0..40 {
            let mut g = Genome::baseline();
            g.preferred_temp = (i as f32 / 40.0).min(1.0);
            reg.create_species(&g, 0, None);
        }
        let mut names: Vec<_> = reg.species.iter().map(|s| s.common_name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), reg.species.len());
    }

    #[test]
    fn base_species_seed_once() {
        let mut reg = SpeciesRegistry::new(1);
        let first = reg.ensure_base_species(true);
        assert_eq!(first.len(), 3);
        assert!(reg.ensure_base_species(true).is_empty());
    }
}
