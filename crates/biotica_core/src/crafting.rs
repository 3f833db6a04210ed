//! Immutable item catalog plus faction-local recipe evolution.
//!
//! The catalog's item set and base properties are frozen per seed at world
//! creation. The recipe table derives deterministically from the catalog;
//! input compositions may drift over a run, result ids never change and are
//! always catalog members.

use crate::rng::KernelRng;
use biotica_data::{Biome, ItemCategory, ItemDef, Recipe};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const EFFICIENCY_MIN: f32 = 0.5;
pub const EFFICIENCY_MAX: f32 = 2.0;
const EFFICIENCY_DRIFT: f32 = 0.01;
const INPUT_MUTATION_CHANCE: f32 = 0.0005;
const BONUS_QUANTITY_SCALE: f32 = 0.15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub seed: u32,
    pub items: Vec<ItemDef>,
}

impl ItemCatalog {
    /// Frozen per seed. Item ids are the stable vocabulary of the crafting
    /// system; the seed perturbs base properties, never the id set.
    #[must_use]
    pub fn generate(seed: u32) -> Self {
        let mut rng = KernelRng::stream(seed, crate::rng::STREAM_CATALOG);
        let mut jitter = |base: f32, spread: f32| base + (rng.next_float() - 0.5) * spread;

        let all_land = vec![
            Biome::Beach,
            Biome::Grassland,
            Biome::Forest,
            Biome::Jungle,
            Biome::Desert,
            Biome::Savanna,
            Biome::Swamp,
            Biome::Hills,
        ];
        let woodland = vec![Biome::Forest, Biome::Jungle, Biome::Swamp];
        let rocky = vec![Biome::Hills, Biome::Mountain, Biome::Rock, Biome::Scorched];

        let mut items = Vec::new();
        let material = |id: &str, name: &str, weight: f32, spawn: bool, biomes: Vec<Biome>| {
            ItemDef {
                id: id.into(),
                name: name.into(),
                category: ItemCategory::Material,
                weight,
                nutrition: None,
                durability: None,
                damage: None,
                build_value: None,
                storage: None,
                natural_spawn: spawn,
                allowed_biomes: biomes,
            }
        };

        items.push(material("stone", "Stone", jitter(2.0, 0.4), true, rocky.clone()));
        items.push(material("branch", "Branch", jitter(1.0, 0.2), true, woodland.clone()));
        items.push(material("fiber", "Plant Fiber", jitter(0.2, 0.1), true, all_land.clone()));
        items.push(material("clay", "Clay", jitter(1.5, 0.3), true, vec![Biome::Swamp, Biome::Beach]));
        items.push(material("ore", "Raw Ore", jitter(3.0, 0.6), true, rocky.clone()));
        items.push(material("hide", "Hide", jitter(1.2, 0.3), false, Vec::new()));
        items.push(material("bone", "Bone", jitter(0.8, 0.2), false, Vec::new()));

        items.push(ItemDef {
            id: "berry".into(),
            name: "Berries".into(),
            category: ItemCategory::Food,
            weight: 0.1,
            nutrition: Some(jitter(8.0, 3.0)),
            durability: None,
            damage: None,
            build_value: None,
            storage: None,
            natural_spawn: true,
            allowed_biomes: vec![Biome::Grassland, Biome::Forest, Biome::Jungle],
        });
        items.push(ItemDef {
            id: "meat".into(),
            name: "Meat".into(),
            category: ItemCategory::Food,
            weight: 1.0,
            nutrition: Some(jitter(22.0, 6.0)),
            durability: None,
            damage: None,
            build_value: None,
            storage: None,
            natural_spawn: false,
            allowed_biomes: Vec::new(),
        });

        let tool = |id: &str, name: &str, weight: f32, durability: f32, damage: Option<f32>| {
            ItemDef {
                id: id.into(),
                name: name.into(),
                category: if damage.is_some() {
                    ItemCategory::Weapon
                } else {
                    ItemCategory::Tool
                },
                weight,
                nutrition: None,
                durability: Some(durability as u16),
                damage,
                build_value: None,
                storage: None,
                natural_spawn: false,
                allowed_biomes: Vec::new(),
            }
        };
        items.push(tool("stone-knife", "Stone Knife", 0.5, jitter(60.0, 20.0), None));
        items.push(tool("stone-axe", "Stone Axe", 1.5, jitter(80.0, 20.0), None));
        items.push(tool("spear", "Spear", 1.2, jitter(50.0, 16.0), Some(jitter(6.0, 2.0))));
        items.push(tool("bone-needle", "Bone Needle", 0.1, jitter(30.0, 10.0), None));

        items.push(ItemDef {
            id: "basket".into(),
            name: "Woven Basket".into(),
            category: ItemCategory::Tool,
            weight: 0.6,
            nutrition: None,
            durability: Some(jitter(40.0, 12.0) as u16),
            damage: None,
            build_value: None,
            storage: Some(8),
            natural_spawn: false,
            allowed_biomes: Vec::new(),
        });
        items.push(ItemDef {
            id: "clay-pot".into(),
            name: "Clay Pot".into(),
            category: ItemCategory::Tool,
            weight: 1.0,
            nutrition: None,
            durability: Some(jitter(30.0, 10.0) as u16),
            damage: None,
            build_value: None,
            storage: Some(6),
            natural_spawn: false,
            allowed_biomes: Vec::new(),
        });
        items.push(ItemDef {
            id: "timber".into(),
            name: "Worked Timber".into(),
            category: ItemCategory::Building,
            weight: 3.0,
            nutrition: None,
            durability: None,
            damage: None,
            build_value: Some(jitter(4.0, 1.0)),
            storage: None,
            natural_spawn: false,
            allowed_biomes: Vec::new(),
        });
        items.push(ItemDef {
            id: "totem".into(),
            name: "Carved Totem".into(),
            category: ItemCategory::Ritual,
            weight: 2.0,
            nutrition: None,
            durability: None,
            damage: None,
            build_value: Some(jitter(2.0, 0.5)),
            storage: None,
            natural_spawn: false,
            allowed_biomes: Vec::new(),
        });

        Self { seed, items }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ItemDef> {
        self.items.iter().find(|i| i.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Materials eligible as mutated recipe inputs.
    fn material_ids(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| i.category == ItemCategory::Material)
            .map(|i| i.id.as_str())
            .collect()
    }
}

/// Base recipe table for a catalog. Every result id exists in the catalog by
/// construction; `debug_assert`ed because a violation is a bug, not input.
#[must_use]
pub fn derive_recipes(catalog: &ItemCatalog) -> Vec<Recipe> {
    let recipes = vec![
        Recipe {
            id: "recipe-stone-knife".into(),
            inputs: vec!["stone".into(), "branch".into()],
            result: "stone-knife".into(),
            tech_required: 1,
        },
        Recipe {
            id: "recipe-stone-axe".into(),
            inputs: vec!["stone".into(), "branch".into(), "fiber".into()],
            result: "stone-axe".into(),
            tech_required: 1,
        },
        Recipe {
            id: "recipe-spear".into(),
            inputs: vec!["branch".into(), "stone-knife".into()],
            result: "spear".into(),
            tech_required: 2,
        },
        Recipe {
            id: "recipe-basket".into(),
            inputs: vec!["fiber".into(), "fiber".into()],
            result: "basket".into(),
            tech_required: 1,
        },
        Recipe {
            id: "recipe-clay-pot".into(),
            inputs: vec!["clay".into(), "fiber".into()],
            result: "clay-pot".into(),
            tech_required: 2,
        },
        Recipe {
            id: "recipe-bone-needle".into(),
            inputs: vec!["bone".into(), "stone".into()],
            result: "bone-needle".into(),
            tech_required: 2,
        },
        Recipe {
            id: "recipe-timber".into(),
            inputs: vec!["branch".into(), "stone-axe".into()],
            result: "timber".into(),
            tech_required: 3,
        },
        Recipe {
            id: "recipe-totem".into(),
            inputs: vec!["timber".into(), "stone-knife".into()],
            result: "totem".into(),
            tech_required: 3,
        },
    ];
    debug_assert!(recipes.iter().all(|r| catalog.contains(&r.result)));
    recipes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftFailure {
    NoUnlockedRecipe,
    InsufficientItems,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftOutcome {
    pub crafted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<CraftFailure>,
}

impl CraftOutcome {
    fn failure(reason: CraftFailure) -> Self {
        Self {
            crafted: false,
            recipe_id: None,
            item_id: None,
            quantity: 0,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionCraftState {
    /// Recipe id → tick it was unlocked.
    pub unlocked: BTreeMap<String, u64>,
    /// Bounded drift-adjusted efficiency per recipe.
    pub efficiency: BTreeMap<String, f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftingEvolution {
    pub recipes: Vec<Recipe>,
    pub factions: BTreeMap<u32, FactionCraftState>,
}

impl CraftingEvolution {
    #[must_use]
    pub fn new(catalog: &ItemCatalog) -> Self {
        Self {
            recipes: derive_recipes(catalog),
            factions: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// Unlock tech-gated recipes and drift efficiencies for one faction.
    /// Occasionally a recipe's input composition mutates; its result never
    /// does.
    pub fn step_faction(
        &mut self,
        catalog: &ItemCatalog,
        faction_id: u32,
        tech_level: u8,
        rng: &mut KernelRng,
        tick: u64,
    ) {
        let state = self.factions.entry(faction_id).or_default();
        for recipe in &self.recipes {
            if recipe.tech_required <= tech_level && !state.unlocked.contains_key(&recipe.id) {
                state.unlocked.insert(recipe.id.clone(), tick);
                state.efficiency.insert(recipe.id.clone(), 1.0);
            }
        }
        for eff in state.efficiency.values_mut() {
            *eff = (*eff + rng.next_gaussish() * EFFICIENCY_DRIFT + EFFICIENCY_DRIFT * 0.5)
                .clamp(EFFICIENCY_MIN, EFFICIENCY_MAX);
        }

        if rng.chance(INPUT_MUTATION_CHANCE) && !self.recipes.is_empty() {
            let ri = rng.next_int(self.recipes.len() as u32) as usize;
            let materials = catalog.material_ids();
            if !materials.is_empty() && !self.recipes[ri].inputs.is_empty() {
                let slot = rng.next_int(self.recipes[ri].inputs.len() as u32) as usize;
                let replacement = materials[rng.next_int(materials.len() as u32) as usize];
                self.recipes[ri].inputs[slot] = replacement.to_string();
            }
        }
    }

    /// Pick an affordable unlocked recipe (weighted by efficiency), consume
    /// exactly one unit of each input, and produce the result with quantity
    /// ≥ 1. Failure is an outcome, never an error.
    pub fn attempt_craft(
        &self,
        faction_id: u32,
        inventory: &mut BTreeMap<String, u32>,
        rng: &mut KernelRng,
    ) -> CraftOutcome {
        let Some(state) = self.factions.get(&faction_id) else {
            return CraftOutcome::failure(CraftFailure::NoUnlockedRecipe);
        };
        if state.unlocked.is_empty() {
            return CraftOutcome::failure(CraftFailure::NoUnlockedRecipe);
        }

        // BTreeMap order keeps the candidate list deterministic.
        let mut candidates: Vec<(&Recipe, f32)> = Vec::new();
        for recipe_id in state.unlocked.keys() {
            let Some(recipe) = self.recipe(recipe_id) else {
                continue;
            };
            if can_afford(recipe, inventory) {
                let eff = state.efficiency.get(recipe_id).copied().unwrap_or(1.0);
                candidates.push((recipe, eff));
            }
        }
        if candidates.is_empty() {
            return CraftOutcome::failure(CraftFailure::InsufficientItems);
        }

        let total: f32 = candidates.iter().map(|(_, w)| w).sum();
        let mut pick = rng.next_float() * total;
        let mut chosen = candidates[candidates.len() - 1].0;
        let mut chosen_eff = candidates[candidates.len() - 1].1;
        for (recipe, weight) in &candidates {
            if pick < *weight {
                chosen = recipe;
                chosen_eff = *weight;
                break;
            }
            pick -= weight;
        }

        for input in &chosen.inputs {
            let slot = inventory.get_mut(input).expect("afford check");
            *slot -= 1;
        }
        inventory.retain(|_, n| *n > 0);

        let bonus = rng.chance((chosen_eff - 1.0).max(0.0) * BONUS_QUANTITY_SCALE);
        let quantity = if bonus { 2 } else { 1 };
        *inventory.entry(chosen.result.clone()).or_insert(0) += quantity;

        CraftOutcome {
            crafted: true,
            recipe_id: Some(chosen.id.clone()),
            item_id: Some(chosen.result.clone()),
            quantity,
            reason: None,
        }
    }
}

fn can_afford(recipe: &Recipe, inventory: &BTreeMap<String, u32>) -> bool {
    let mut needed: BTreeMap<&str, u32> = BTreeMap::new();
    for input in &recipe.inputs {
        *needed.entry(input.as_str()).or_insert(0) += 1;
    }
    needed
        .iter()
        .all(|(id, n)| inventory.get(*id).copied().unwrap_or(0) >= *n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::STREAM_CIV;

    #[test]
    fn catalog_is_frozen_per_seed() {
        let a = ItemCatalog::generate(9001);
        let b = ItemCatalog::generate(9001);
        assert_eq!(a.items, b.items);
        let c = ItemCatalog::generate(9002);
        // Same vocabulary, different base properties.
        let ids = |cat: &ItemCatalog| cat.items.iter().map(|i| i.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&c));
        assert_ne!(a.items, c.items);
    }

    #[test]
    fn recipe_results_always_exist_in_catalog() {
        let catalog = ItemCatalog::generate(9001);
        for r in derive_recipes(&catalog) {
            assert!(catalog.contains(&r.result), "{} missing", r.result);
        }
    }

    #[test]
    fn stone_knife_crafts_once_from_minimal_inventory() {
        let catalog = ItemCatalog::generate(9001);
        let mut crafting = CraftingEvolution::new(&catalog);
        let mut rng = KernelRng::stream(9001, STREAM_CIV);
        crafting.step_faction(&catalog, 1, 1, &mut rng, 0);

        let mut inventory: BTreeMap<String, u32> =
            [("stone".to_string(), 1), ("branch".to_string(), 1)].into();
        let outcome = crafting.attempt_craft(1, &mut inventory, &mut rng);
        assert!(outcome.crafted);
        assert_eq!(outcome.item_id.as_deref(), Some("stone-knife"));
        assert!(outcome.quantity == 1 || outcome.quantity == 2);
        assert_eq!(inventory.get("stone"), None);
        assert_eq!(inventory.get("branch"), None);
        assert!(inventory.get("stone-knife").copied().unwrap_or(0) >= 1);

        let second = crafting.attempt_craft(1, &mut inventory, &mut rng);
        assert!(!second.crafted);
        assert_eq!(second.reason, Some(CraftFailure::InsufficientItems));
    }

    #[test]
    fn locked_faction_cannot_craft() {
        let catalog = ItemCatalog::generate(1);
        let crafting = CraftingEvolution::new(&catalog);
        let mut rng = KernelRng::new(1);
        let mut inventory: BTreeMap<String, u32> = [("stone".to_string(), 5)].into();
        let outcome = crafting.attempt_craft(7, &mut inventory, &mut rng);
        assert_eq!(outcome.reason, Some(CraftFailure::NoUnlockedRecipe));
        assert_eq!(inventory.get("stone"), Some(&5));
    }

    #[test]
    fn input_mutation_never_touches_results() {
        let catalog = ItemCatalog::generate(5);
        let mut crafting = CraftingEvolution::new(&catalog);
        let results_before: Vec<String> =
            crafting.recipes.iter().map(|r| r.result.clone()).collect();
        let mut rng = KernelRng::new(5);
        for tick in 0..20_000 {
            crafting.step_faction(&catalog, 1, 3, &mut rng, tick);
        }
        let results_after: Vec<String> =
            crafting.recipes.iter().map(|r| r.result.clone()).collect();
        assert_eq!(results_before, results_after);
        for r in &crafting.recipes {
            for input in &r.inputs {
                assert!(catalog.contains(input), "mutated input {input} not in catalog");
            }
        }
    }

    #[test]
    fn efficiency_stays_bounded() {
        let catalog = ItemCatalog::generate(2);
        let mut crafting = CraftingEvolution::new(&catalog);
        let mut rng = KernelRng::new(2);
        for tick in 0..50_000 {
            crafting.step_faction(&catalog, 1, 3, &mut rng, tick);
        }
        let state = &crafting.factions[&1];
        for eff in state.efficiency.values() {
            assert!((EFFICIENCY_MIN..=EFFICIENCY_MAX).contains(eff));
        }
    }
}
