//! Civilization-level invariants over full kernel runs: territory
//! arithmetic, referential integrity, and founding behavior.

mod common;
use biotica_data::LogCategory;
use common::SimBuilder;

fn run_until_factions(mut sim: biotica_core::Simulation, max_ticks: u64) -> biotica_core::Simulation {
    for _ in 0..max_ticks {
        sim.step();
        if !sim.civ.factions.is_empty() {
            return sim;
        }
    }
    sim
}

#[test]
fn territory_claims_match_owner_map_census() {
    let sim = SimBuilder::new().seed(900).size(64, 48).creatures(220).build();
    let mut sim = run_until_factions(sim, 4000);
    if sim.civ.factions.is_empty() {
        // Founding is population-dependent; give the run a little longer
        // before concluding anything.
        sim.run_ticks(2000);
    }
    assert!(!sim.civ.factions.is_empty(), "no faction ever founded");
    sim.run_ticks(500);

    for f in &sim.civ.factions {
        let owned = sim
            .civ
            .territory
            .owner
            .iter()
            .filter(|&&o| u32::from(o) == f.id)
            .count() as u32;
        assert_eq!(f.claimed_tiles, owned, "faction {} claim census", f.id);
    }
}

#[test]
fn agents_structures_and_notes_stay_consistent() {
    let sim = SimBuilder::new().seed(901).size(64, 48).creatures(220).build();
    let mut sim = run_until_factions(sim, 5000);
    sim.run_ticks(1500);

    for a in &sim.civ.agents {
        assert!(sim.civ.faction(a.faction_id).is_some(), "orphan agent {}", a.id);
        assert!(a.x < sim.world.width && a.y < sim.world.height);
    }
    for s in &sim.civ.structures {
        assert!(sim.civ.faction(s.faction_id).is_some(), "orphan structure {}", s.id);
        assert!(s.x < sim.world.width && s.y < sim.world.height);
        assert!((0.0..=1.0).contains(&s.progress));
        assert_eq!(s.completed, s.progress >= 1.0);
    }
    for n in &sim.civ.notes {
        assert!(n.x < sim.world.width && n.y < sim.world.height);
        assert!(!n.tokens.is_empty());
        // Translation is external and best-effort; the kernel never fills it.
        assert!(n.translation.is_none());
    }
}

#[test]
fn founding_is_logged_with_the_species() {
    let sim = SimBuilder::new().seed(902).size(64, 48).creatures(220).build();
    let sim = run_until_factions(sim, 6000);
    if sim.civ.factions.is_empty() {
        return; // This seed never awakened in the window; covered elsewhere.
    }
    let entry = sim
        .log
        .iter()
        .find(|e| e.category == LogCategory::CivFounding)
        .expect("founding log entry");
    let species = entry
        .payload
        .as_ref()
        .and_then(|p| p.get("species"))
        .and_then(|s| s.as_str())
        .expect("species payload");
    assert!(sim.registry.get(species).is_some());
}

#[test]
fn faction_population_matches_member_count() {
    let sim = SimBuilder::new().seed(903).size(64, 48).creatures(220).build();
    let mut sim = run_until_factions(sim, 5000);
    sim.run_ticks(800);
    for f in &sim.civ.factions {
        let members = sim
            .civ
            .agents
            .iter()
            .filter(|a| a.faction_id == f.id)
            .count() as u32;
        assert_eq!(f.population, members, "faction {}", f.id);
    }
}

#[test]
fn relations_cover_every_live_pair_once_diplomacy_runs() {
    let sim = SimBuilder::new().seed(904).size(64, 48).creatures(240).build();
    let mut sim = run_until_factions(sim, 6000);
    sim.run_ticks(3000);
    let n = sim.civ.factions.len();
    if n >= 2 {
        assert_eq!(sim.civ.relations.len(), n * (n - 1));
    }
}
