//! Per-agent update: perception, intent selection from the closed set,
//! single-tile movement, inventory work, stress, utterances, and wartime
//! skirmishes. Iteration is in stable id order over the agents as of the
//! start of the tick; damage to other agents is buffered and applied after
//! the loop.

use super::diplomacy::relation_between_mut;
use super::language::Lexicon;
use crate::crafting::{CraftingEvolution, ItemCatalog};
use crate::log::{EventLog, LogEvent};
use crate::rng::KernelRng;
use crate::world::WorldState;
use biotica_data::{
    Agent, AgentIntent, AgentRole, Biome, Faction, LogCategory, Note, Relation, RelationStatus,
    Severity, Structure, StructureKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const AGENT_PERCEPTION_RADIUS: u16 = 4;
pub const THOUGHT_BUFFER_CAP: usize = 6;
pub const REASON_CODES_CAP: usize = 4;
const REPLAN_PERIOD: u16 = 8;
const AGENT_MAX_AGE: u32 = 6000;
const EAT_ENERGY: f32 = 25.0;
const SKIRMISH_DAMAGE: f32 = 18.0;
const PALISADE_DEFENSE: f32 = 0.6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct AgentView {
    id: u64,
    faction_id: u32,
    x: u16,
    y: u16,
    energy: f32,
    role: AgentRole,
}

pub struct AgentPhaseCtx<'a> {
    pub world: &'a mut WorldState,
    pub factions: &'a [Faction],
    pub structures: &'a mut Vec<Structure>,
    pub relations: &'a mut Vec<Relation>,
    pub lexicons: &'a BTreeMap<u32, Lexicon>,
    pub notes: &'a mut Vec<Note>,
    pub crafting: &'a mut CraftingEvolution,
    pub catalog: &'a ItemCatalog,
    pub log: &'a mut EventLog,
    pub tick: u64,
    pub rng: &'a mut KernelRng,
    pub next_structure_id: &'a mut u64,
    pub next_note_id: &'a mut u64,
}

/// Run the agent phase. Returns ids of agents that died this tick.
pub fn step_agents(agents: &mut Vec<Agent>, ctx: &mut AgentPhaseCtx<'_>) -> Vec<u64> {
    let views: Vec<AgentView> = agents
        .iter()
        .map(|a| AgentView {
            id: a.id,
            faction_id: a.faction_id,
            x: a.x,
            y: a.y,
            energy: a.energy,
            role: a.role,
        })
        .collect();
    let mut damage: Vec<(u64, f32)> = Vec::new();

    for i in 0..agents.len() {
        perceive(&mut agents[i], ctx, &views);

        let urgent = agents[i].mind.perceived_threat_level > 0.6
            || agents[i].energy < 25.0
            || agents[i].hydration < 20.0;
        if urgent || agents[i].activity_ticks >= REPLAN_PERIOD || agents[i].proposed_intent.is_some()
        {
            let proposed = agents[i].proposed_intent.take();
            let next = proposed.unwrap_or_else(|| choose_intent(&agents[i], ctx));
            if next != agents[i].intent {
                agents[i].intent = next;
                agents[i].activity_ticks = 0;
            }
        }

        execute_intent(agents, i, ctx, &views);
        skirmish(agents, i, ctx, &views, &mut damage);
        upkeep(&mut agents[i], ctx);
        speak(&mut agents[i], ctx);
    }

    for (id, dmg) in damage {
        if let Some(a) = agents.iter_mut().find(|a| a.id == id) {
            a.energy -= dmg;
        }
    }

    let mut dead = Vec::new();
    agents.retain(|a| {
        let dies = a.energy <= 0.0 || a.age > AGENT_MAX_AGE;
        if dies {
            dead.push(a.id);
            LogEvent::new(
                ctx.tick,
                LogCategory::Deaths,
                format!("agent {} of faction {} perished", a.id, a.faction_id),
            )
            .at(a.x, a.y)
            .subject(format!("{}", a.id))
            .faction(a.faction_id)
            .payload(serde_json::json!({ "kind": "agent" }))
            .emit(ctx.log);
        }
        !dies
    });
    dead
}

fn perceive(agent: &mut Agent, ctx: &mut AgentPhaseCtx<'_>, views: &[AgentView]) {
    let world = &*ctx.world;
    let idx = world.index(agent.x, agent.y);
    let local_biomass = f32::from(world.plant_biomass[idx]) / 255.0;
    let hazard = f32::from(world.hazard[idx]) / 255.0;

    let enemy_near = views.iter().any(|v| {
        v.faction_id != agent.faction_id
            && chebyshev(v.x, v.y, agent.x, agent.y) <= AGENT_PERCEPTION_RADIUS
            && at_war(ctx.relations, agent.faction_id, v.faction_id)
    });

    let m = &mut agent.mind;
    let food_signal = (f32::from(agent.resources.food) / 10.0 + local_biomass).min(1.0);
    m.perceived_food_level = m.perceived_food_level * 0.8 + food_signal * 0.2;
    let threat = hazard.max(if enemy_near { 0.8 } else { 0.0 });
    m.perceived_threat_level = m.perceived_threat_level * 0.7 + threat * 0.3;
    m.stress_level = (m.stress_level * 0.95
        + (1.0 - m.perceived_food_level) * 0.03
        + m.perceived_threat_level * 0.05)
        .clamp(0.0, 1.0);
    m.loyalty_to_faction = (m.loyalty_to_faction + 0.0005 - m.stress_level * 0.001).clamp(0.0, 1.0);

    push_reason(m, if enemy_near { "threat:enemy" } else if hazard > 0.5 { "threat:hazard" } else { "calm" });
}

fn choose_intent(agent: &Agent, ctx: &AgentPhaseCtx<'_>) -> AgentIntent {
    let faction = ctx.factions.iter().find(|f| f.id == agent.faction_id);

    if agent.mind.perceived_threat_level > 0.6 && agent.role != AgentRole::Warrior {
        return AgentIntent::Flee;
    }
    if agent.energy < 25.0 {
        return if agent.resources.food > 0 {
            AgentIntent::Rest
        } else {
            AgentIntent::Gather
        };
    }
    if agent.hydration < 20.0 {
        return AgentIntent::Move;
    }
    if agent.mind.perceived_food_level < 0.3 {
        return AgentIntent::Gather;
    }

    let strategy_bias = faction.map(|f| f.strategy);
    match agent.role {
        AgentRole::Forager => AgentIntent::Gather,
        AgentRole::Hunter => AgentIntent::Hunt,
        AgentRole::Crafter => AgentIntent::Craft,
        AgentRole::Builder => AgentIntent::Build,
        AgentRole::Scribe => AgentIntent::Move,
        AgentRole::Shaman => AgentIntent::Worship,
        AgentRole::Warrior => AgentIntent::Patrol,
        AgentRole::Leader => match strategy_bias {
            Some(biotica_data::Strategy::Trade) => AgentIntent::Trade,
            Some(biotica_data::Strategy::Militarize) => AgentIntent::Patrol,
            Some(biotica_data::Strategy::Spiritual) => AgentIntent::Worship,
            _ => AgentIntent::Move,
        },
    }
}

fn execute_intent(agents: &mut [Agent], i: usize, ctx: &mut AgentPhaseCtx<'_>, views: &[AgentView]) {
    agents[i].activity_ticks = agents[i].activity_ticks.saturating_add(1);
    match agents[i].intent {
        AgentIntent::Gather => gather(&mut agents[i], ctx),
        AgentIntent::Hunt => hunt(&mut agents[i], ctx),
        AgentIntent::Craft => craft(&mut agents[i], ctx),
        AgentIntent::Build => build(&mut agents[i], ctx),
        AgentIntent::Move => roam(&mut agents[i], ctx),
        AgentIntent::Rest => rest(&mut agents[i]),
        AgentIntent::Trade => trade(agents, i, ctx, views),
        AgentIntent::Worship => worship(&mut agents[i]),
        AgentIntent::Patrol => patrol(&mut agents[i], ctx, views),
        AgentIntent::Flee => flee(&mut agents[i], ctx, views),
    }
}

fn gather(agent: &mut Agent, ctx: &mut AgentPhaseCtx<'_>) {
    let world = &mut *ctx.world;
    let idx = world.index(agent.x, agent.y);
    match world.tiles[idx] {
        Biome::Forest | Biome::Jungle => {
            agent.resources.wood = agent.resources.wood.saturating_add(1);
            if ctx.rng.chance(0.5) {
                *agent.items.entry("branch".into()).or_insert(0) += 1;
            }
            if ctx.rng.chance(0.1) {
                *agent.items.entry("fiber".into()).or_insert(0) += 1;
            }
        }
        Biome::Hills | Biome::Mountain | Biome::Rock => {
            agent.resources.stone = agent.resources.stone.saturating_add(1);
            if ctx.rng.chance(0.4) {
                *agent.items.entry("stone".into()).or_insert(0) += 1;
            }
            if ctx.rng.chance(0.05) {
                agent.resources.ore = agent.resources.ore.saturating_add(1);
                *agent.items.entry("ore".into()).or_insert(0) += 1;
            }
        }
        _ => {
            let biomass = world.plant_biomass[idx];
            if biomass > 16 {
                world.plant_biomass[idx] -= 16;
                agent.resources.food = agent.resources.food.saturating_add(1);
                if ctx.rng.chance(0.2) {
                    *agent.items.entry("fiber".into()).or_insert(0) += 1;
                }
            } else {
                // Nothing worth taking here; drift toward greener tiles.
                step_toward_best_tile(agent, ctx, |b, biomass| {
                    if b.supports_plants() {
                        u32::from(biomass)
                    } else {
                        0
                    }
                });
            }
        }
    }
}

fn hunt(agent: &mut Agent, ctx: &mut AgentPhaseCtx<'_>) {
    // Hunting is abstracted against the local biomass/hazard economy: success
    // yields food and sometimes hide/bone/meat.
    let p = if agent.equipment.weapon.is_some() { 0.2 } else { 0.12 };
    if ctx.rng.chance(p) {
        agent.resources.food = agent.resources.food.saturating_add(2);
        *agent.items.entry("meat".into()).or_insert(0) += 1;
        if ctx.rng.chance(0.4) {
            *agent.items.entry("hide".into()).or_insert(0) += 1;
        }
        if ctx.rng.chance(0.3) {
            *agent.items.entry("bone".into()).or_insert(0) += 1;
        }
    } else {
        roam(agent, ctx);
    }
}

fn craft(agent: &mut Agent, ctx: &mut AgentPhaseCtx<'_>) {
    let outcome = ctx
        .crafting
        .attempt_craft(agent.faction_id, &mut agent.items, ctx.rng);
    if outcome.crafted {
        if let Some(item_id) = &outcome.item_id {
            // Auto-equip the first tool/weapon produced.
            if let Some(def) = ctx.catalog.get(item_id) {
                match def.category {
                    biotica_data::ItemCategory::Weapon if agent.equipment.weapon.is_none() => {
                        agent.equipment.weapon = Some(item_id.clone());
                    }
                    biotica_data::ItemCategory::Tool if agent.equipment.tool.is_none() => {
                        agent.equipment.tool = Some(item_id.clone());
                    }
                    _ => {}
                }
            }
            LogEvent::new(
                ctx.tick,
                LogCategory::CivCraft,
                format!("faction {} crafted {item_id}", agent.faction_id),
            )
            .faction(agent.faction_id)
            .subject(format!("{}", agent.id))
            .payload(serde_json::json!({
                "recipe": outcome.recipe_id,
                "quantity": outcome.quantity,
            }))
            .emit(ctx.log);
        }
    } else {
        // Nothing craftable: go collect inputs instead.
        agent.proposed_intent = Some(AgentIntent::Gather);
        push_reason(&mut agent.mind, "craft:no_inputs");
    }
}

fn build(agent: &mut Agent, ctx: &mut AgentPhaseCtx<'_>) {
    let site = ctx
        .structures
        .iter()
        .position(|s| s.faction_id == agent.faction_id && !s.completed);
    match site {
        Some(si) => {
            let s = &mut ctx.structures[si];
            if chebyshev(agent.x, agent.y, s.x, s.y) > 1 {
                let (tx, ty) = (s.x, s.y);
                step_toward(agent, ctx.world, tx, ty);
            }
            // Progress itself is advanced by the structure phase, which
            // draws materials from adjacent builders.
        }
        None => {
            let Some(faction) = ctx.factions.iter().find(|f| f.id == agent.faction_id) else {
                return;
            };
            let kind = next_structure_kind(ctx.structures, faction);
            let (cost_wood, cost_stone) = kind.material_cost();
            if agent.resources.wood >= cost_wood && agent.resources.stone >= cost_stone {
                agent.resources.wood -= cost_wood;
                agent.resources.stone -= cost_stone;
                let id = *ctx.next_structure_id;
                *ctx.next_structure_id += 1;
                let offset = (ctx.structures.len() % 5) as u16;
                let (x, y) = ctx
                    .world
                    .clamp_pos(i32::from(faction.home_x) + i32::from(offset) - 2, i32::from(faction.home_y) + i32::from(offset % 3) - 1);
                ctx.structures.push(Structure {
                    id,
                    kind,
                    faction_id: agent.faction_id,
                    x,
                    y,
                    progress: 0.0,
                    completed: false,
                    hp: kind.max_hp(),
                    max_hp: kind.max_hp(),
                });
                LogEvent::new(
                    ctx.tick,
                    LogCategory::CivStructure,
                    format!("faction {} started a {:?}", agent.faction_id, kind),
                )
                .at(x, y)
                .faction(agent.faction_id)
                .emit(ctx.log);
            } else {
                agent.proposed_intent = Some(AgentIntent::Gather);
                push_reason(&mut agent.mind, "build:no_materials");
            }
        }
    }
}

fn roam(agent: &mut Agent, ctx: &mut AgentPhaseCtx<'_>) {
    if agent.hydration < 40.0 {
        // Seek water first.
        if step_toward_best_tile(agent, ctx, |b, _| if b.is_water() { 1 } else { 0 }) {
            return;
        }
    }
    let dirs = [(1i32, 0i32), (-1, 0), (0, 1), (0, -1)];
    let pick = ctx.rng.next_int(4) as usize;
    let (dx, dy) = dirs[pick];
    let nx = i32::from(agent.x) + dx;
    let ny = i32::from(agent.y) + dy;
    if ctx.world.in_bounds(nx, ny) && ctx.world.biome_at(nx as u16, ny as u16).walkable() {
        agent.x = nx as u16;
        agent.y = ny as u16;
    }
}

fn rest(agent: &mut Agent) {
    if agent.resources.food > 0 && agent.energy < 60.0 {
        agent.resources.food -= 1;
        agent.energy += EAT_ENERGY;
    }
    agent.mind.stress_level = (agent.mind.stress_level - 0.01).max(0.0);
}

fn trade(agents: &mut [Agent], i: usize, ctx: &mut AgentPhaseCtx<'_>, views: &[AgentView]) {
    let me = (agents[i].id, agents[i].faction_id, agents[i].x, agents[i].y);
    let partner = views
        .iter()
        .filter(|v| {
            v.faction_id != me.1
                && matches!(
                    super::diplomacy::relation_between(ctx.relations, me.1, v.faction_id)
                        .map(|r| r.status),
                    Some(RelationStatus::Trade | RelationStatus::Ally)
                )
        })
        .min_by_key(|v| (chebyshev(v.x, v.y, me.2, me.3), v.id));

    let Some(partner) = partner else {
        roam(&mut agents[i], ctx);
        return;
    };

    if chebyshev(partner.x, partner.y, me.2, me.3) <= 1 {
        // Swap a surplus resource for the partner's; modelled as mutual gift.
        let j = agents.iter().position(|a| a.id == partner.id);
        if let Some(j) = j {
            let (a, b) = if i < j {
                let (l, r) = agents.split_at_mut(j);
                (&mut l[i], &mut r[0])
            } else {
                let (l, r) = agents.split_at_mut(i);
                (&mut r[0], &mut l[j])
            };
            if a.resources.food > 2 && b.resources.stone > 0 {
                a.resources.food -= 1;
                b.resources.food = b.resources.food.saturating_add(1);
                b.resources.stone -= 1;
                a.resources.stone = a.resources.stone.saturating_add(1);
            }
        }
        if let Some(rel) = relation_between_mut(ctx.relations, me.1, partner.faction_id) {
            rel.trust = (rel.trust + 0.01).min(1.0);
            rel.intensity = (rel.intensity + 0.05).min(1.0);
        }
    } else {
        let (tx, ty) = (partner.x, partner.y);
        step_toward(&mut agents[i], ctx.world, tx, ty);
    }
}

fn worship(agent: &mut Agent) {
    agent.mind.stress_level = (agent.mind.stress_level - 0.02).max(0.0);
    agent.mind.loyalty_to_faction = (agent.mind.loyalty_to_faction + 0.002).min(1.0);
}

fn patrol(agent: &mut Agent, ctx: &mut AgentPhaseCtx<'_>, views: &[AgentView]) {
    let enemy = views
        .iter()
        .filter(|v| {
            v.faction_id != agent.faction_id
                && at_war(ctx.relations, agent.faction_id, v.faction_id)
                && chebyshev(v.x, v.y, agent.x, agent.y) <= AGENT_PERCEPTION_RADIUS * 2
        })
        .min_by_key(|v| (chebyshev(v.x, v.y, agent.x, agent.y), v.id));
    match enemy {
        Some(e) => {
            let (tx, ty) = (e.x, e.y);
            step_toward(agent, ctx.world, tx, ty);
        }
        None => roam(agent, ctx),
    }
}

fn flee(agent: &mut Agent, ctx: &mut AgentPhaseCtx<'_>, views: &[AgentView]) {
    let threat = views
        .iter()
        .filter(|v| v.faction_id != agent.faction_id)
        .min_by_key(|v| (chebyshev(v.x, v.y, agent.x, agent.y), v.id));
    if let Some(t) = threat {
        let dx = (i32::from(agent.x) - i32::from(t.x)).signum();
        let dy = (i32::from(agent.y) - i32::from(t.y)).signum();
        let nx = i32::from(agent.x) + dx;
        let ny = i32::from(agent.y) + dy;
        if ctx.world.in_bounds(nx, ny) && ctx.world.biome_at(nx as u16, ny as u16).walkable() {
            agent.x = nx as u16;
            agent.y = ny as u16;
            return;
        }
    }
    roam(agent, ctx);
}

/// Wars resolve skirmishes during the agent phase: adjacent enemies at war
/// exchange damage, warriors hit harder, a completed palisade blunts blows
/// landed inside home territory.
fn skirmish(
    agents: &mut [Agent],
    i: usize,
    ctx: &mut AgentPhaseCtx<'_>,
    views: &[AgentView],
    damage: &mut Vec<(u64, f32)>,
) {
    let me = &agents[i];
    let target = views
        .iter()
        .filter(|v| {
            v.faction_id != me.faction_id
                && at_war(ctx.relations, me.faction_id, v.faction_id)
                && chebyshev(v.x, v.y, me.x, me.y) <= 1
        })
        .min_by_key(|v| v.id);
    let Some(target) = target else {
        return;
    };

    let mut dmg = SKIRMISH_DAMAGE;
    if me.role == AgentRole::Warrior {
        dmg *= 1.5;
    }
    if me.equipment.weapon.is_some() {
        dmg *= 1.25;
    }
    let defended = ctx.structures.iter().any(|s| {
        s.completed
            && s.kind == StructureKind::Palisade
            && s.faction_id == target.faction_id
            && chebyshev(s.x, s.y, target.x, target.y) <= 3
    });
    if defended {
        dmg *= PALISADE_DEFENSE;
    }
    damage.push((target.id, dmg));

    if let Some(rel) = relation_between_mut(ctx.relations, target.faction_id, me.faction_id) {
        rel.tension = (rel.tension + 0.02).min(1.0);
        rel.intensity = (rel.intensity + 0.1).min(1.0);
    }
}

fn upkeep(agent: &mut Agent, ctx: &mut AgentPhaseCtx<'_>) {
    let world = &*ctx.world;
    let idx = world.index(agent.x, agent.y);
    let hazard = f32::from(world.hazard[idx]) / 255.0;

    agent.energy -= 0.18 + hazard * 0.4;
    agent.hydration -= 0.3;
    agent.age += 1;

    if agent.energy < 40.0 && agent.resources.food > 0 {
        agent.resources.food -= 1;
        agent.energy += EAT_ENERGY;
    }
    // Refill next to open water.
    if near_water(world, agent.x, agent.y) {
        agent.hydration = 100.0;
    }
    agent.hydration = agent.hydration.clamp(0.0, 100.0);
    agent.energy = agent.energy.min(100.0);
}

fn speak(agent: &mut Agent, ctx: &mut AgentPhaseCtx<'_>) {
    let Some(faction) = ctx.factions.iter().find(|f| f.id == agent.faction_id) else {
        return;
    };
    let Some(lexicon) = ctx.lexicons.get(&agent.faction_id) else {
        return;
    };
    if !ctx.rng.chance(0.01 + faction.culture.curiosity * 0.02) {
        return;
    }
    let words = lexicon.utterance_for(agent.intent, ctx.rng);
    if words.is_empty() {
        return;
    }
    push_thought(agent, words.join(" "));

    if agent.role == AgentRole::Scribe && ctx.rng.chance(0.25) {
        let id = *ctx.next_note_id;
        *ctx.next_note_id += 1;
        ctx.notes.push(Note {
            id,
            faction_id: agent.faction_id,
            author_agent_id: agent.id,
            x: agent.x,
            y: agent.y,
            tick: ctx.tick,
            tokens: words,
            translation: None,
        });
        LogEvent::new(
            ctx.tick,
            LogCategory::CivLanguage,
            format!("scribe {} of faction {} left a note", agent.id, agent.faction_id),
        )
        .at(agent.x, agent.y)
        .faction(agent.faction_id)
        .severity(Severity::Info)
        .emit(ctx.log);
    }
}

fn next_structure_kind(structures: &[Structure], faction: &Faction) -> StructureKind {
    let count = |k: StructureKind| {
        structures
            .iter()
            .filter(|s| s.faction_id == faction.id && s.kind == k)
            .count()
    };
    if count(StructureKind::Hut) < 2 {
        StructureKind::Hut
    } else if count(StructureKind::Storehouse) < 1 {
        StructureKind::Storehouse
    } else if count(StructureKind::Workshop) < 1 {
        StructureKind::Workshop
    } else if faction.culture.spirituality > 0.5 && count(StructureKind::Shrine) < 1 {
        StructureKind::Shrine
    } else if faction.culture.aggression > 0.4 && count(StructureKind::Palisade) < 1 {
        StructureKind::Palisade
    } else {
        StructureKind::Hut
    }
}

fn step_toward(agent: &mut Agent, world: &WorldState, tx: u16, ty: u16) -> bool {
    let dx = (i32::from(tx) - i32::from(agent.x)).signum();
    let dy = (i32::from(ty) - i32::from(agent.y)).signum();
    let x_first =
        (i32::from(tx) - i32::from(agent.x)).abs() >= (i32::from(ty) - i32::from(agent.y)).abs();
    let attempts = if x_first {
        [(dx, 0), (0, dy)]
    } else {
        [(0, dy), (dx, 0)]
    };
    for (ax, ay) in attempts {
        if (ax, ay) == (0, 0) {
            continue;
        }
        let nx = i32::from(agent.x) + ax;
        let ny = i32::from(agent.y) + ay;
        if world.in_bounds(nx, ny) && world.biome_at(nx as u16, ny as u16).walkable() {
            agent.x = nx as u16;
            agent.y = ny as u16;
            return true;
        }
    }
    false
}

/// Move one step toward the best-scoring tile in perception range. Returns
/// false when nothing scores above zero.
fn step_toward_best_tile(
    agent: &mut Agent,
    ctx: &mut AgentPhaseCtx<'_>,
    score: impl Fn(Biome, u8) -> u32,
) -> bool {
    let world = &*ctx.world;
    let r = i32::from(AGENT_PERCEPTION_RADIUS);
    let mut best: Option<(u32, i32, u16, u16)> = None;
    for dy in -r..=r {
        for dx in -r..=r {
            let nx = i32::from(agent.x) + dx;
            let ny = i32::from(agent.y) + dy;
            if !world.in_bounds(nx, ny) {
                continue;
            }
            let (ux, uy) = (nx as u16, ny as u16);
            let idx = world.index(ux, uy);
            let s = score(world.tiles[idx], world.plant_biomass[idx]);
            if s == 0 {
                continue;
            }
            let d2 = dx * dx + dy * dy;
            let better = best.map_or(true, |(bs, bd, ..)| s > bs || (s == bs && d2 < bd));
            if better {
                best = Some((s, d2, ux, uy));
            }
        }
    }
    match best {
        Some((_, _, tx, ty)) => step_toward(agent, ctx.world, tx, ty),
        None => false,
    }
}

fn at_war(relations: &[Relation], a: u32, b: u32) -> bool {
    relations
        .iter()
        .any(|r| r.from == a && r.to == b && r.status == RelationStatus::War)
}

fn near_water(world: &WorldState, x: u16, y: u16) -> bool {
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            let nx = i32::from(x) + dx;
            let ny = i32::from(y) + dy;
            if world.in_bounds(nx, ny) && world.biome_at(nx as u16, ny as u16).is_water() {
                return true;
            }
        }
    }
    false
}

fn push_thought(agent: &mut Agent, thought: String) {
    agent.thoughts.push(thought);
    while agent.thoughts.len() > THOUGHT_BUFFER_CAP {
        agent.thoughts.remove(0);
    }
}

fn push_reason(mind: &mut biotica_data::MentalState, code: &str) {
    if mind.last_reason_codes.last().map(String::as_str) == Some(code) {
        return;
    }
    mind.last_reason_codes.push(code.to_string());
    while mind.last_reason_codes.len() > REASON_CODES_CAP {
        mind.last_reason_codes.remove(0);
    }
}

fn chebyshev(ax: u16, ay: u16, bx: u16, by: u16) -> u16 {
    ax.abs_diff(bx).max(ay.abs_diff(by))
}
