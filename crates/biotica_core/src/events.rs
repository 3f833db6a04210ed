//! Environmental event state machine: `Scheduled → Active → Finished`.
//! Transitions are driven by tick counters and deterministic RNG draws; all
//! side effects onto the world fields are clamped to the grid, and `step`
//! never propagates an error.

use crate::rng::KernelRng;
use crate::world::WorldState;
use biotica_data::Biome;
use serde::{Deserialize, Serialize};

pub const MAX_ACTIVE_EVENTS: usize = 3;
pub const SPAWN_COOLDOWN_TICKS: u64 = 300;
pub const BASE_SPAWN_CHANCE: f32 = 0.004;
pub const RECENT_EVENTS_KEPT: usize = 32;
/// Eruption spread cap: `max_lava_tiles * (1 + SPREAD_FACTOR)`.
pub const ERUPTION_SPREAD_FACTOR: f32 = 0.5;
const SCHEDULE_DELAY_TICKS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Drought,
    Storm,
    Heatwave,
    ColdSnap,
    Eruption,
}

impl EventKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Drought => "drought",
            Self::Storm => "storm",
            Self::Heatwave => "heatwave",
            Self::ColdSnap => "cold snap",
            Self::Eruption => "eruption",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPhase {
    Scheduled,
    Active,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    pub id: u64,
    pub kind: EventKind,
    pub phase: EventPhase,
    pub x: u16,
    pub y: u16,
    pub radius: u16,
    pub start_tick: u64,
    pub duration_ticks: u32,
    pub elapsed_ticks: u32,
    /// `[0, 1]`, decays over the event's lifetime.
    pub intensity: f32,
    /// Tiles an eruption overwrote, recorded so lava can cool on finish.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lava_tiles: Vec<(u16, u16)>,
}

/// Three scalar alphas for atmospheric rendering. Purely informational.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EventOverlay {
    pub storm_alpha: f32,
    pub heat_alpha: f32,
    pub ash_alpha: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSystem {
    pub active: Vec<WorldEvent>,
    pub recent: Vec<WorldEvent>,
    pub overlay: EventOverlay,
    next_event_id: u64,
    cooldown_until: u64,
    pub rng: KernelRng,
}

impl EventSystem {
    #[must_use]
    pub fn new(rng: KernelRng) -> Self {
        Self {
            active: Vec::new(),
            recent: Vec::new(),
            overlay: EventOverlay::default(),
            next_event_id: 0,
            cooldown_until: 0,
            rng,
        }
    }

    /// Events that finished this tick, for logging by the kernel.
    pub fn step(&mut self, world: &mut WorldState, tick: u64) -> Vec<WorldEvent> {
        // 1. Advance phases and elapsed counters.
        for ev in &mut self.active {
            match ev.phase {
                EventPhase::Scheduled => {
                    if tick >= ev.start_tick {
                        ev.phase = EventPhase::Active;
                    }
                }
                EventPhase::Active => {
                    ev.elapsed_ticks += 1;
                    let life = ev.elapsed_ticks as f32 / ev.duration_ticks.max(1) as f32;
                    ev.intensity = (1.0 - life).clamp(0.0, 1.0);
                    if ev.elapsed_ticks >= ev.duration_ticks {
                        ev.phase = EventPhase::Finished;
                    }
                }
                EventPhase::Finished => {}
            }
        }

        // 2. Retire finished events.
        let mut finished = Vec::new();
        let mut still_active = Vec::with_capacity(self.active.len());
        for ev in self.active.drain(..) {
            if ev.phase == EventPhase::Finished {
                finish_event(world, &ev, tick);
                finished.push(ev.clone());
                self.recent.push(ev);
                if self.recent.len() > RECENT_EVENTS_KEPT {
                    self.recent.remove(0);
                }
            } else {
                still_active.push(ev);
            }
        }
        self.active = still_active;

        // 3. Consider spawning.
        self.maybe_spawn(world, tick);

        // 4. Apply per-tick side effects of active events.
        for i in 0..self.active.len() {
            let ev = self.active[i].clone();
            if ev.phase == EventPhase::Active {
                apply_effects(world, &ev);
            }
        }

        self.refresh_overlay();
        finished
    }

    fn maybe_spawn(&mut self, world: &mut WorldState, tick: u64) {
        // Volcano eruptions are anchored and schedule-gated, not chance-gated.
        let due_eruption = world.volcano.as_ref().is_some_and(|v| {
            v.active_eruption.is_none() && tick >= v.next_eruption_tick
        });
        if due_eruption && self.active.len() < MAX_ACTIVE_EVENTS {
            let id = self.alloc_id();
            let volcano = world.volcano.as_mut().expect("checked above");
            volcano.active_eruption = Some(id);
            let mut event = WorldEvent {
                id,
                kind: EventKind::Eruption,
                phase: EventPhase::Active,
                x: volcano.x,
                y: volcano.y,
                radius: 6,
                start_tick: tick,
                duration_ticks: 120 + self.rng.next_int(80),
                elapsed_ticks: 0,
                intensity: 1.0,
                lava_tiles: Vec::new(),
            };
            let max_tiles = volcano.max_lava_tiles;
            erupt(world, &mut event, max_tiles);
            self.active.push(event);
        }

        if tick < self.cooldown_until || self.active.len() >= MAX_ACTIVE_EVENTS {
            return;
        }
        let p = BASE_SPAWN_CHANCE * world.tuning.event_rate;
        if !self.rng.chance(p) {
            return;
        }

        let kind = match self.rng.next_int(4) {
            0 => EventKind::Drought,
            1 => EventKind::Storm,
            2 => EventKind::Heatwave,
            _ => EventKind::ColdSnap,
        };
        let x = self.rng.next_int(u32::from(world.width)) as u16;
        let y = self.rng.next_int(u32::from(world.height)) as u16;
        let radius = (4 + self.rng.next_int(10)) as u16;
        let duration = 200 + self.rng.next_int(400);
        let id = self.alloc_id();
        self.active.push(WorldEvent {
            id,
            kind,
            phase: EventPhase::Scheduled,
            x,
            y,
            radius,
            start_tick: tick + SCHEDULE_DELAY_TICKS,
            duration_ticks: duration,
            elapsed_ticks: 0,
            intensity: 1.0,
            lava_tiles: Vec::new(),
        });
        self.cooldown_until = tick + SPAWN_COOLDOWN_TICKS;
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_event_id;
        self.next_event_id += 1;
        id
    }

    fn refresh_overlay(&mut self) {
        let mut overlay = EventOverlay::default();
        let mut any = false;
        for ev in &self.active {
            if ev.phase != EventPhase::Active {
                continue;
            }
            any = true;
            match ev.kind {
                EventKind::Storm => overlay.storm_alpha = overlay.storm_alpha.max(ev.intensity),
                EventKind::Heatwave | EventKind::Drought => {
                    overlay.heat_alpha = overlay.heat_alpha.max(ev.intensity * 0.7);
                }
                EventKind::Eruption => overlay.ash_alpha = overlay.ash_alpha.max(ev.intensity),
                EventKind::ColdSnap => {
                    overlay.storm_alpha = overlay.storm_alpha.max(ev.intensity * 0.4);
                }
            }
        }
        // No active events means no pending overlay, whatever the math said.
        self.overlay = if any { overlay } else { EventOverlay::default() };
    }

    #[must_use]
    pub fn find(&self, id: u64) -> Option<&WorldEvent> {
        self.active
            .iter()
            .chain(self.recent.iter())
            .find(|e| e.id == id)
    }

    #[must_use]
    pub fn next_event_id(&self) -> u64 {
        self.next_event_id
    }

    #[must_use]
    pub fn cooldown_until(&self) -> u64 {
        self.cooldown_until
    }

    /// Restore scheduler cursors from a save record.
    pub fn restore_cursors(&mut self, next_event_id: u64, cooldown_until: u64) {
        self.next_event_id = next_event_id;
        self.cooldown_until = cooldown_until;
    }
}

/// Per-tick field effects, all clamped to the grid.
fn apply_effects(world: &mut WorldState, ev: &WorldEvent) {
    let strength = (ev.intensity * 4.0) as i16 + 1;
    for_each_tile_in_radius(world, ev.x, ev.y, ev.radius, |world, idx| match ev.kind {
        EventKind::Storm => {
            world.humidity[idx] = add_clamped(world.humidity[idx], strength);
            world.hazard[idx] = add_clamped(world.hazard[idx], strength / 2 + 1);
        }
        EventKind::Heatwave => {
            world.temperature[idx] = add_clamped(world.temperature[idx], strength);
            world.humidity[idx] = add_clamped(world.humidity[idx], -(strength / 2));
        }
        EventKind::Drought => {
            world.humidity[idx] = add_clamped(world.humidity[idx], -strength);
            world.fertility[idx] = add_clamped(world.fertility[idx], -(strength / 2));
        }
        EventKind::ColdSnap => {
            world.temperature[idx] = add_clamped(world.temperature[idx], -strength);
        }
        EventKind::Eruption => {
            world.hazard[idx] = add_clamped(world.hazard[idx], strength * 2);
        }
    });
}

/// One-shot tile overwrite at eruption start: Lava at the core, Scorched in
/// the rim, total tiles capped at `max_tiles * (1 + ERUPTION_SPREAD_FACTOR)`.
fn erupt(world: &mut WorldState, ev: &mut WorldEvent, max_tiles: u32) {
    let cap = (max_tiles as f32 * (1.0 + ERUPTION_SPREAD_FACTOR)) as usize;
    let lava_cap = max_tiles as usize;
    let mut touched = 0usize;

    // Expand ring by ring so the core is always lava before any rim tile is
    // considered; row-major within a ring keeps the order deterministic.
    'rings: for ring in 0..=ev.radius as i32 {
        for dy in -ring..=ring {
            for dx in -ring..=ring {
                if dx.abs().max(dy.abs()) != ring {
                    continue;
                }
                let nx = i32::from(ev.x) + dx;
                let ny = i32::from(ev.y) + dy;
                if !world.in_bounds(nx, ny) {
                    continue;
                }
                if touched >= cap {
                    break 'rings;
                }
                let (ux, uy) = (nx as u16, ny as u16);
                let idx = world.index(ux, uy);
                if world.tiles[idx].is_water() {
                    continue;
                }
                world.tiles[idx] = if touched < lava_cap {
                    Biome::Lava
                } else {
                    Biome::Scorched
                };
                world.hazard[idx] = 255;
                world.plant_biomass[idx] = 0;
                ev.lava_tiles.push((ux, uy));
                touched += 1;
            }
        }
    }
}

fn finish_event(world: &mut WorldState, ev: &WorldEvent, tick: u64) {
    if ev.kind != EventKind::Eruption {
        return;
    }
    // Lava cools to scorched rock once the eruption ends.
    for &(x, y) in &ev.lava_tiles {
        let idx = world.index(x, y);
        if world.tiles[idx] == Biome::Lava {
            world.tiles[idx] = Biome::Scorched;
        }
    }
    if let Some(volcano) = world.volcano.as_mut() {
        if volcano.active_eruption == Some(ev.id) {
            volcano.active_eruption = None;
            let span = volcano
                .max_interval_ticks
                .saturating_sub(volcano.min_interval_ticks)
                .max(1);
            // Deterministic reschedule keyed off the finish tick.
            let jitter = (tick ^ u64::from(ev.id).wrapping_mul(0x9E37_79B9)) % u64::from(span);
            volcano.next_eruption_tick = tick + u64::from(volcano.min_interval_ticks) + jitter;
        }
    }
}

fn add_clamped(v: u8, delta: i16) -> u8 {
    (i16::from(v) + delta).clamp(0, 255) as u8
}

fn for_each_tile_in_radius(
    world: &mut WorldState,
    cx: u16,
    cy: u16,
    radius: u16,
    mut f: impl FnMut(&mut WorldState, usize),
) {
    let r = i32::from(radius);
    for dy in -r..=r {
        for dx in -r..=r {
            let nx = i32::from(cx) + dx;
            let ny = i32::from(cy) + dy;
            if world.in_bounds(nx, ny) && dx * dx + dy * dy <= r * r {
                let idx = world.index(nx as u16, ny as u16);
                f(world, idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{KernelRng, STREAM_EVENTS};
    use biotica_data::{SimTuning, VolcanoState};

    fn world_with_volcano(next_eruption: u64) -> WorldState {
        let n = 32 * 32;
        WorldState::new(
            32,
            32,
            42,
            vec![Biome::Grassland; n],
            vec![128; n],
            vec![128; n],
            vec![128; n],
            Some(VolcanoState {
                x: 0,
                y: 0,
                min_interval_ticks: 100,
                max_interval_ticks: 200,
                max_lava_tiles: 16,
                next_eruption_tick: next_eruption,
                active_eruption: None,
            }),
            SimTuning::default(),
        )
    }

    #[test]
    fn eruption_fires_at_anchor_and_respects_cap() {
        let mut world = world_with_volcano(0);
        let mut events = EventSystem::new(KernelRng::stream(42, STREAM_EVENTS));
        for tick in 0..200 {
            world.tick = tick;
            events.step(&mut world, tick);
        }
        let burned = world
            .tiles
            .iter()
            .filter(|t| matches!(t, Biome::Lava | Biome::Scorched))
            .count();
        assert!(burned > 0, "eruption never applied");
        assert!(
            burned <= (16.0 * (1.0 + ERUPTION_SPREAD_FACTOR)) as usize,
            "burned {burned} tiles, over cap"
        );
        // Corner anchor: the clamped footprint must stay inside the grid, so
        // every burned tile is in the top-left quadrant.
        for (i, t) in world.tiles.iter().enumerate() {
            if matches!(t, Biome::Lava | Biome::Scorched) {
                assert!(i % 32 <= 8 && i / 32 <= 8);
            }
        }
    }

    #[test]
    fn elapsed_never_exceeds_duration() {
        let mut world = world_with_volcano(u64::MAX);
        world.tuning.set_event_rate(4.0);
        let mut events = EventSystem::new(KernelRng::stream(7, STREAM_EVENTS));
        for tick in 0..3000 {
            world.tick = tick;
            events.step(&mut world, tick);
            for ev in &events.active {
                assert!(ev.elapsed_ticks <= ev.duration_ticks);
            }
            assert!(events.active.len() <= MAX_ACTIVE_EVENTS);
        }
    }

    #[test]
    fn overlay_zeroes_without_active_events() {
        let mut world = world_with_volcano(u64::MAX);
        world.tuning.set_event_rate(0.0);
        let mut events = EventSystem::new(KernelRng::stream(7, STREAM_EVENTS));
        events.overlay.storm_alpha = 0.9;
        events.step(&mut world, 0);
        assert_eq!(events.overlay, EventOverlay::default());
    }

    #[test]
    fn eruption_reschedules_after_finish() {
        let mut world = world_with_volcano(0);
        let mut events = EventSystem::new(KernelRng::stream(1, STREAM_EVENTS));
        let mut finished_at = None;
        for tick in 0..1000 {
            world.tick = tick;
            let done = events.step(&mut world, tick);
            if done.iter().any(|e| e.kind == EventKind::Eruption) {
                finished_at = Some(tick);
                break;
            }
        }
        let finished_at = finished_at.expect("eruption finished");
        let volcano = world.volcano.as_ref().expect("volcano");
        assert!(volcano.active_eruption.is_none());
        assert!(volcano.next_eruption_tick >= finished_at + 100);
    }
}
