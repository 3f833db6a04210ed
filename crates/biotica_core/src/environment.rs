//! Per-tick diffusion of the environmental fields. Work is budgeted: each
//! tick touches at most `budget_cells` cells, cycling a cursor through the
//! grid so every cell is eventually updated regardless of world size.

use crate::world::WorldState;
use serde::{Deserialize, Serialize};

/// Default per-tick cell budget. Past this world size, tick cost is constant.
pub const DEFAULT_CELL_BUDGET: usize = 4096;

/// Hazard shrinks by `1/16` of itself (at least 1) per visit. SimTuning's
/// closed schema carries no hazard knob, so the rate is pinned here.
const HAZARD_DECAY_SHIFT: u8 = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentUpdater {
    cursor: usize,
}

impl EnvironmentUpdater {
    #[must_use]
    pub fn new() -> Self {
        Self { cursor: 0 }
    }

    /// Apply clamped 3×3 diffusion to temperature/humidity/fertility and
    /// exponential decay to hazard, for `budget_cells` cells starting at the
    /// cursor. All arithmetic is integer, so the pass is bit-stable.
    pub fn step(&mut self, world: &mut WorldState, budget_cells: usize) {
        let n = world.cell_count();
        if n == 0 {
            return;
        }
        let budget = budget_cells.min(n);
        let w = world.width as usize;
        let h = world.height as usize;

        // Stage updates, then commit: a cell must not read a neighbor this
        // pass already rewrote.
        let mut staged: Vec<(usize, u8, u8, u8, u8)> = Vec::with_capacity(budget);

        for k in 0..budget {
            let idx = (self.cursor + k) % n;
            let x = idx % w;
            let y = idx / w;

            let (t_avg, h_avg, f_avg) = neighborhood_avg(world, x, y, w, h);
            let t = diffuse(world.temperature[idx], t_avg);
            let hu = diffuse(world.humidity[idx], h_avg);
            let f = diffuse(world.fertility[idx], f_avg);

            let hz = world.hazard[idx];
            let hz = hz.saturating_sub(if hz == 0 {
                0
            } else {
                (hz >> HAZARD_DECAY_SHIFT).max(1)
            });

            staged.push((idx, t, hu, f, hz));
        }

        for (idx, t, hu, f, hz) in staged {
            world.temperature[idx] = t;
            world.humidity[idx] = hu;
            world.fertility[idx] = f;
            world.hazard[idx] = hz;
        }

        self.cursor = (self.cursor + budget) % n;
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

/// Blend a cell toward its neighborhood average: `new = old + (avg - old)/8`.
fn diffuse(old: u8, avg: u8) -> u8 {
    let delta = (i16::from(avg) - i16::from(old)) / 8;
    (i16::from(old) + delta).clamp(0, 255) as u8
}

fn neighborhood_avg(world: &WorldState, x: usize, y: usize, w: usize, h: usize) -> (u8, u8, u8) {
    let mut t_sum: u32 = 0;
    let mut h_sum: u32 = 0;
    let mut f_sum: u32 = 0;
    let mut count: u32 = 0;
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                continue;
            }
            let ni = ny as usize * w + nx as usize;
            t_sum += u32::from(world.temperature[ni]);
            h_sum += u32::from(world.humidity[ni]);
            f_sum += u32::from(world.fertility[ni]);
            count += 1;
        }
    }
    (
        (t_sum / count) as u8,
        (h_sum / count) as u8,
        (f_sum / count) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use biotica_data::{Biome, SimTuning};

    fn world(w: u16, h: u16) -> WorldState {
        let n = w as usize * h as usize;
        WorldState::new(
            w,
            h,
            1,
            vec![Biome::Grassland; n],
            vec![128; n],
            vec![128; n],
            vec![128; n],
            None,
            SimTuning::default(),
        )
    }

    #[test]
    fn hot_spot_diffuses_outward() {
        let mut w = world(8, 8);
        let c = w.index(4, 4);
        w.temperature[c] = 255;
        let mut env = EnvironmentUpdater::new();
        for _ in 0..10 {
            env.step(&mut w, 64);
        }
        assert!(w.temperature[c] < 255);
        assert!(w.temperature[w.index(3, 4)] > 128);
    }

    #[test]
    fn hazard_decays_to_zero() {
        let mut w = world(4, 4);
        w.hazard.fill(200);
        let mut env = EnvironmentUpdater::new();
        for _ in 0..200 {
            env.step(&mut w, 16);
        }
        assert!(w.hazard.iter().all(|&h| h == 0));
    }

    #[test]
    fn budget_cycles_the_whole_grid() {
        let mut w = world(16, 16);
        let c = w.index(15, 15);
        w.hazard[c] = 100;
        let mut env = EnvironmentUpdater::new();
        // Budget covers a quarter of the grid per step; four steps must have
        // visited the last cell exactly once.
        for _ in 0..4 {
            env.step(&mut w, 64);
        }
        assert!(w.hazard[c] < 100);
        assert_eq!(env.cursor(), 0);
    }

    #[test]
    fn updates_are_deterministic() {
        let mut a = world(12, 9);
        let mut b = world(12, 9);
        a.temperature[5] = 250;
        b.temperature[5] = 250;
        let mut ea = EnvironmentUpdater::new();
        let mut eb = EnvironmentUpdater::new();
        for _ in 0..50 {
            ea.step(&mut a, 40);
            eb.step(&mut b, 40);
        }
        assert_eq!(a.temperature, b.temperature);
        assert_eq!(ea.cursor(), eb.cursor());
    }
}
