//! Fixed-timestep tick scheduler. The host frame loop reports elapsed wall
//! time; the scheduler converts it into zero or more fixed 50 ms steps,
//! capped per frame so a stalled host can never trigger a spiral of death.

use serde::{Deserialize, Serialize};

/// 20 ticks per second.
pub const FIXED_STEP_MS: f64 = 50.0;
pub const MAX_STEPS_PER_FRAME: u32 = 6;
/// Closed set of user-selectable speed multipliers.
pub const SPEED_STEPS: [f64; 6] = [0.25, 0.5, 1.0, 2.0, 5.0, 10.0];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler {
    accumulator_ms: f64,
    speed_multiplier: f64,
    paused: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accumulator_ms: 0.0,
            speed_multiplier: 1.0,
            paused: false,
        }
    }

    /// Feed one host frame's wall-clock time; returns how many fixed steps
    /// to run now. `sim_speed` is `tuning.simulation_speed`.
    pub fn advance(&mut self, frame_ms: f64, sim_speed: f32) -> u32 {
        if self.paused {
            return 0;
        }
        self.accumulator_ms += frame_ms.max(0.0) * self.speed_multiplier * f64::from(sim_speed);
        let mut steps = (self.accumulator_ms / FIXED_STEP_MS) as u32;
        if steps > MAX_STEPS_PER_FRAME {
            steps = MAX_STEPS_PER_FRAME;
            // Drop the backlog instead of letting it snowball.
            self.accumulator_ms = 0.0;
        } else {
            self.accumulator_ms -= f64::from(steps) * FIXED_STEP_MS;
        }
        steps
    }

    /// Snap to the nearest member of the closed speed set.
    pub fn set_speed(&mut self, speed: f64) {
        let snapped = SPEED_STEPS
            .iter()
            .copied()
            .min_by(|a, b| {
                (a - speed)
                    .abs()
                    .partial_cmp(&(b - speed).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(1.0);
        self.speed_multiplier = snapped;
    }

    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resuming zeroes the accumulator: time spent paused never converts
    /// into ticks.
    pub fn resume(&mut self) {
        self.paused = false;
        self.accumulator_ms = 0.0;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn reset(&mut self) {
        self.accumulator_ms = 0.0;
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_fixed_steps() {
        let mut s = Scheduler::new();
        assert_eq!(s.advance(49.0, 1.0), 0);
        assert_eq!(s.advance(1.0, 1.0), 1);
        assert_eq!(s.advance(100.0, 1.0), 2);
    }

    #[test]
    fn caps_runaway_frames() {
        let mut s = Scheduler::new();
        assert_eq!(s.advance(10_000.0, 1.0), MAX_STEPS_PER_FRAME);
        // Backlog was dropped, not deferred.
        assert_eq!(s.advance(0.0, 1.0), 0);
    }

    #[test]
    fn speed_snaps_to_closed_set() {
        let mut s = Scheduler::new();
        s.set_speed(3.0);
        assert_eq!(s.speed(), 2.0);
        s.set_speed(0.3);
        assert_eq!(s.speed(), 0.25);
        s.set_speed(100.0);
        assert_eq!(s.speed(), 10.0);
    }

    #[test]
    fn pause_produces_no_steps_and_resume_zeroes_backlog() {
        let mut s = Scheduler::new();
        s.advance(30.0, 1.0);
        s.pause();
        assert_eq!(s.advance(10_000.0, 1.0), 0);
        s.resume();
        // Identical to a freshly reset scheduler from here on.
        let mut fresh = Scheduler::new();
        for frame in [20.0, 55.0, 80.0, 12.0] {
            assert_eq!(s.advance(frame, 1.0), fresh.advance(frame, 1.0));
        }
    }

    #[test]
    fn sim_speed_scales_time() {
        let mut s = Scheduler::new();
        assert_eq!(s.advance(50.0, 2.0), 2);
    }
}
