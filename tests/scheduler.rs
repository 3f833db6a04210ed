//! Scheduler semantics: fixed-step accumulation, the per-frame cap, and
//! pause idempotence (scenario S6).

use biotica_core::{Scheduler, FIXED_STEP_MS, MAX_STEPS_PER_FRAME};

#[test]
fn s6_pausing_changes_nothing_about_subsequent_ticks() {
    let frames = [17.0, 33.0, 12.0, 70.0, 50.0, 16.0, 16.0, 90.0];

    // Run A: pause for a while in the middle, then resume.
    let mut paused_run = Scheduler::new();
    let mut a_steps = Vec::new();
    for f in &frames[..3] {
        a_steps.push(paused_run.advance(*f, 1.0));
    }
    paused_run.pause();
    for _ in 0..100 {
        assert_eq!(paused_run.advance(16.0, 1.0), 0);
    }
    paused_run.resume();

    // Run B: a fresh scheduler at the moment of resume.
    let mut fresh = Scheduler::new();
    for f in &frames[3..] {
        assert_eq!(paused_run.advance(*f, 1.0), fresh.advance(*f, 1.0));
    }
}

#[test]
fn total_steps_track_elapsed_time() {
    let mut s = Scheduler::new();
    let mut total = 0u32;
    for _ in 0..100 {
        total += s.advance(16.0, 1.0);
    }
    // 1600 ms of simulated time at 50 ms per step.
    assert_eq!(total, (1600.0 / FIXED_STEP_MS) as u32);
}

#[test]
fn frame_cap_prevents_spiral_of_death() {
    let mut s = Scheduler::new();
    assert_eq!(s.advance(60_000.0, 1.0), MAX_STEPS_PER_FRAME);
    // The overload was discarded; the next normal frame is normal.
    assert_eq!(s.advance(50.0, 1.0), 1);
}

#[test]
fn speed_multipliers_compound_with_tuning_speed() {
    let mut s = Scheduler::new();
    s.set_speed(2.0);
    // 2x scheduler speed and 2x tuning speed: 50 ms of frame = 4 steps.
    assert_eq!(s.advance(50.0, 2.0), 4);
}
