//! Frame-driven motion simulation
//!
//! Advances fly positions by elapsed wall time, so perceived speed stays
//! consistent under variable frame rates. A gate coalesces over-eager frame
//! callbacks into steps of at least `MIN_STEP_MS`.

use super::state::{GamePhase, GameState, random_heading};
use crate::consts::{FIELD_MAX, MIN_STEP_MS};
use rand::Rng;

/// Coalesces frame callbacks into steps of at least `MIN_STEP_MS`.
///
/// Sub-threshold deltas carry forward instead of being dropped, so net
/// simulated time always matches real time; the gate only bounds how often
/// a step is applied, never how much time it covers.
#[derive(Debug, Default)]
pub struct TickGate {
    carry_ms: f32,
}

impl TickGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed elapsed real milliseconds since the previous frame callback.
    /// Returns the step to apply once enough time has accumulated.
    pub fn feed(&mut self, delta_ms: f32) -> Option<f32> {
        if delta_ms > 0.0 {
            self.carry_ms += delta_ms;
        }
        if self.carry_ms >= MIN_STEP_MS {
            let step_ms = self.carry_ms;
            self.carry_ms = 0.0;
            Some(step_ms)
        } else {
            None
        }
    }

    /// Drop accumulated time (session teardown/restart)
    pub fn reset(&mut self) {
        self.carry_ms = 0.0;
    }
}

/// Advance every live fly by `delta_ms` real milliseconds.
///
/// Per fly: displace by heading scaled with the difficulty's speed
/// multiplier, reflect off the field boundary one axis at a time, then
/// occasionally resample the heading so motion stays organic instead of
/// billiard-ball.
pub fn step(state: &mut GameState, delta_ms: f32) {
    if state.phase != GamePhase::Running || delta_ms <= 0.0 {
        return;
    }

    let speed = state.difficulty.speed_multiplier();
    let tuning = state.tuning;
    let flies = &mut state.flies;
    let rng = &mut state.rng;

    for fly in flies.iter_mut() {
        let mut next = fly.pos + fly.heading * delta_ms * speed;

        if next.x <= 0.0 || next.x >= FIELD_MAX {
            fly.heading.x = -fly.heading.x;
            next.x = next.x.clamp(0.0, FIELD_MAX);
        }
        if next.y <= 0.0 || next.y >= FIELD_MAX {
            fly.heading.y = -fly.heading.y;
            next.y = next.y.clamp(0.0, FIELD_MAX);
        }
        fly.pos = next;

        if tuning.jitter_chance > 0.0 && rng.random::<f32>() < tuning.jitter_chance {
            fly.heading = random_heading(rng, tuning.heading_limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Difficulty, Fly};
    use glam::Vec2;
    use proptest::prelude::*;

    fn running_state(seed: u64, difficulty: Difficulty) -> GameState {
        let mut state = GameState::new(seed);
        assert!(state.start("test", difficulty));
        state
    }

    #[test]
    fn test_gate_coalesces_small_deltas() {
        let mut gate = TickGate::new();
        assert_eq!(gate.feed(5.0), None);
        assert_eq!(gate.feed(5.0), None);
        assert_eq!(gate.feed(5.0), None);
        // 20ms accumulated: released in full, nothing lost
        assert_eq!(gate.feed(5.0), Some(20.0));
        // Carry starts over afterwards
        assert_eq!(gate.feed(10.0), None);
    }

    #[test]
    fn test_gate_passes_large_deltas_through() {
        let mut gate = TickGate::new();
        assert_eq!(gate.feed(16.0), Some(16.0));
        assert_eq!(gate.feed(160.0), Some(160.0));
    }

    #[test]
    fn test_gate_reset_drops_carry() {
        let mut gate = TickGate::new();
        assert_eq!(gate.feed(10.0), None);
        gate.reset();
        assert_eq!(gate.feed(10.0), None);
    }

    #[test]
    fn test_step_only_runs_while_running() {
        let mut state = GameState::new(1);
        state.flies.push(Fly {
            id: 0,
            pos: Vec2::new(40.0, 40.0),
            heading: Vec2::new(0.01, 0.01),
        });
        // Still Idle: no movement
        step(&mut state, 100.0);
        assert_eq!(state.flies[0].pos, Vec2::new(40.0, 40.0));
    }

    #[test]
    fn test_displacement_is_framerate_independent() {
        // Ten 16ms steps against one 160ms step, jitter off, away from walls
        let mut fine = running_state(7, Difficulty::Medium);
        fine.tuning.jitter_chance = 0.0;
        fine.flies = vec![Fly {
            id: 0,
            pos: Vec2::new(40.0, 40.0),
            heading: Vec2::new(0.01, -0.02),
        }];
        let mut coarse = fine.clone();

        for _ in 0..10 {
            step(&mut fine, 16.0);
        }
        step(&mut coarse, 160.0);

        let a = fine.flies[0].pos;
        let b = coarse.flies[0].pos;
        assert!((a.x - b.x).abs() < 1e-4, "{a} vs {b}");
        assert!((a.y - b.y).abs() < 1e-4, "{a} vs {b}");
    }

    #[test]
    fn test_boundary_reflection_flips_heading() {
        let mut state = running_state(7, Difficulty::Medium);
        state.tuning.jitter_chance = 0.0;
        state.flies = vec![Fly {
            id: 0,
            pos: Vec2::new(79.9, 0.1),
            heading: Vec2::new(0.02, -0.02),
        }];

        step(&mut state, 16.0);

        let fly = &state.flies[0];
        assert!(fly.pos.x <= FIELD_MAX && fly.pos.y >= 0.0);
        // Both axes crossed, both headings point back inward
        assert!(fly.heading.x < 0.0);
        assert!(fly.heading.y > 0.0);
    }

    #[test]
    fn test_reflection_clamps_into_field() {
        let mut state = running_state(7, Difficulty::Hard);
        state.tuning.jitter_chance = 0.0;
        state.flies = vec![Fly {
            id: 0,
            pos: Vec2::new(79.0, 40.0),
            heading: Vec2::new(0.025, 0.0),
        }];

        // Large step overshoots the wall badly; position must still clamp
        step(&mut state, 500.0);
        let fly = &state.flies[0];
        assert!(fly.pos.x >= 0.0 && fly.pos.x <= FIELD_MAX);
        assert!(fly.heading.x < 0.0);
    }

    #[test]
    fn test_same_seed_same_motion() {
        let mut a = running_state(123, Difficulty::Hard);
        let mut b = running_state(123, Difficulty::Hard);
        for _ in 0..200 {
            step(&mut a, 16.0);
            step(&mut b, 16.0);
        }
        assert_eq!(a.flies, b.flies);
    }

    proptest! {
        #[test]
        fn positions_stay_in_field(
            seed in 0u64..1_000,
            deltas in proptest::collection::vec(0.0f32..100.0, 1..200),
        ) {
            let mut state = GameState::new(seed);
            prop_assume!(state.start("prop", Difficulty::Hard));
            for delta in deltas {
                step(&mut state, delta);
                for fly in &state.flies {
                    prop_assert!(fly.pos.x >= 0.0 && fly.pos.x <= FIELD_MAX);
                    prop_assert!(fly.pos.y >= 0.0 && fly.pos.y <= FIELD_MAX);
                }
            }
        }
    }
}
