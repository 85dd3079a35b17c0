//! Session state and core simulation types

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::ranking::SubmitRequest;

/// Current phase of a play session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for the player to start
    Idle,
    /// Active gameplay, timer running
    Running,
    /// Every fly caught; timer frozen
    Complete,
}

/// Difficulty tier selecting fly count and speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Key used on the ranking service wire and in URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Flies spawned at session start
    pub fn fly_count(&self) -> u32 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Medium => 8,
            Difficulty::Hard => 12,
        }
    }

    /// Multiplier applied to every heading at simulation time.
    /// Spawn headings are difficulty-independent; only stepping scales.
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 1.5,
        }
    }
}

/// A catchable fly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fly {
    /// Stable within a session, assigned at spawn
    pub id: u32,
    /// Position in [0, FIELD_MAX] per axis (percent of the playfield)
    pub pos: Vec2,
    /// Velocity in field units per millisecond
    pub heading: Vec2,
}

/// Tunable motion constants, kept out of the stepping code so tests and
/// balancing can adjust them
#[derive(Debug, Clone, Copy)]
pub struct MotionTuning {
    /// Largest absolute heading component (units per ms)
    pub heading_limit: f32,
    /// Per-fly re-heading probability per applied step
    pub jitter_chance: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            heading_limit: HEADING_LIMIT,
            jitter_chance: JITTER_CHANCE,
        }
    }
}

/// Sample a heading with both components uniform in [-limit, +limit]
pub(crate) fn random_heading(rng: &mut Pcg32, limit: f32) -> Vec2 {
    Vec2::new(
        rng.random_range(-limit..=limit),
        rng.random_range(-limit..=limit),
    )
}

/// Spawn `count` flies with ids `0..count-1`, positions uniform in
/// [0, bounds) per axis and randomized headings. Pure aside from consuming
/// RNG state.
pub fn spawn_batch(count: u32, bounds: f32, heading_limit: f32, rng: &mut Pcg32) -> Vec<Fly> {
    (0..count)
        .map(|id| Fly {
            id,
            pos: Vec2::new(
                rng.random_range(0.0..bounds),
                rng.random_range(0.0..bounds),
            ),
            heading: random_heading(rng, heading_limit),
        })
        .collect()
}

/// Complete session state
///
/// Owns the live fly set, the elapsed timer and the session RNG. All
/// mutation goes through `start` / `accrue_time` / `catch` (plus
/// `tick::step`), each of which is one atomic update; callers serialize
/// them against each other.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    pub difficulty: Difficulty,
    /// Name submitted with the completion record
    pub player: String,
    /// Seconds accumulated while Running; frozen on Complete
    pub elapsed_secs: f32,
    /// Live flies, removed individually as they are caught
    pub flies: Vec<Fly>,
    pub tuning: MotionTuning,
    /// Completion record already handed out for this session
    submitted: bool,
    pub(crate) rng: Pcg32,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            phase: GamePhase::Idle,
            difficulty: Difficulty::default(),
            player: String::new(),
            elapsed_secs: 0.0,
            flies: Vec::new(),
            tuning: MotionTuning::default(),
            submitted: false,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Begin a fresh session. Valid from `Idle` or `Complete`; rejected
    /// mid-session and with an empty player name.
    pub fn start(&mut self, player: &str, difficulty: Difficulty) -> bool {
        if self.phase == GamePhase::Running {
            log::warn!("start ignored: session already running");
            return false;
        }
        let player = player.trim();
        if player.is_empty() {
            log::warn!("start ignored: empty player name");
            return false;
        }

        self.player = player.to_string();
        self.difficulty = difficulty;
        self.elapsed_secs = 0.0;
        self.submitted = false;
        self.flies = spawn_batch(
            difficulty.fly_count(),
            FIELD_MAX,
            self.tuning.heading_limit,
            &mut self.rng,
        );
        self.phase = GamePhase::Running;

        log::info!(
            "Session started: {} flies on {}",
            self.flies.len(),
            difficulty.as_str()
        );
        true
    }

    /// Accumulate elapsed play time. Only counts while Running.
    pub fn accrue_time(&mut self, delta_secs: f32) {
        if self.phase == GamePhase::Running && delta_secs > 0.0 {
            self.elapsed_secs += delta_secs;
        }
    }

    /// Remove one fly by id. Unknown ids (already caught, duplicate click
    /// events) are silently ignored. Returns true when this catch emptied
    /// the field and completed the session.
    pub fn catch(&mut self, id: u32) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }

        let before = self.flies.len();
        self.flies.retain(|f| f.id != id);
        if self.flies.len() == before {
            return false;
        }

        if self.flies.is_empty() {
            self.phase = GamePhase::Complete;
            log::info!(
                "Session complete: {:.1}s on {}",
                self.elapsed_secs,
                self.difficulty.as_str()
            );
            return true;
        }
        false
    }

    /// Completion record for the ranking service, handed out at most once
    /// per completed session. The caller owns delivery; there is no retry
    /// and failure does not re-offer the record.
    pub fn take_submission(&mut self) -> Option<SubmitRequest> {
        if self.phase != GamePhase::Complete || self.submitted {
            return None;
        }
        self.submitted = true;
        Some(SubmitRequest {
            username: self.player.clone(),
            time: (self.elapsed_secs * 10.0).round() / 10.0,
            difficulty: self.difficulty.as_str().to_string(),
        })
    }

    pub fn flies_left(&self) -> usize {
        self.flies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_spawns_per_difficulty() {
        let mut state = GameState::new(12345);
        assert_eq!(state.phase, GamePhase::Idle);

        assert!(state.start("anna", Difficulty::Easy));
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.flies_left(), 5);
        assert_eq!(state.elapsed_secs, 0.0);

        let ids: Vec<u32> = state.flies.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_spawn_positions_within_field() {
        let mut rng = Pcg32::seed_from_u64(7);
        let flies = spawn_batch(50, FIELD_MAX, HEADING_LIMIT, &mut rng);
        for fly in &flies {
            assert!(fly.pos.x >= 0.0 && fly.pos.x <= FIELD_MAX);
            assert!(fly.pos.y >= 0.0 && fly.pos.y <= FIELD_MAX);
            assert!(fly.heading.x.abs() <= HEADING_LIMIT);
            assert!(fly.heading.y.abs() <= HEADING_LIMIT);
        }
    }

    #[test]
    fn test_start_rejected_without_name() {
        let mut state = GameState::new(1);
        assert!(!state.start("", Difficulty::Easy));
        assert!(!state.start("   ", Difficulty::Easy));
        assert_eq!(state.phase, GamePhase::Idle);
        assert!(state.flies.is_empty());
    }

    #[test]
    fn test_start_rejected_while_running() {
        let mut state = GameState::new(1);
        assert!(state.start("anna", Difficulty::Medium));
        state.accrue_time(2.5);
        assert!(!state.start("anna", Difficulty::Hard));
        assert_eq!(state.difficulty, Difficulty::Medium);
        assert_eq!(state.elapsed_secs, 2.5);
    }

    #[test]
    fn test_catch_is_idempotent() {
        let mut state = GameState::new(99);
        state.start("anna", Difficulty::Easy);

        assert!(!state.catch(2));
        let after_first = state.flies.clone();
        assert_eq!(after_first.len(), 4);

        // Duplicate click on the same fly changes nothing
        assert!(!state.catch(2));
        assert_eq!(state.flies, after_first);
    }

    #[test]
    fn test_catch_unknown_id_is_noop() {
        let mut state = GameState::new(99);
        state.start("anna", Difficulty::Easy);
        let before = state.flies.clone();

        assert!(!state.catch(999));
        assert_eq!(state.flies, before);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_complete_exactly_on_last_catch() {
        let mut state = GameState::new(5);
        state.start("anna", Difficulty::Easy);
        state.accrue_time(3.0);

        for id in 0..4 {
            assert!(!state.catch(id));
            assert_eq!(state.phase, GamePhase::Running);
        }
        assert!(state.catch(4));
        assert_eq!(state.phase, GamePhase::Complete);
        assert_eq!(state.flies_left(), 0);
    }

    #[test]
    fn test_elapsed_frozen_after_complete() {
        let mut state = GameState::new(5);
        state.start("anna", Difficulty::Easy);
        state.accrue_time(4.2);
        for id in 0..5 {
            state.catch(id);
        }
        assert_eq!(state.phase, GamePhase::Complete);

        state.accrue_time(10.0);
        assert!((state.elapsed_secs - 4.2).abs() < 1e-6);

        // Catches after completion are no-ops too
        assert!(!state.catch(0));
    }

    #[test]
    fn test_one_submission_per_session() {
        let mut state = GameState::new(5);
        let mut submissions = 0;

        for _ in 0..2 {
            state.start("anna", Difficulty::Easy);
            state.accrue_time(1.0);
            for id in 0..5 {
                state.catch(id);
            }
            if state.take_submission().is_some() {
                submissions += 1;
            }
            // Second take in the same session yields nothing
            assert!(state.take_submission().is_none());
        }

        assert_eq!(submissions, 2);
    }

    #[test]
    fn test_submission_contents_and_rounding() {
        let mut state = GameState::new(5);
        state.start("anna", Difficulty::Hard);
        state.accrue_time(12.34);
        let ids: Vec<u32> = state.flies.iter().map(|f| f.id).collect();
        for id in ids {
            state.catch(id);
        }

        let record = state.take_submission().expect("completed session");
        assert_eq!(record.username, "anna");
        assert_eq!(record.difficulty, "hard");
        assert!((record.time - 12.3).abs() < 1e-6);
    }

    #[test]
    fn test_no_submission_before_complete() {
        let mut state = GameState::new(5);
        assert!(state.take_submission().is_none());
        state.start("anna", Difficulty::Easy);
        assert!(state.take_submission().is_none());
    }

    #[test]
    fn test_same_seed_same_spawn() {
        let mut a = GameState::new(4242);
        let mut b = GameState::new(4242);
        a.start("anna", Difficulty::Hard);
        b.start("anna", Difficulty::Hard);
        assert_eq!(a.flies, b.flies);
    }
}
