//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Elapsed time is passed in, never read from a clock
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod state;
pub mod tick;

pub use state::{Difficulty, Fly, GamePhase, GameState, MotionTuning, spawn_batch};
pub use tick::{TickGate, step};
