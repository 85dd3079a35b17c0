//! Fly Swat - a catch-the-flies browser minigame
//!
//! Core modules:
//! - `sim`: Deterministic simulation (fly motion, session state machine)
//! - `ranking`: Remote ranking service client (best times per difficulty)
//! - `settings`: Remembered start-form inputs
//!
//! The simulation is platform-free and seeded; everything browser-specific
//! lives in the binary entry point.

pub mod ranking;
pub mod settings;
pub mod sim;

pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Playfield upper bound per axis, in percent of the bounding box.
    /// Stops short of 100 so a fly sprite stays fully visible.
    pub const FIELD_MAX: f32 = 80.0;

    /// Largest absolute heading component at spawn and re-heading,
    /// in field units per millisecond
    pub const HEADING_LIMIT: f32 = 0.025;

    /// Per-fly chance of resampling its heading on an applied step
    pub const JITTER_CHANCE: f32 = 0.01;

    /// Minimum real time between applied simulation steps (~60 steps/sec cap)
    pub const MIN_STEP_MS: f32 = 16.0;

    /// Cadence of the elapsed-time timer in milliseconds
    pub const TIMER_PERIOD_MS: i32 = 100;

    /// Ranking service base URL
    pub const API_BASE_URL: &str = "/api";
}
