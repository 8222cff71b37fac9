//! Skyflap - a side-scrolling bird game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bird, obstacles, power-ups, collisions)
//! - `scheduler`: Host-driven frame timing
//! - `session`: Phase machine, state and settings wired together
//! - `settings` / `highscores`: LocalStorage-backed preferences and best scores
//! - `audio`: Sound cues derived from game events

pub mod audio;
pub mod error;
pub mod highscores;
pub mod ring;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{SimError, SimResult};
pub use highscores::BestScores;
pub use scheduler::{FrameTiming, GameLoopScheduler, SchedulerConfig};
pub use session::Session;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Velocities are expressed per reference frame (60 Hz)
    pub const REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;

    /// Bird spawn point
    pub const BIRD_START: Vec2 = Vec2::new(60.0, 240.0);
}

/// Convert a millisecond delta into reference frames
#[inline]
pub fn frames(delta_ms: f32) -> f32 {
    delta_ms / consts::REFERENCE_FRAME_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames() {
        assert!((frames(consts::REFERENCE_FRAME_MS) - 1.0).abs() < 1e-6);
        assert_eq!(frames(0.0), 0.0);
        assert!((frames(50.0) - 3.0).abs() < 1e-5);
    }
}
