//! Sound cues
//!
//! The simulation never plays audio itself. Hosts drain [`GameEvent`]s,
//! map them with [`sound_for_event`] and hand the result to an
//! [`AudioSink`].

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    Flap,
    DoubleJump,
    /// Gap passed
    Score,
    PowerUp,
    Combo,
    Coin,
    /// Hazard absorbed by shield or invulnerability
    ShieldHit,
    BiomeChange,
    Death,
    /// New best score
    HighScore,
}

impl SoundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundKind::Flap => "flap",
            SoundKind::DoubleJump => "double_jump",
            SoundKind::Score => "score",
            SoundKind::PowerUp => "power_up",
            SoundKind::Combo => "combo",
            SoundKind::Coin => "coin",
            SoundKind::ShieldHit => "shield_hit",
            SoundKind::BiomeChange => "biome_change",
            SoundKind::Death => "death",
            SoundKind::HighScore => "high_score",
        }
    }
}

/// Map a game event to its cue
pub fn sound_for_event(event: &GameEvent) -> SoundKind {
    match event {
        GameEvent::Flap => SoundKind::Flap,
        GameEvent::DoubleJump => SoundKind::DoubleJump,
        GameEvent::Scored { .. } => SoundKind::Score,
        GameEvent::PowerUpCollected { .. } => SoundKind::PowerUp,
        GameEvent::ComboActivated { .. } => SoundKind::Combo,
        GameEvent::CoinCollected { .. } => SoundKind::Coin,
        GameEvent::ShieldBlocked { .. } => SoundKind::ShieldHit,
        GameEvent::BiomeChanged { .. } => SoundKind::BiomeChange,
        GameEvent::Died { .. } => SoundKind::Death,
        GameEvent::NewBest { .. } => SoundKind::HighScore,
    }
}

/// Something that can play cues
pub trait AudioSink {
    fn play_sound(&mut self, sound: SoundKind);

    fn set_volume(&mut self, _gain: f32) {}

    fn set_muted(&mut self, _muted: bool) {}

    /// Play the cue for every event, in order
    fn play_events(&mut self, events: &[GameEvent]) {
        for event in events {
            self.play_sound(sound_for_event(event));
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_sound(&mut self, _sound: SoundKind) {}
}

/// Logs cues at debug level; used by the headless runner
#[derive(Debug, Clone)]
pub struct LogAudio {
    gain: f32,
    muted: bool,
    played: u64,
}

impl Default for LogAudio {
    fn default() -> Self {
        Self {
            gain: 1.0,
            muted: false,
            played: 0,
        }
    }
}

impl LogAudio {
    pub fn played(&self) -> u64 {
        self.played
    }
}

impl AudioSink for LogAudio {
    fn play_sound(&mut self, sound: SoundKind) {
        if self.muted || self.gain <= 0.0 {
            return;
        }
        self.played += 1;
        log::debug!("♪ {} (gain {:.2})", sound.as_str(), self.gain);
    }

    fn set_volume(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Combo, PowerUpKind};

    #[test]
    fn test_event_mapping() {
        assert_eq!(sound_for_event(&GameEvent::Flap), SoundKind::Flap);
        assert_eq!(
            sound_for_event(&GameEvent::ComboActivated {
                combo: Combo::GodMode
            }),
            SoundKind::Combo
        );
        assert_eq!(
            sound_for_event(&GameEvent::PowerUpCollected {
                kind: PowerUpKind::Shield
            }),
            SoundKind::PowerUp
        );
        assert_eq!(sound_for_event(&GameEvent::NewBest { score: 3 }), SoundKind::HighScore);
    }

    #[test]
    fn test_log_audio_respects_mute() {
        let mut audio = LogAudio::default();
        audio.play_events(&[GameEvent::Flap, GameEvent::Died { score: 0 }]);
        assert_eq!(audio.played(), 2);

        audio.set_muted(true);
        audio.play_sound(SoundKind::Coin);
        audio.set_muted(false);
        audio.set_volume(0.0);
        audio.play_sound(SoundKind::Coin);
        assert_eq!(audio.played(), 2);
    }
}
