//! Player settings and preferences
//!
//! Persisted separately from best scores in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::sim::{DifficultyPreset, GameConfig, Skin};

/// Player settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Gameplay ===
    pub difficulty: DifficultyPreset,
    pub skin: Skin,
    /// Allow one extra flap inside the flap cooldown
    pub double_jump: bool,
    /// Grid broad phase for the general collision pass
    pub broad_phase: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Pause and mute when the window loses focus
    pub pause_on_blur: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: DifficultyPreset::Normal,
            skin: Skin::Classic,
            double_jump: false,
            broad_phase: true,

            show_fps: false,

            master_volume: 0.8,
            sfx_volume: 1.0,
            pause_on_blur: true,
        }
    }
}

impl Settings {
    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "skyflap_settings";

    /// Effective sound effect gain
    pub fn sfx_gain(&self) -> f32 {
        self.master_volume * self.sfx_volume
    }

    /// Clamp volumes into range
    pub fn sanitize(&mut self) {
        for v in [&mut self.master_volume, &mut self.sfx_volume] {
            *v = if v.is_finite() { (*v).clamp(0.0, 1.0) } else { 1.0 };
        }
    }

    /// Component configuration these settings imply
    pub fn game_config(&self) -> GameConfig {
        let mut config = GameConfig::default();
        config.bird.double_jump_enabled = self.double_jump;
        config.collision.use_broad_phase = self.broad_phase;
        config
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("Settings saved");
                }
                Err(e) => log::error!("Failed to serialise settings: {e}"),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
