//! World parameters, difficulty scaling and the camera transform
//!
//! `World` is the single source of truth for physics constants. Everything
//! else reads from it each tick; nothing but presets, explicit physics
//! updates, resizes and difficulty scaling writes to it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult, require_negative, require_positive};

/// Distance of the ground and ceiling from the world edges
pub const BOUNDS_INSET: f32 = 20.0;

/// Size the world is laid out for before any resize
pub const DESIGN_WIDTH: f32 = 480.0;
pub const DESIGN_HEIGHT: f32 = 640.0;

/// Named physics presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
    Insane,
}

/// The constant tuple a preset installs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetPhysics {
    pub gravity: f32,
    pub jump_power: f32,
    pub pipe_gap: f32,
    pub game_speed: f32,
    pub max_fall_speed: f32,
}

impl DifficultyPreset {
    pub const ALL: [DifficultyPreset; 4] = [
        DifficultyPreset::Easy,
        DifficultyPreset::Normal,
        DifficultyPreset::Hard,
        DifficultyPreset::Insane,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "easy",
            DifficultyPreset::Normal => "normal",
            DifficultyPreset::Hard => "hard",
            DifficultyPreset::Insane => "insane",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "normal" | "medium" => Some(DifficultyPreset::Normal),
            "hard" => Some(DifficultyPreset::Hard),
            "insane" => Some(DifficultyPreset::Insane),
            _ => None,
        }
    }

    pub fn physics(&self) -> PresetPhysics {
        match self {
            DifficultyPreset::Easy => PresetPhysics {
                gravity: 0.4,
                jump_power: -7.5,
                pipe_gap: 170.0,
                game_speed: 2.5,
                max_fall_speed: 9.0,
            },
            DifficultyPreset::Normal => PresetPhysics {
                gravity: 0.5,
                jump_power: -8.0,
                pipe_gap: 140.0,
                game_speed: 3.0,
                max_fall_speed: 10.0,
            },
            DifficultyPreset::Hard => PresetPhysics {
                gravity: 0.6,
                jump_power: -8.5,
                pipe_gap: 120.0,
                game_speed: 3.6,
                max_fall_speed: 11.0,
            },
            DifficultyPreset::Insane => PresetPhysics {
                gravity: 0.7,
                jump_power: -9.0,
                pipe_gap: 100.0,
                game_speed: 4.5,
                max_fall_speed: 12.0,
            },
        }
    }
}

/// Physics and layout constants shared by every subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldParameters {
    pub width: f32,
    pub height: f32,
    /// Downward acceleration (px / frame²)
    pub gravity: f32,
    /// Vertical velocity set by a flap; negative is up
    pub jump_power: f32,
    /// Scroll speed (px / frame)
    pub game_speed: f32,
    pub pipe_width: f32,
    pub pipe_gap: f32,
    /// Obstacle spawn density multiplier
    pub pipe_spawn_rate: f32,
    pub bird_radius: f32,
    pub bird_max_fall_speed: f32,
    /// Per-tick probability of a power-up spawn attempt
    pub power_up_spawn_rate: f32,
    /// Per-tick probability of a coin spawn attempt
    pub coin_spawn_rate: f32,
}

impl Default for WorldParameters {
    fn default() -> Self {
        let physics = DifficultyPreset::Normal.physics();
        Self {
            width: DESIGN_WIDTH,
            height: DESIGN_HEIGHT,
            gravity: physics.gravity,
            jump_power: physics.jump_power,
            game_speed: physics.game_speed,
            pipe_width: 64.0,
            pipe_gap: physics.pipe_gap,
            pipe_spawn_rate: 1.0,
            bird_radius: 12.0,
            bird_max_fall_speed: physics.max_fall_speed,
            power_up_spawn_rate: 0.004,
            coin_spawn_rate: 0.012,
        }
    }
}

impl WorldParameters {
    /// Check the invariants every consumer relies on
    pub fn validate(&self) -> SimResult<()> {
        require_positive("gravity", self.gravity)?;
        require_negative("jump_power", self.jump_power)?;
        require_positive("pipe_gap", self.pipe_gap)?;
        require_positive("game_speed", self.game_speed)?;
        require_positive("bird_max_fall_speed", self.bird_max_fall_speed)?;
        Ok(())
    }
}

/// Partial physics override; `None` fields are left alone
#[derive(Debug, Clone, Default)]
pub struct PhysicsPatch {
    pub gravity: Option<f32>,
    pub jump_power: Option<f32>,
    pub game_speed: Option<f32>,
    pub pipe_gap: Option<f32>,
    pub pipe_spawn_rate: Option<f32>,
    pub bird_max_fall_speed: Option<f32>,
}

/// Tuning for difficulty scaling and screen fitting
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Multiplier gained per point of score
    pub difficulty_rate: f32,
    /// Ceiling for the difficulty multiplier
    pub max_difficulty: f32,
    /// Cap applied to the spawn-rate share of the multiplier
    pub max_spawn_multiplier: f32,
    /// Share of the multiplier applied to gravity
    pub gravity_scaling: f32,
    pub auto_fit: bool,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            difficulty_rate: 0.02,
            max_difficulty: 2.5,
            max_spawn_multiplier: 2.0,
            gravity_scaling: 0.3,
            auto_fit: true,
            min_scale: 0.5,
            max_scale: 3.0,
        }
    }
}

/// Values difficulty scaling is computed from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct DifficultyBase {
    gravity: f32,
    game_speed: f32,
    pipe_spawn_rate: f32,
}

impl DifficultyBase {
    fn capture(params: &WorldParameters) -> Self {
        Self {
            gravity: params.gravity,
            game_speed: params.game_speed,
            pipe_spawn_rate: params.pipe_spawn_rate,
        }
    }
}

/// World-to-screen transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub scale: f32,
    /// World position shown at the screen origin
    pub offset: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct World {
    pub params: WorldParameters,
    pub config: WorldConfig,
    pub camera: Camera,
    preset: DifficultyPreset,
    base: DifficultyBase,
    difficulty_multiplier: f32,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        let params = WorldParameters::default();
        let base = DifficultyBase::capture(&params);
        Self {
            params,
            config,
            camera: Camera::default(),
            preset: DifficultyPreset::Normal,
            base,
            difficulty_multiplier: 1.0,
        }
    }

    pub fn with_preset(preset: DifficultyPreset) -> Self {
        let mut world = Self::default();
        world.apply_preset(preset);
        world
    }

    pub fn preset(&self) -> DifficultyPreset {
        self.preset
    }

    pub fn difficulty_multiplier(&self) -> f32 {
        self.difficulty_multiplier
    }

    /// Y coordinate of the ground surface
    #[inline]
    pub fn ground_y(&self) -> f32 {
        self.params.height - BOUNDS_INSET
    }

    /// Y coordinate of the ceiling
    #[inline]
    pub fn ceiling_y(&self) -> f32 {
        BOUNDS_INSET
    }

    /// Vertical space between ceiling and ground
    #[inline]
    pub fn playable_height(&self) -> f32 {
        self.ground_y() - self.ceiling_y()
    }

    /// Install a preset's constants. The preset becomes the new difficulty base.
    pub fn apply_preset(&mut self, preset: DifficultyPreset) {
        let physics = preset.physics();
        self.params.gravity = physics.gravity;
        self.params.jump_power = physics.jump_power;
        self.params.pipe_gap = physics.pipe_gap;
        self.params.game_speed = physics.game_speed;
        self.params.bird_max_fall_speed = physics.max_fall_speed;
        self.params.pipe_spawn_rate = self.base.pipe_spawn_rate;
        self.preset = preset;
        self.base = DifficultyBase::capture(&self.params);
        self.difficulty_multiplier = 1.0;
        log::info!("Applied {} preset", preset.as_str());
    }

    pub fn apply_preset_named(&mut self, name: &str) -> SimResult<()> {
        let preset = DifficultyPreset::from_str(name)
            .ok_or_else(|| SimError::UnknownPreset(name.to_string()))?;
        self.apply_preset(preset);
        Ok(())
    }

    /// Apply an explicit physics override. Rejected patches leave the world untouched.
    pub fn update_physics(&mut self, patch: &PhysicsPatch) -> SimResult<()> {
        let mut next = self.params.clone();
        if let Some(v) = patch.gravity {
            next.gravity = v;
        }
        if let Some(v) = patch.jump_power {
            next.jump_power = v;
        }
        if let Some(v) = patch.game_speed {
            next.game_speed = v;
        }
        if let Some(v) = patch.pipe_gap {
            next.pipe_gap = v;
        }
        if let Some(v) = patch.pipe_spawn_rate {
            next.pipe_spawn_rate = v;
        }
        if let Some(v) = patch.bird_max_fall_speed {
            next.bird_max_fall_speed = v;
        }
        next.validate()?;

        self.params = next;
        self.base = DifficultyBase::capture(&self.params);
        self.difficulty_multiplier = 1.0;
        Ok(())
    }

    /// Multiplier for a given score (pure)
    pub fn difficulty_for_score(&self, score: u64) -> f32 {
        (1.0 + score as f32 * self.config.difficulty_rate).min(self.config.max_difficulty)
    }

    /// Re-derive speed, spawn rate and gravity from the base values
    pub fn update_difficulty(&mut self, score: u64) -> f32 {
        let m = self.difficulty_for_score(score);
        self.difficulty_multiplier = m;
        self.params.game_speed = self.base.game_speed * m;
        self.params.pipe_spawn_rate =
            self.base.pipe_spawn_rate * m.min(self.config.max_spawn_multiplier);
        self.params.gravity = self.base.gravity * (1.0 + (m - 1.0) * self.config.gravity_scaling);
        m
    }

    /// Fit the world to a new screen size
    pub fn resize(&mut self, screen_width: f32, screen_height: f32) {
        if !(screen_width > 0.0 && screen_height > 0.0) {
            log::warn!("Ignoring resize to {}x{}", screen_width, screen_height);
            return;
        }

        if self.config.auto_fit {
            let fit = (screen_width / DESIGN_WIDTH).min(screen_height / DESIGN_HEIGHT);
            self.camera.scale = fit.clamp(self.config.min_scale, self.config.max_scale);
        }

        self.params.width = screen_width / self.camera.scale;
        self.params.height = screen_height / self.camera.scale;
        log::debug!(
            "World resized to {:.0}x{:.0} (scale {:.2})",
            self.params.width,
            self.params.height,
            self.camera.scale
        );
    }

    pub fn world_to_screen(&self, p: Vec2) -> Vec2 {
        (p - self.camera.offset) * self.camera.scale
    }

    pub fn screen_to_world(&self, p: Vec2) -> Vec2 {
        p / self.camera.scale + self.camera.offset
    }
}
