//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod bird;
pub mod collision;
pub mod obstacles;
pub mod phase;
pub mod powerups;
pub mod state;
pub mod tick;
pub mod world;

pub use bird::{Bird, BirdConfig, FlapOutcome, Skin};
pub use collision::{CollisionConfig, CollisionEngine, CollisionEvent, CollisionResult, Shape};
pub use obstacles::{Biome, Obstacle, ObstacleKind, ObstaclePattern, ObstacleSpawner, SpawnerConfig};
pub use phase::{GamePhase, GameStateMachine};
pub use powerups::{Coin, Combo, PowerUp, PowerUpCombiner, PowerUpConfig, PowerUpKind};
pub use state::{GameConfig, GameEvent, GameState, RunStats};
pub use tick::{TickInput, tick};
pub use world::{DifficultyPreset, PhysicsPatch, World, WorldConfig, WorldParameters};
