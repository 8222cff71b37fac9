//! Game state and per-run bookkeeping
//!
//! Owns every simulation component plus the seeded RNG. A seed and an
//! input sequence reproduce a run exactly.

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bird::{Bird, BirdConfig, FlapOutcome};
use super::collision::{CollisionConfig, CollisionEngine};
use super::obstacles::{Biome, Obstacle, ObstacleSpawner, SpawnerConfig};
use super::powerups::{ActiveEffects, Coin, Combo, PowerUp, PowerUpCombiner, PowerUpConfig, PowerUpKind};
use super::world::{Camera, World, WorldConfig};
use crate::error::SimResult;

/// Monotonic id source shared by obstacles, pickups and coins
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityIds {
    next: u32,
}

impl EntityIds {
    pub fn next_id(&mut self) -> u32 {
        self.next += 1;
        self.next
    }
}

/// Discrete notifications produced during a tick, drained by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Flap,
    DoubleJump,
    Scored { points: u64, total: u64 },
    PowerUpCollected { kind: PowerUpKind },
    ComboActivated { combo: Combo },
    CoinCollected { total: u32 },
    /// A deadly obstacle was touched while shielded or invulnerable
    ShieldBlocked { obstacle_id: u32 },
    BiomeChanged { biome: Biome },
    Died { score: u64 },
    NewBest { score: u64 },
}

/// Per-run counters for HUD and achievements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub score: u64,
    pub pipes_passed: u32,
    pub jumps: u32,
    pub distance: f32,
    pub time_alive_ms: f64,
    pub power_ups_used: u32,
    pub shields_used: u32,
    pub combos_triggered: u32,
    pub coins_collected: u32,
}

/// Component configuration for a fresh state
#[derive(Debug, Clone, Default)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub bird: BirdConfig,
    pub collision: CollisionConfig,
    pub power_ups: PowerUpConfig,
}

/// Render-facing view of the state
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub score: u64,
    pub best_score: u64,
    pub time_ms: f64,
    pub biome: Biome,
    pub difficulty: f32,
    pub camera: Camera,
    pub bird: &'a Bird,
    pub obstacles: &'a [Obstacle],
    pub power_ups: &'a [PowerUp],
    pub coins: &'a [Coin],
    pub effects: &'a ActiveEffects,
}

#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub world: World,
    pub bird: Bird,
    pub spawner: ObstacleSpawner,
    pub power_ups: PowerUpCombiner,
    pub collisions: CollisionEngine,
    pub score: u64,
    /// Best score seen, including the current run
    pub best_score: u64,
    pub pipes_passed: u32,
    /// Simulated time since the run started
    pub time_ms: f64,
    pub time_ticks: u64,
    pub ids: EntityIds,
    pub(super) rng: Pcg32,
    pub(super) events: Vec<GameEvent>,
    /// Obstacles touched while exempt during the previous tick
    pub(super) shielded_contacts: BTreeSet<u32>,
    /// Best score when this run started
    best_at_start: u64,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, GameConfig::default())
    }

    pub fn with_config(seed: u64, config: GameConfig) -> Self {
        let world = World::new(config.world);
        let bird = Bird::new(config.bird, &world.params);
        let spawner = ObstacleSpawner::new(SpawnerConfig::for_world(&world.params));
        Self {
            seed,
            bird,
            spawner,
            power_ups: PowerUpCombiner::new(config.power_ups),
            collisions: CollisionEngine::new(config.collision),
            world,
            score: 0,
            best_score: 0,
            pipes_passed: 0,
            time_ms: 0.0,
            time_ticks: 0,
            ids: EntityIds::default(),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            shielded_contacts: BTreeSet::new(),
            best_at_start: 0,
        }
    }

    /// Start a new run with `seed`, keeping world settings, skin and best score
    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.world.update_difficulty(0);
        self.bird.reset(&self.world.params);
        self.spawner.config = SpawnerConfig::for_world(&self.world.params);
        self.spawner.reset();
        self.power_ups.reset();
        self.collisions.reset();
        self.score = 0;
        self.pipes_passed = 0;
        self.time_ms = 0.0;
        self.time_ticks = 0;
        self.ids = EntityIds::default();
        self.events.clear();
        self.shielded_contacts.clear();
        self.best_at_start = self.best_score;
        log::info!("New run, seed {seed:#x}");
    }

    /// Flap input; the outcome is also queued as an event
    pub fn flap(&mut self) -> FlapOutcome {
        let outcome = self.bird.flap(self.time_ms, &self.world.params);
        match outcome {
            FlapOutcome::Flap => self.events.push(GameEvent::Flap),
            FlapOutcome::DoubleJump => self.events.push(GameEvent::DoubleJump),
            FlapOutcome::Ignored => {}
        }
        outcome
    }

    pub fn add_score(&mut self, points: u64) {
        if points == 0 {
            return;
        }
        self.score += points;
        self.best_score = self.best_score.max(self.score);
        self.events.push(GameEvent::Scored {
            points,
            total: self.score,
        });
    }

    /// Kill the bird and queue the end-of-run events. No-op when already dead.
    pub fn end_run(&mut self) {
        if !self.bird.alive {
            return;
        }
        self.bird.kill();
        self.events.push(GameEvent::Died { score: self.score });
        if self.score > self.best_at_start {
            self.events.push(GameEvent::NewBest { score: self.score });
        }
    }

    pub fn is_new_best(&self) -> bool {
        self.score > self.best_at_start
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats(&self) -> RunStats {
        let counters = &self.power_ups.counters;
        RunStats {
            score: self.score,
            pipes_passed: self.pipes_passed,
            jumps: self.bird.streak.jumps,
            distance: self.bird.streak.distance,
            time_alive_ms: self.bird.streak.time_alive_ms,
            power_ups_used: counters.power_ups_used,
            shields_used: counters.shields_used,
            combos_triggered: counters.combos_triggered,
            coins_collected: counters.coins_collected,
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            score: self.score,
            best_score: self.best_score,
            time_ms: self.time_ms,
            biome: self.spawner.biome(),
            difficulty: self.world.difficulty_multiplier(),
            camera: self.world.camera,
            bird: &self.bird,
            obstacles: self.spawner.obstacles(),
            power_ups: self.power_ups.power_ups(),
            coins: self.power_ups.coins(),
            effects: &self.power_ups.effects,
        }
    }

    pub fn snapshot_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }
}
