//! Power-up pickups, coins and two-in-a-row combos
//!
//! Two pickups forming a known pair inside the bird's combo window activate
//! a compound effect instead of the second pickup's own effect.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bird::Bird;
use super::collision::circle_circle;
use super::obstacles::Biome;
use super::state::EntityIds;
use super::world::World;
use crate::frames;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    Shield,
    Slow,
    Score,
    Magnet,
    Double,
    Rainbow,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::Shield,
        PowerUpKind::Slow,
        PowerUpKind::Score,
        PowerUpKind::Magnet,
        PowerUpKind::Double,
        PowerUpKind::Rainbow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Shield => "shield",
            PowerUpKind::Slow => "slow",
            PowerUpKind::Score => "score",
            PowerUpKind::Magnet => "magnet",
            PowerUpKind::Double => "double",
            PowerUpKind::Rainbow => "rainbow",
        }
    }
}

/// Compound effects from two consecutive pickups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combo {
    /// Shield + Slow
    SuperMode,
    /// Magnet + Double
    MegaMode,
    /// Rainbow + Shield
    GodMode,
}

impl Combo {
    /// Order-independent lookup
    pub fn from_pair(a: PowerUpKind, b: PowerUpKind) -> Option<Combo> {
        use PowerUpKind::*;
        match (a, b) {
            (Shield, Slow) | (Slow, Shield) => Some(Combo::SuperMode),
            (Magnet, Double) | (Double, Magnet) => Some(Combo::MegaMode),
            (Rainbow, Shield) | (Shield, Rainbow) => Some(Combo::GodMode),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Combo::SuperMode => "super mode",
            Combo::MegaMode => "mega mode",
            Combo::GodMode => "god mode",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub pos: Vec2,
    pub kind: PowerUpKind,
    pub collected: bool,
    /// Drives the bob/pulse animation
    pub anim_time_ms: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub id: u32,
    pub pos: Vec2,
    pub collected: bool,
    pub spin_ms: f32,
}

#[derive(Debug, Clone)]
pub struct PowerUpConfig {
    pub max_power_ups: usize,
    pub max_coins: usize,
    pub pickup_radius: f32,
    pub coin_radius: f32,
    /// Spawn line, relative to the bird
    pub spawn_distance: f32,
    /// Prune line, relative to the bird
    pub despawn_distance: f32,
    /// Keeps spawns away from ceiling and ground
    pub spawn_margin: f32,
    /// Magnet pull speed (px / frame)
    pub magnet_pull_speed: f32,
    pub slow_duration_ms: f32,
    /// Scroll factor while slow-motion is active
    pub slow_factor: f32,
    pub double_duration_ms: f32,
    pub rainbow_duration_ms: f32,
    pub score_pickup_points: u64,
    pub super_shield_ms: f32,
    pub super_slow_ms: f32,
    pub mega_magnet_ms: f32,
    pub mega_duration_ms: f32,
    pub god_duration_ms: f32,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            max_power_ups: 3,
            max_coins: 8,
            pickup_radius: 14.0,
            coin_radius: 10.0,
            spawn_distance: 440.0,
            despawn_distance: -100.0,
            spawn_margin: 40.0,
            magnet_pull_speed: 6.0,
            slow_duration_ms: 5000.0,
            slow_factor: 0.5,
            double_duration_ms: 10_000.0,
            rainbow_duration_ms: 3000.0,
            score_pickup_points: 5,
            super_shield_ms: 10_000.0,
            super_slow_ms: 10_000.0,
            mega_magnet_ms: 15_000.0,
            mega_duration_ms: 15_000.0,
            god_duration_ms: 10_000.0,
        }
    }
}

/// Effects owned by the combiner rather than the bird
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub slow_time_ms: f32,
    pub double_time_ms: f32,
    pub mega_time_ms: f32,
    pub rainbow_time_ms: f32,
}

impl ActiveEffects {
    fn tick(&mut self, delta_ms: f32) {
        self.slow_time_ms = (self.slow_time_ms - delta_ms).max(0.0);
        self.double_time_ms = (self.double_time_ms - delta_ms).max(0.0);
        self.mega_time_ms = (self.mega_time_ms - delta_ms).max(0.0);
        self.rainbow_time_ms = (self.rainbow_time_ms - delta_ms).max(0.0);
    }

    pub fn is_slow(&self) -> bool {
        self.slow_time_ms > 0.0
    }

    pub fn is_rainbow(&self) -> bool {
        self.rainbow_time_ms > 0.0
    }

    /// 3x during mega mode, 2x during double, else 1x
    pub fn score_multiplier(&self) -> u64 {
        if self.mega_time_ms > 0.0 {
            3
        } else if self.double_time_ms > 0.0 {
            2
        } else {
            1
        }
    }
}

/// Counters polled by the achievement layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerUpCounters {
    pub power_ups_used: u32,
    pub shields_used: u32,
    pub combos_triggered: u32,
    pub coins_collected: u32,
}

/// Result of collecting one pickup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collected {
    pub kind: PowerUpKind,
    pub combo: Option<Combo>,
    /// Points the caller should add to the score
    pub points: u64,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct PowerUpUpdate {
    pub collected: Vec<Collected>,
    pub coins: Vec<Vec2>,
}

#[derive(Debug, Clone, Default)]
pub struct PowerUpCombiner {
    pub config: PowerUpConfig,
    pub effects: ActiveEffects,
    pub counters: PowerUpCounters,
    power_ups: Vec<PowerUp>,
    coins: Vec<Coin>,
}

impl PowerUpCombiner {
    pub fn new(config: PowerUpConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        self.effects = ActiveEffects::default();
        self.counters = PowerUpCounters::default();
        self.power_ups.clear();
        self.coins.clear();
    }

    pub fn power_ups(&self) -> &[PowerUp] {
        &self.power_ups
    }

    pub fn power_ups_mut(&mut self) -> &mut [PowerUp] {
        &mut self.power_ups
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    /// Scroll factor from slow-motion
    pub fn speed_multiplier(&self) -> f32 {
        if self.effects.is_slow() {
            self.config.slow_factor
        } else {
            1.0
        }
    }

    pub fn spawn_power_up(&mut self, kind: PowerUpKind, pos: Vec2, ids: &mut EntityIds) -> Option<u32> {
        if self.power_ups.len() >= self.config.max_power_ups {
            return None;
        }
        let id = ids.next_id();
        self.power_ups.push(PowerUp {
            id,
            pos,
            kind,
            collected: false,
            anim_time_ms: 0.0,
        });
        log::debug!("Spawned {} power-up at ({:.0}, {:.0})", kind.as_str(), pos.x, pos.y);
        Some(id)
    }

    pub fn spawn_coin(&mut self, pos: Vec2, ids: &mut EntityIds) -> Option<u32> {
        if self.coins.len() >= self.config.max_coins {
            return None;
        }
        let id = ids.next_id();
        self.coins.push(Coin {
            id,
            pos,
            collected: false,
            spin_ms: 0.0,
        });
        Some(id)
    }

    /// Probabilistic spawns ahead of the bird
    fn process_spawning<R: Rng>(
        &mut self,
        bird_x: f32,
        world: &World,
        biome: Biome,
        rng: &mut R,
        ids: &mut EntityIds,
    ) {
        let x = bird_x + self.config.spawn_distance;
        let top = world.ceiling_y() + self.config.spawn_margin;
        let bottom = (world.ground_y() - self.config.spawn_margin).max(top);

        let chance = (world.params.power_up_spawn_rate * biome.power_up_bonus()).clamp(0.0, 1.0);
        if self.power_ups.len() < self.config.max_power_ups && rng.random_bool(chance as f64) {
            let kind = PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())];
            let y = rng.random_range(top..=bottom);
            self.spawn_power_up(kind, Vec2::new(x, y), ids);
        }

        let chance = world.params.coin_spawn_rate.clamp(0.0, 1.0);
        if self.coins.len() < self.config.max_coins && rng.random_bool(chance as f64) {
            let y = rng.random_range(top..=bottom);
            self.spawn_coin(Vec2::new(x, y), ids);
        }
    }

    /// Spawn, scroll, attract, collect and prune
    #[allow(clippy::too_many_arguments)]
    pub fn update<R: Rng>(
        &mut self,
        delta_ms: f32,
        scroll_speed: f32,
        bird: &mut Bird,
        world: &World,
        biome: Biome,
        rng: &mut R,
        ids: &mut EntityIds,
    ) -> PowerUpUpdate {
        self.effects.tick(delta_ms);
        self.process_spawning(bird.pos.x, world, biome, rng, ids);

        let f = frames(delta_ms);
        let dx = scroll_speed * f;
        let pull = self.config.magnet_pull_speed * f;
        let magnet_radius = bird.has_magnet.then(|| bird.magnet_radius());

        for p in &mut self.power_ups {
            p.pos.x -= dx;
            p.anim_time_ms += delta_ms;
            if let Some(radius) = magnet_radius {
                attract(&mut p.pos, bird.pos, radius, pull);
            }
        }
        for c in &mut self.coins {
            c.pos.x -= dx;
            c.spin_ms += delta_ms;
            if let Some(radius) = magnet_radius {
                attract(&mut c.pos, bird.pos, radius, pull);
            }
        }

        let mut update = PowerUpUpdate::default();
        if bird.alive {
            let hits: Vec<(usize, PowerUpKind, Vec2)> = self
                .power_ups
                .iter()
                .enumerate()
                .filter(|(_, p)| {
                    !p.collected
                        && circle_circle(bird.pos, bird.radius, p.pos, self.config.pickup_radius)
                })
                .map(|(i, p)| (i, p.kind, p.pos))
                .collect();
            for (i, kind, pos) in hits {
                self.power_ups[i].collected = true;
                update.collected.push(self.collect(kind, pos, bird));
            }

            for c in &mut self.coins {
                if !c.collected && circle_circle(bird.pos, bird.radius, c.pos, self.config.coin_radius)
                {
                    c.collected = true;
                    self.counters.coins_collected += 1;
                    update.coins.push(c.pos);
                }
            }
        }

        let cull_x = bird.pos.x + self.config.despawn_distance;
        self.power_ups.retain(|p| !p.collected && p.pos.x >= cull_x);
        self.coins.retain(|c| !c.collected && c.pos.x >= cull_x);

        update
    }

    /// Apply a pickup: combo if one fires, otherwise the single effect
    pub fn collect(&mut self, kind: PowerUpKind, pos: Vec2, bird: &mut Bird) -> Collected {
        self.counters.power_ups_used += 1;
        if kind == PowerUpKind::Shield {
            self.counters.shields_used += 1;
        }

        let previous = bird.last_power_up;
        if self.check_power_up_combination(kind, bird) {
            let combo = previous.and_then(|p| Combo::from_pair(p, kind));
            return Collected {
                kind,
                combo,
                points: 0,
                pos,
            };
        }

        let points = self.apply_single(kind, bird);
        Collected {
            kind,
            combo: None,
            points,
            pos,
        }
    }

    /// Fire a combo if `kind` pairs with the previous pickup inside the window.
    ///
    /// Returns true when a combo fired; the caller then skips the single
    /// effect. Otherwise `kind` is recorded and a fresh window opens.
    pub fn check_power_up_combination(&mut self, kind: PowerUpKind, bird: &mut Bird) -> bool {
        let combo = match bird.last_power_up {
            Some(previous) if bird.combo_window > 0 => Combo::from_pair(previous, kind),
            _ => None,
        };

        let Some(combo) = combo else {
            bird.last_power_up = Some(kind);
            bird.combo_window = bird.config.combo_window_ticks;
            return false;
        };

        match combo {
            Combo::SuperMode => {
                bird.activate_shield(Some(self.config.super_shield_ms));
                self.effects.slow_time_ms = self.config.super_slow_ms;
            }
            Combo::MegaMode => {
                bird.activate_magnet(Some(self.config.mega_magnet_ms));
                self.effects.mega_time_ms = self.config.mega_duration_ms;
            }
            Combo::GodMode => {
                let d = self.config.god_duration_ms;
                bird.make_invulnerable(Some(d));
                bird.activate_shield(Some(d));
                bird.activate_speed_boost(Some(d));
                self.effects.rainbow_time_ms = d;
            }
        }
        bird.last_power_up = None;
        bird.combo_window = 0;
        self.counters.combos_triggered += 1;
        log::info!("Combo activated: {}", combo.as_str());
        true
    }

    /// Individual pickup effect. Returns points to award.
    fn apply_single(&mut self, kind: PowerUpKind, bird: &mut Bird) -> u64 {
        match kind {
            PowerUpKind::Shield => {
                let duration = bird.config.shield_duration_ms * bird.skin.shield_multiplier();
                bird.activate_shield(Some(duration));
            }
            PowerUpKind::Slow => self.effects.slow_time_ms = self.config.slow_duration_ms,
            PowerUpKind::Score => {
                return self.config.score_pickup_points * self.effects.score_multiplier();
            }
            PowerUpKind::Magnet => bird.activate_magnet(None),
            PowerUpKind::Double => self.effects.double_time_ms = self.config.double_duration_ms,
            PowerUpKind::Rainbow => {
                let d = self.config.rainbow_duration_ms;
                bird.activate_speed_boost(Some(d));
                bird.make_invulnerable(Some(d));
                self.effects.rainbow_time_ms = d;
            }
        }
        0
    }
}

/// Move `pos` toward `target` by at most `step` if within `radius`
fn attract(pos: &mut Vec2, target: Vec2, radius: f32, step: f32) {
    let delta = target - *pos;
    let dist = delta.length();
    if dist > 0.0 && dist <= radius {
        *pos += delta / dist * step.min(dist);
    }
}
