//! Procedural obstacle spawning and culling
//!
//! Paired obstacles (pipes, trees, buildings, cacti) are created as a top and
//! bottom half sharing x and gap centre. Decorative singles (clouds) are
//! non-solid and fade out after a finite lifetime. Scoring is not decided
//! here: the spawner only answers which obstacles the bird has passed.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Shape;
use super::state::EntityIds;
use super::world::{World, WorldParameters};
use crate::frames;

/// Environment profile selecting obstacle kinds and spawn multipliers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Biome {
    #[default]
    Meadow,
    Forest,
    City,
    Desert,
    Arctic,
}

impl Biome {
    pub const ALL: [Biome; 5] = [
        Biome::Meadow,
        Biome::Forest,
        Biome::City,
        Biome::Desert,
        Biome::Arctic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Biome::Meadow => "meadow",
            Biome::Forest => "forest",
            Biome::City => "city",
            Biome::Desert => "desert",
            Biome::Arctic => "arctic",
        }
    }

    /// Scales obstacle spawn probability
    pub fn density_multiplier(&self) -> f32 {
        match self {
            Biome::Meadow => 1.0,
            Biome::Forest => 1.1,
            Biome::City => 1.2,
            Biome::Desert => 0.9,
            Biome::Arctic => 1.0,
        }
    }

    /// Scales power-up spawn probability
    pub fn power_up_bonus(&self) -> f32 {
        match self {
            Biome::Meadow => 1.0,
            Biome::Forest => 1.2,
            Biome::City => 0.9,
            Biome::Desert => 1.5,
            Biome::Arctic => 1.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Pipe,
    Tree,
    Building,
    Cactus,
    Cloud,
}

impl ObstacleKind {
    /// Spawns as a top/bottom pair around a gap
    pub fn is_paired(&self) -> bool {
        !matches!(self, ObstacleKind::Cloud)
    }

    pub fn is_solid(&self) -> bool {
        self.is_paired()
    }

    /// Obstacles one spawn of this kind can create
    pub fn pieces(&self) -> usize {
        if self.is_paired() { 2 } else { 1 }
    }

    pub fn is_deadly(&self) -> bool {
        self.is_paired()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiomePreference {
    Any,
    Only(Biome),
}

impl BiomePreference {
    pub fn matches(&self, biome: Biome) -> bool {
        match self {
            BiomePreference::Any => true,
            BiomePreference::Only(b) => *b == biome,
        }
    }
}

/// Which part of a pair an obstacle is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleHalf {
    Top,
    Bottom,
    Single,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstaclePattern {
    pub kind: ObstacleKind,
    pub min_gap: f32,
    pub max_gap: f32,
    /// Roulette weight and Bernoulli probability
    pub spawn_rate: f32,
    pub biome_preference: BiomePreference,
    pub width: f32,
    /// Finite lifetime for decorative singles
    pub lifetime_ms: Option<f32>,
}

impl ObstaclePattern {
    pub fn pipe(min_gap: f32, max_gap: f32, width: f32) -> Self {
        Self {
            kind: ObstacleKind::Pipe,
            min_gap,
            max_gap,
            spawn_rate: 0.9,
            biome_preference: BiomePreference::Any,
            width,
            lifetime_ms: None,
        }
    }
}

/// Pattern table derived from the current world gap and pipe width
pub fn default_patterns(params: &WorldParameters) -> Vec<ObstaclePattern> {
    let gap = params.pipe_gap;
    let w = params.pipe_width;
    vec![
        ObstaclePattern::pipe(gap * 0.85, gap * 1.15, w),
        ObstaclePattern {
            kind: ObstacleKind::Tree,
            min_gap: gap * 0.9,
            max_gap: gap * 1.2,
            spawn_rate: 0.8,
            biome_preference: BiomePreference::Only(Biome::Forest),
            width: w * 1.2,
            lifetime_ms: None,
        },
        ObstaclePattern {
            kind: ObstacleKind::Building,
            min_gap: gap * 0.85,
            max_gap: gap * 1.0,
            spawn_rate: 0.8,
            biome_preference: BiomePreference::Only(Biome::City),
            width: w * 1.5,
            lifetime_ms: None,
        },
        ObstaclePattern {
            kind: ObstacleKind::Cactus,
            min_gap: gap * 0.9,
            max_gap: gap * 1.1,
            spawn_rate: 0.7,
            biome_preference: BiomePreference::Only(Biome::Desert),
            width: w * 0.8,
            lifetime_ms: None,
        },
        ObstaclePattern {
            kind: ObstacleKind::Cloud,
            min_gap: 0.0,
            max_gap: 0.0,
            spawn_rate: 0.1,
            biome_preference: BiomePreference::Any,
            width: w * 1.5,
            lifetime_ms: Some(6000.0),
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    pub half: ObstacleHalf,
    /// Shared by both halves of a pair
    pub gap_id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub solid: bool,
    pub deadly: bool,
    pub scored: bool,
    pub gap_center: f32,
    pub spawned_at_ms: f64,
    pub lifetime_ms: Option<f32>,
    pub age_ms: f32,
    pub opacity: f32,
}

impl Obstacle {
    pub fn shape(&self) -> Shape {
        Shape::rect(self.pos, self.size)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    pub fn is_expired(&self) -> bool {
        self.opacity <= 0.0 || self.lifetime_ms.is_some_and(|l| self.age_ms >= l)
    }
}

/// Vertical extents (y, height) of the two halves around a gap.
/// A half thinner than `min_segment` is dropped.
pub fn pair_segments(
    gap_center: f32,
    gap: f32,
    ceiling: f32,
    ground: f32,
    min_segment: f32,
) -> (Option<(f32, f32)>, Option<(f32, f32)>) {
    let top_height = gap_center - gap / 2.0 - ceiling;
    let bottom_y = gap_center + gap / 2.0;
    let bottom_height = ground - bottom_y;
    let top = (top_height > min_segment).then_some((ceiling, top_height));
    let bottom = (bottom_height > min_segment).then_some((bottom_y, bottom_height));
    (top, bottom)
}

#[derive(Debug, Clone)]
pub struct SpawnerConfig {
    /// Spawn line, relative to the bird
    pub spawn_distance: f32,
    /// Cull line, relative to the bird (negative is behind)
    pub despawn_distance: f32,
    pub min_spacing: f32,
    pub max_spacing: f32,
    pub max_obstacles: usize,
    /// Halves at or below this height are not created
    pub min_segment_height: f32,
    /// Ticks between biome transition rolls
    pub biome_check_interval: u32,
    pub biome_change_chance: f64,
    /// Decoratives fade over this many ms before expiring
    pub fade_ms: f32,
    pub patterns: Vec<ObstaclePattern>,
}

impl SpawnerConfig {
    pub fn for_world(params: &WorldParameters) -> Self {
        Self {
            spawn_distance: params.width - 20.0,
            despawn_distance: -150.0,
            min_spacing: 150.0,
            max_spacing: 250.0,
            max_obstacles: 40,
            min_segment_height: 20.0,
            biome_check_interval: 900,
            biome_change_chance: 0.35,
            fade_ms: 1000.0,
            patterns: default_patterns(params),
        }
    }
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self::for_world(&WorldParameters::default())
    }
}

/// What one spawner update did
#[derive(Debug, Clone, Default)]
pub struct SpawnerUpdate {
    pub spawned: Vec<u32>,
    pub culled: usize,
    pub biome_changed: Option<Biome>,
}

#[derive(Debug, Clone)]
pub struct ObstacleSpawner {
    pub config: SpawnerConfig,
    obstacles: Vec<Obstacle>,
    biome: Biome,
    /// Where the latest spawn is now (scrolls with the world)
    last_spawn_x: Option<f32>,
    next_spawn_distance: f32,
    biome_counter: u32,
    pub total_spawned: u32,
}

impl Default for ObstacleSpawner {
    fn default() -> Self {
        Self::new(SpawnerConfig::default())
    }
}

impl ObstacleSpawner {
    pub fn new(config: SpawnerConfig) -> Self {
        let next_spawn_distance = config.min_spacing;
        Self {
            config,
            obstacles: Vec::new(),
            biome: Biome::default(),
            last_spawn_x: None,
            next_spawn_distance,
            biome_counter: 0,
            total_spawned: 0,
        }
    }

    pub fn reset(&mut self) {
        self.obstacles.clear();
        self.biome = Biome::default();
        self.last_spawn_x = None;
        self.next_spawn_distance = self.config.min_spacing;
        self.biome_counter = 0;
        self.total_spawned = 0;
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn biome(&self) -> Biome {
        self.biome
    }

    pub fn set_biome(&mut self, biome: Biome) {
        if self.biome != biome {
            log::info!("Biome: {} -> {}", self.biome.as_str(), biome.as_str());
            self.biome = biome;
        }
    }

    /// Rebuild the pattern table after the world gap or pipe width changed
    pub fn refresh_patterns(&mut self, params: &WorldParameters) {
        self.config.patterns = default_patterns(params);
    }

    /// Roulette-wheel pick among patterns allowed in the current biome
    pub fn select_pattern<R: Rng>(&self, rng: &mut R) -> Option<&ObstaclePattern> {
        let candidates: Vec<&ObstaclePattern> = self
            .config
            .patterns
            .iter()
            .filter(|p| p.biome_preference.matches(self.biome) && p.spawn_rate > 0.0)
            .collect();
        let total: f32 = candidates.iter().map(|p| p.spawn_rate).sum();
        if total <= 0.0 {
            return None;
        }

        let mut roll = rng.random::<f32>() * total;
        for pattern in &candidates {
            if roll < pattern.spawn_rate {
                return Some(pattern);
            }
            roll -= pattern.spawn_rate;
        }
        candidates.last().copied()
    }

    /// Whether a spawn of `kind` fits under `max_obstacles`
    fn has_room_for(&self, kind: ObstacleKind) -> bool {
        self.obstacles.len() + kind.pieces() <= self.config.max_obstacles
    }

    /// Create obstacles for `pattern` at `x` (defaults to just off the right edge).
    /// Returns the ids created; empty when at capacity.
    pub fn spawn_obstacle<R: Rng>(
        &mut self,
        pattern: &ObstaclePattern,
        x: Option<f32>,
        world: &World,
        rng: &mut R,
        ids: &mut EntityIds,
        now_ms: f64,
    ) -> Vec<u32> {
        if !self.has_room_for(pattern.kind) {
            log::trace!("Obstacle cap reached, skipping spawn");
            return Vec::new();
        }
        let x = x.unwrap_or(world.params.width + pattern.width);
        let ceiling = world.ceiling_y();
        let ground = world.ground_y();
        let gap_id = ids.next_id();
        let mut created = Vec::new();

        let template = Obstacle {
            id: 0,
            kind: pattern.kind,
            half: ObstacleHalf::Single,
            gap_id,
            pos: Vec2::new(x, ceiling),
            size: Vec2::new(pattern.width, 0.0),
            vel: Vec2::new(-world.params.game_speed, 0.0),
            solid: pattern.kind.is_solid(),
            deadly: pattern.kind.is_deadly(),
            scored: false,
            gap_center: 0.0,
            spawned_at_ms: now_ms,
            lifetime_ms: pattern.lifetime_ms,
            age_ms: 0.0,
            opacity: 1.0,
        };

        if pattern.kind.is_paired() {
            // Gap size, then a centre that keeps the gap on screen
            let (lo, hi) = if pattern.min_gap <= pattern.max_gap {
                (pattern.min_gap, pattern.max_gap)
            } else {
                (pattern.max_gap, pattern.min_gap)
            };
            let gap = rng.random_range(lo..=hi).min(world.playable_height());
            let lo_center = ceiling + gap / 2.0;
            let hi_center = ground - gap / 2.0;
            let gap_center = if lo_center < hi_center {
                rng.random_range(lo_center..=hi_center)
            } else {
                (ceiling + ground) / 2.0
            };

            // Halves thinner than the minimum are dropped
            let (top, bottom) = pair_segments(
                gap_center,
                gap,
                ceiling,
                ground,
                self.config.min_segment_height,
            );
            for (half, segment) in [(ObstacleHalf::Top, top), (ObstacleHalf::Bottom, bottom)] {
                if let Some((y, height)) = segment {
                    let id = ids.next_id();
                    self.obstacles.push(Obstacle {
                        id,
                        half,
                        pos: Vec2::new(x, y),
                        size: Vec2::new(pattern.width, height),
                        gap_center,
                        ..template.clone()
                    });
                    created.push(id);
                }
            }
            log::debug!(
                "Spawned {:?} pair at x={:.0} gap={:.0} centre={:.0}",
                pattern.kind,
                x,
                gap,
                gap_center
            );
        } else {
            // Decorative single at a random height
            let height = pattern.width * 0.5;
            let max_y = (ground - height).max(ceiling);
            let y = rng.random_range(ceiling..=max_y);
            let id = ids.next_id();
            self.obstacles.push(Obstacle {
                id,
                pos: Vec2::new(x, y),
                size: Vec2::new(pattern.width, height),
                gap_center: y + height / 2.0,
                ..template
            });
            created.push(id);
        }

        self.total_spawned += created.len() as u32;
        created
    }

    /// Spawn the next pattern once the previous one has scrolled far enough
    pub fn process_spawning<R: Rng>(
        &mut self,
        bird_x: f32,
        world: &World,
        rng: &mut R,
        ids: &mut EntityIds,
        now_ms: f64,
    ) -> Vec<u32> {
        if self.obstacles.len() >= self.config.max_obstacles {
            return Vec::new();
        }
        let spawn_x = bird_x + self.config.spawn_distance;
        let due = self
            .last_spawn_x
            .is_none_or(|last| spawn_x - last >= self.next_spawn_distance);
        if !due {
            return Vec::new();
        }

        // Pick a pattern, then roll against its density
        let Some(pattern) = self.select_pattern(rng).cloned() else {
            return Vec::new();
        };
        let density = world.params.pipe_spawn_rate * self.biome.density_multiplier();
        let chance = (pattern.spawn_rate * density).clamp(0.0, 1.0) as f64;
        if !rng.random_bool(chance) {
            return Vec::new();
        }

        let created = self.spawn_obstacle(&pattern, Some(spawn_x), world, rng, ids, now_ms);
        // Next spacing only after something landed
        if !created.is_empty() {
            self.last_spawn_x = Some(spawn_x);
            self.next_spawn_distance =
                rng.random_range(self.config.min_spacing..=self.config.max_spacing);
        }
        created
    }

    /// Remove obstacles behind the cull line and expired decoratives
    pub fn process_culling(&mut self, bird_x: f32) -> usize {
        let cull_x = bird_x + self.config.despawn_distance;
        let before = self.obstacles.len();
        self.obstacles
            .retain(|o| o.right() >= cull_x && !o.is_expired());
        before - self.obstacles.len()
    }

    /// Low-frequency biome transition roll
    fn roll_biome<R: Rng>(&mut self, rng: &mut R) -> Option<Biome> {
        self.biome_counter += 1;
        if self.biome_counter < self.config.biome_check_interval {
            return None;
        }
        self.biome_counter = 0;
        if !rng.random_bool(self.config.biome_change_chance.clamp(0.0, 1.0)) {
            return None;
        }
        let others: Vec<Biome> = Biome::ALL
            .iter()
            .copied()
            .filter(|b| *b != self.biome)
            .collect();
        let next = others[rng.random_range(0..others.len())];
        self.set_biome(next);
        Some(next)
    }

    /// Scroll, age, roll biome, spawn, cull
    #[allow(clippy::too_many_arguments)]
    pub fn update<R: Rng>(
        &mut self,
        delta_ms: f32,
        scroll_speed: f32,
        bird_x: f32,
        world: &World,
        rng: &mut R,
        ids: &mut EntityIds,
        now_ms: f64,
    ) -> SpawnerUpdate {
        let dx = scroll_speed * frames(delta_ms);
        let fade_ms = self.config.fade_ms.max(1.0);

        // Scroll and fade
        for o in &mut self.obstacles {
            o.pos.x -= dx;
            o.vel = Vec2::new(-scroll_speed, 0.0);
            if let Some(lifetime) = o.lifetime_ms {
                o.age_ms += delta_ms;
                o.opacity = ((lifetime - o.age_ms) / fade_ms).clamp(0.0, 1.0);
            }
        }
        // The last spawn point scrolls too
        if let Some(last) = self.last_spawn_x.as_mut() {
            *last -= dx;
        }

        let biome_changed = self.roll_biome(rng);
        let spawned = self.process_spawning(bird_x, world, rng, ids, now_ms);
        let culled = self.process_culling(bird_x);

        SpawnerUpdate {
            spawned,
            culled,
            biome_changed,
        }
    }

    /// Solid, unscored obstacles fully behind the bird
    pub fn get_passable_obstacles(&self, bird_x: f32) -> Vec<&Obstacle> {
        self.obstacles
            .iter()
            .filter(|o| o.solid && !o.scored && o.right() < bird_x)
            .collect()
    }

    pub fn mark_obstacle_scored(&mut self, id: u32) -> bool {
        match self.obstacles.iter_mut().find(|o| o.id == id) {
            Some(o) => {
                o.scored = true;
                true
            }
            None => false,
        }
    }

    /// Nearest solid obstacle whose right edge is still ahead of `x`
    pub fn next_obstacle_ahead(&self, x: f32) -> Option<&Obstacle> {
        self.obstacles
            .iter()
            .filter(|o| o.solid && o.right() >= x)
            .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x))
    }
}
