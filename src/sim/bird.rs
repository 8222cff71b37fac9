//! Bird kinematics and ability timers
//!
//! Abilities are flag + countdown pairs decremented inside `move_bird`, so a
//! flag is true exactly while its timer is positive. There are no wall-clock
//! callbacks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Shape, shapes_intersect};
use super::powerups::PowerUpKind;
use super::world::{World, WorldParameters};
use crate::consts::BIRD_START;
use crate::frames;

const MIN_ANGLE: f32 = -60.0 * std::f32::consts::PI / 180.0;
const MAX_ANGLE: f32 = 90.0 * std::f32::consts::PI / 180.0;

/// Cosmetic skins with small gameplay modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Skin {
    #[default]
    Classic,
    Robin,
    Phoenix,
    Penguin,
}

impl Skin {
    pub const ALL: [Skin; 4] = [Skin::Classic, Skin::Robin, Skin::Phoenix, Skin::Penguin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Skin::Classic => "classic",
            Skin::Robin => "robin",
            Skin::Phoenix => "phoenix",
            Skin::Penguin => "penguin",
        }
    }

    /// Scales shield pickups
    pub fn shield_multiplier(&self) -> f32 {
        match self {
            Skin::Classic | Skin::Robin => 1.0,
            Skin::Phoenix => 1.5,
            Skin::Penguin => 1.25,
        }
    }

    /// Scales the magnet pull radius
    pub fn magnet_multiplier(&self) -> f32 {
        match self {
            Skin::Robin => 1.3,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirdConfig {
    pub flap_cooldown_ms: f32,
    /// How long the flap animation flag stays set
    pub flap_duration_ms: f32,
    /// Multiplicative horizontal decay per move
    pub horizontal_drag: f32,
    /// Most negative (upward) vertical speed allowed
    pub max_rise_speed: f32,
    pub angle_smoothing: f32,
    pub speed_boost_factor: f32,
    pub double_jump_enabled: bool,
    /// Fraction of jump power a double jump applies
    pub double_jump_factor: f32,
    pub shield_duration_ms: f32,
    pub speed_boost_duration_ms: f32,
    pub magnet_duration_ms: f32,
    pub invulnerability_duration_ms: f32,
    pub magnet_radius: f32,
    /// Ticks a pickup stays eligible for a combo
    pub combo_window_ticks: u32,
}

impl Default for BirdConfig {
    fn default() -> Self {
        Self {
            flap_cooldown_ms: 100.0,
            flap_duration_ms: 150.0,
            horizontal_drag: 0.98,
            max_rise_speed: -12.0,
            angle_smoothing: 0.8,
            speed_boost_factor: 1.5,
            double_jump_enabled: false,
            double_jump_factor: 0.85,
            shield_duration_ms: 5000.0,
            speed_boost_duration_ms: 3000.0,
            magnet_duration_ms: 6000.0,
            invulnerability_duration_ms: 2000.0,
            magnet_radius: 120.0,
            combo_window_ticks: 180,
        }
    }
}

/// Result of a flap request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlapOutcome {
    Ignored,
    Flap,
    DoubleJump,
}

/// Counters polled by the HUD and achievement layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Streak {
    pub jumps: u32,
    pub distance: f32,
    pub time_alive_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bird {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing angle in radians, positive is nose down
    pub angle: f32,
    pub radius: f32,
    pub alive: bool,
    pub grounded: bool,
    pub flapping: bool,
    flap_timer_ms: f32,
    last_flap_ms: Option<f64>,

    pub has_shield: bool,
    pub shield_time: f32,
    pub has_speed_boost: bool,
    pub speed_boost_time: f32,
    pub has_magnet: bool,
    pub magnet_time: f32,
    /// No separate flag: time > 0 is the state
    pub invulnerability_time: f32,
    pub double_jump_available: bool,

    pub streak: Streak,
    pub last_power_up: Option<PowerUpKind>,
    /// Ticks remaining in which a second pickup can combo
    pub combo_window: u32,

    pub skin: Skin,
    #[serde(skip)]
    pub config: BirdConfig,
}

impl Bird {
    pub fn new(config: BirdConfig, params: &WorldParameters) -> Self {
        Self {
            pos: BIRD_START,
            vel: Vec2::ZERO,
            angle: 0.0,
            radius: params.bird_radius,
            alive: true,
            grounded: false,
            flapping: false,
            flap_timer_ms: 0.0,
            last_flap_ms: None,
            has_shield: false,
            shield_time: 0.0,
            has_speed_boost: false,
            speed_boost_time: 0.0,
            has_magnet: false,
            magnet_time: 0.0,
            invulnerability_time: 0.0,
            double_jump_available: config.double_jump_enabled,
            streak: Streak::default(),
            last_power_up: None,
            combo_window: 0,
            skin: Skin::default(),
            config,
        }
    }

    /// Back to start-of-run defaults, keeping config and skin
    pub fn reset(&mut self, params: &WorldParameters) {
        let skin = self.skin;
        *self = Self::new(self.config.clone(), params);
        self.skin = skin;
    }

    pub fn shape(&self) -> Shape {
        Shape::circle(self.pos, self.radius)
    }

    pub fn kill(&mut self) {
        if self.alive {
            self.alive = false;
            self.flapping = false;
            log::info!(
                "Bird died after {:.1}s, {} jumps",
                self.streak.time_alive_ms / 1000.0,
                self.streak.jumps
            );
        }
    }

    pub fn flap(&mut self, now_ms: f64, params: &WorldParameters) -> FlapOutcome {
        if !self.alive {
            return FlapOutcome::Ignored;
        }

        let in_cooldown = self
            .last_flap_ms
            .is_some_and(|t| now_ms - t < self.config.flap_cooldown_ms as f64);

        let outcome = if !in_cooldown {
            self.vel.y = params.jump_power;
            FlapOutcome::Flap
        } else if self.config.double_jump_enabled && self.double_jump_available {
            self.vel.y = params.jump_power * self.config.double_jump_factor;
            self.double_jump_available = false;
            FlapOutcome::DoubleJump
        } else {
            return FlapOutcome::Ignored;
        };

        self.last_flap_ms = Some(now_ms);
        self.flapping = true;
        self.flap_timer_ms = self.config.flap_duration_ms;
        self.grounded = false;
        self.streak.jumps += 1;
        outcome
    }

    /// Advance one simulation step
    pub fn move_bird(&mut self, delta_ms: f32, world: &World) {
        if !self.alive {
            return;
        }
        let f = frames(delta_ms);
        let params = &world.params;

        self.vel.x *= self.config.horizontal_drag;
        self.vel.y = (self.vel.y + params.gravity * f)
            .clamp(self.config.max_rise_speed, params.bird_max_fall_speed);

        let boost = if self.has_speed_boost {
            self.config.speed_boost_factor
        } else {
            1.0
        };
        self.pos.x += self.vel.x * f * boost;
        self.pos.y += self.vel.y * f;

        self.angle = (self.vel.y.atan2(self.vel.x.abs().max(1.0)) * self.config.angle_smoothing)
            .clamp(MIN_ANGLE, MAX_ANGLE);

        let ground = world.ground_y();
        if self.pos.y + self.radius >= ground {
            self.pos.y = ground - self.radius;
            self.vel.y = 0.0;
            self.grounded = true;
            if self.config.double_jump_enabled {
                self.double_jump_available = true;
            }
        } else {
            self.grounded = false;
        }

        let ceiling = world.ceiling_y();
        if self.pos.y - self.radius < ceiling {
            self.pos.y = ceiling + self.radius;
            self.vel.y = self.vel.y.max(0.0);
        }

        self.tick_timers(delta_ms);
        self.streak.time_alive_ms += delta_ms as f64;
    }

    fn tick_timers(&mut self, delta_ms: f32) {
        self.shield_time = (self.shield_time - delta_ms).max(0.0);
        self.has_shield = self.shield_time > 0.0;

        self.speed_boost_time = (self.speed_boost_time - delta_ms).max(0.0);
        self.has_speed_boost = self.speed_boost_time > 0.0;

        self.magnet_time = (self.magnet_time - delta_ms).max(0.0);
        self.has_magnet = self.magnet_time > 0.0;

        self.invulnerability_time = (self.invulnerability_time - delta_ms).max(0.0);

        self.flap_timer_ms = (self.flap_timer_ms - delta_ms).max(0.0);
        self.flapping = self.flap_timer_ms > 0.0;

        self.combo_window = self.combo_window.saturating_sub(1);
    }

    pub fn activate_shield(&mut self, duration_ms: Option<f32>) {
        self.shield_time = duration_ms.unwrap_or(self.config.shield_duration_ms).max(0.0);
        self.has_shield = self.shield_time > 0.0;
    }

    pub fn activate_speed_boost(&mut self, duration_ms: Option<f32>) {
        self.speed_boost_time = duration_ms
            .unwrap_or(self.config.speed_boost_duration_ms)
            .max(0.0);
        self.has_speed_boost = self.speed_boost_time > 0.0;
    }

    pub fn activate_magnet(&mut self, duration_ms: Option<f32>) {
        self.magnet_time = duration_ms.unwrap_or(self.config.magnet_duration_ms).max(0.0);
        self.has_magnet = self.magnet_time > 0.0;
    }

    pub fn make_invulnerable(&mut self, duration_ms: Option<f32>) {
        self.invulnerability_time = duration_ms
            .unwrap_or(self.config.invulnerability_duration_ms)
            .max(0.0);
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerability_time > 0.0
    }

    /// Shielded or invulnerable birds ignore hazards
    pub fn is_exempt(&self) -> bool {
        self.is_invulnerable() || self.has_shield
    }

    pub fn is_colliding_with(&self, other: &Shape) -> bool {
        if self.is_exempt() {
            return false;
        }
        shapes_intersect(&self.shape(), other)
    }

    pub fn magnet_radius(&self) -> f32 {
        self.config.magnet_radius * self.skin.magnet_multiplier()
    }

    /// Horizontal scroll factor contributed by the speed boost
    pub fn scroll_multiplier(&self) -> f32 {
        if self.has_speed_boost {
            self.config.speed_boost_factor
        } else {
            1.0
        }
    }

    pub fn add_distance(&mut self, distance: f32) {
        if self.alive {
            self.streak.distance += distance;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::REFERENCE_FRAME_MS;
    use proptest::prelude::*;

    fn setup() -> (World, Bird) {
        let world = World::default();
        let bird = Bird::new(BirdConfig::default(), &world.params);
        (world, bird)
    }

    #[test]
    fn test_flap_sets_jump_power() {
        let (world, mut bird) = setup();
        assert_eq!(bird.flap(0.0, &world.params), FlapOutcome::Flap);
        assert_eq!(bird.vel.y, world.params.jump_power);
        assert!(bird.flapping);
        assert_eq!(bird.streak.jumps, 1);
    }

    #[test]
    fn test_flap_cooldown() {
        let (world, mut bird) = setup();
        bird.flap(1000.0, &world.params);
        assert_eq!(bird.flap(1050.0, &world.params), FlapOutcome::Ignored);
        assert_eq!(bird.streak.jumps, 1);
        assert_eq!(bird.flap(1100.0, &world.params), FlapOutcome::Flap);
    }

    #[test]
    fn test_dead_bird_ignores_input() {
        let (world, mut bird) = setup();
        bird.kill();
        assert_eq!(bird.flap(0.0, &world.params), FlapOutcome::Ignored);
        let before = bird.pos;
        bird.move_bird(16.0, &world);
        assert_eq!(bird.pos, before);
    }

    #[test]
    fn test_double_jump_inside_cooldown() {
        let world = World::default();
        let config = BirdConfig {
            double_jump_enabled: true,
            ..Default::default()
        };
        let mut bird = Bird::new(config, &world.params);
        bird.flap(0.0, &world.params);
        assert_eq!(bird.flap(20.0, &world.params), FlapOutcome::DoubleJump);
        assert!((bird.vel.y - world.params.jump_power * 0.85).abs() < 1e-5);
        assert_eq!(bird.flap(40.0, &world.params), FlapOutcome::Ignored);

        // Landing restores it
        bird.pos.y = world.ground_y() - 1.0;
        bird.vel.y = 5.0;
        bird.move_bird(REFERENCE_FRAME_MS, &world);
        assert!(bird.grounded);
        assert!(bird.double_jump_available);
    }

    #[test]
    fn test_ground_snap() {
        let (world, mut bird) = setup();
        bird.pos.y = world.ground_y() - 2.0;
        bird.vel.y = 8.0;
        bird.move_bird(REFERENCE_FRAME_MS, &world);
        assert!(bird.grounded);
        assert_eq!(bird.vel.y, 0.0);
        assert_eq!(bird.pos.y + bird.radius, world.ground_y());
    }

    #[test]
    fn test_ceiling_clamp() {
        let (world, mut bird) = setup();
        bird.pos.y = world.ceiling_y() + bird.radius + 1.0;
        bird.vel.y = -10.0;
        bird.move_bird(REFERENCE_FRAME_MS, &world);
        assert_eq!(bird.pos.y, world.ceiling_y() + bird.radius);
        assert_eq!(bird.vel.y, 0.0);
    }

    #[test]
    fn test_angle_clamped() {
        let (world, mut bird) = setup();
        bird.vel.y = -12.0;
        bird.move_bird(1.0, &world);
        assert!(bird.angle >= MIN_ANGLE - 1e-6);
        bird.vel.y = 10.0;
        bird.move_bird(REFERENCE_FRAME_MS, &world);
        assert!(bird.angle > 0.0 && bird.angle <= MAX_ANGLE);
    }

    #[test]
    fn test_speed_boost_scales_horizontal() {
        let (world, mut bird) = setup();
        bird.vel.x = 2.0;
        let x0 = bird.pos.x;
        bird.move_bird(REFERENCE_FRAME_MS, &world);
        let plain = bird.pos.x - x0;

        let (world, mut boosted) = setup();
        boosted.vel.x = 2.0;
        boosted.activate_speed_boost(None);
        let x0 = boosted.pos.x;
        boosted.move_bird(REFERENCE_FRAME_MS, &world);
        let fast = boosted.pos.x - x0;
        assert!((fast - plain * 1.5).abs() < 1e-3);
    }

    #[test]
    fn test_reactivation_resets_not_stacks() {
        let (world, mut bird) = setup();
        bird.activate_shield(Some(1000.0));
        bird.move_bird(400.0, &world);
        bird.activate_shield(Some(1000.0));
        assert_eq!(bird.shield_time, 1000.0);
    }

    #[test]
    fn test_timers_expire() {
        let (world, mut bird) = setup();
        bird.activate_shield(Some(30.0));
        bird.activate_magnet(Some(30.0));
        bird.make_invulnerable(Some(30.0));
        bird.move_bird(20.0, &world);
        assert!(bird.has_shield && bird.has_magnet && bird.is_invulnerable());
        bird.move_bird(20.0, &world);
        assert!(!bird.has_shield && !bird.has_magnet && !bird.is_invulnerable());
        assert_eq!(bird.shield_time, 0.0);
    }

    #[test]
    fn test_exempt_birds_do_not_collide() {
        let (_, mut bird) = setup();
        let wall = Shape::rect(bird.pos - Vec2::splat(5.0), Vec2::splat(10.0));
        assert!(bird.is_colliding_with(&wall));
        bird.make_invulnerable(None);
        assert!(!bird.is_colliding_with(&wall));
        bird.invulnerability_time = 0.0;
        bird.activate_shield(None);
        assert!(!bird.is_colliding_with(&wall));
    }

    #[test]
    fn test_reset_keeps_skin() {
        let (world, mut bird) = setup();
        bird.skin = Skin::Phoenix;
        bird.flap(0.0, &world.params);
        bird.kill();
        bird.reset(&world.params);
        assert!(bird.alive);
        assert_eq!(bird.skin, Skin::Phoenix);
        assert_eq!(bird.streak.jumps, 0);
        assert_eq!(bird.pos, BIRD_START);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Shield(f32),
        Boost(f32),
        Magnet(f32),
        Move(f32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.0f32..3000.0).prop_map(Op::Shield),
            (0.0f32..3000.0).prop_map(Op::Boost),
            (0.0f32..3000.0).prop_map(Op::Magnet),
            (0.0f32..200.0).prop_map(Op::Move),
        ]
    }

    proptest! {
        #[test]
        fn prop_flags_match_timers(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let (world, mut bird) = setup();
            for op in ops {
                match op {
                    Op::Shield(d) => bird.activate_shield(Some(d)),
                    Op::Boost(d) => bird.activate_speed_boost(Some(d)),
                    Op::Magnet(d) => bird.activate_magnet(Some(d)),
                    Op::Move(dt) => bird.move_bird(dt, &world),
                }
                prop_assert_eq!(bird.has_shield, bird.shield_time > 0.0);
                prop_assert_eq!(bird.has_speed_boost, bird.speed_boost_time > 0.0);
                prop_assert_eq!(bird.has_magnet, bird.magnet_time > 0.0);
            }
        }

        #[test]
        fn prop_ground_clamp(start_y in 30.0f32..600.0, vy in -12.0f32..10.0, dt in 1.0f32..50.0) {
            let (world, mut bird) = setup();
            bird.pos.y = start_y;
            bird.vel.y = vy;
            for _ in 0..20 {
                bird.move_bird(dt, &world);
                prop_assert!(bird.pos.y + bird.radius <= world.ground_y() + 1e-3);
            }
        }
    }
}
