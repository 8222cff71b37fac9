//! Per-frame simulation step
//!
//! Advances every component in a fixed order so that a seed plus an input
//! sequence reproduces a run.

use std::collections::BTreeSet;

use super::collision::{Collider, ColliderKind, Shape, resolve_collision};
use super::state::{GameEvent, GameState};

/// How far below the gap centre the autopilot lets the bird sink.
/// A flap rises about 60px, so this keeps the arc centred on the gap.
const AUTOPILOT_MARGIN: f32 = 28.0;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Flap (click/tap/space)
    pub flap: bool,
    /// Demo mode: the autopilot decides when to flap
    pub autopilot: bool,
}

/// Advance the game state by `delta_ms`
pub fn tick(state: &mut GameState, input: &TickInput, delta_ms: f32) {
    if !state.bird.alive {
        return;
    }
    let delta_ms = delta_ms.max(0.0);

    // Advance clocks
    state.time_ms += delta_ms as f64;
    state.time_ticks += 1;

    // Handle flap input
    if input.flap || (input.autopilot && autopilot_wants_flap(state)) {
        state.flap();
    }

    state.bird.move_bird(delta_ms, &state.world);

    // Scroll the world
    let scroll = state.world.params.game_speed
        * state.power_ups.speed_multiplier()
        * state.bird.scroll_multiplier();
    state.bird.add_distance(scroll * crate::frames(delta_ms));

    // Spawn and cull obstacles
    let update = state.spawner.update(
        delta_ms,
        scroll,
        state.bird.pos.x,
        &state.world,
        &mut state.rng,
        &mut state.ids,
        state.time_ms,
    );
    if let Some(biome) = update.biome_changed {
        state.push_event(GameEvent::BiomeChanged { biome });
    }

    rebuild_colliders(state);

    // Deadly contacts and the ground
    if !resolve_bird_contacts(state) {
        return;
    }
    if state.bird.grounded && !state.bird.is_exempt() {
        log::debug!("Bird hit the ground");
        state.end_run();
        return;
    }

    push_power_ups_out_of_obstacles(state);

    // Pickups and coins
    let biome = state.spawner.biome();
    let pickups = state.power_ups.update(
        delta_ms,
        scroll,
        &mut state.bird,
        &state.world,
        biome,
        &mut state.rng,
        &mut state.ids,
    );
    for collected in pickups.collected {
        state.push_event(GameEvent::PowerUpCollected {
            kind: collected.kind,
        });
        if let Some(combo) = collected.combo {
            state.push_event(GameEvent::ComboActivated { combo });
        }
        state.add_score(collected.points);
    }
    for _ in pickups.coins {
        let total = state.power_ups.counters.coins_collected;
        state.push_event(GameEvent::CoinCollected { total });
    }

    score_passed_obstacles(state);

    // Ramp difficulty with score
    state.world.update_difficulty(state.score);
}

/// Register this tick's obstacles and pickups with the engine
fn rebuild_colliders(state: &mut GameState) {
    state.collisions.clear_colliders();
    for o in state.spawner.obstacles() {
        state.collisions.register(Collider {
            id: o.id,
            kind: ColliderKind::Obstacle,
            shape: o.shape(),
        });
    }
    let radius = state.power_ups.config.pickup_radius;
    for p in state.power_ups.power_ups() {
        state.collisions.register(Collider {
            id: p.id,
            kind: ColliderKind::PowerUp,
            shape: Shape::circle(p.pos, radius),
        });
    }
}

/// Bird against deadly obstacles. Returns false when the bird died.
fn resolve_bird_contacts(state: &mut GameState) -> bool {
    let hits = state.collisions.check_bird_collisions(&state.bird.shape());
    let mut touching = BTreeSet::new();

    for hit in hits.iter().filter(|c| c.kind == ColliderKind::Obstacle) {
        let deadly = state
            .spawner
            .obstacles()
            .iter()
            .any(|o| o.id == hit.id && o.deadly);
        if !deadly {
            continue;
        }

        // Overlapping but not colliding: shield or invulnerability absorbed it
        if state.bird.is_colliding_with(&hit.shape) {
            log::debug!("Bird hit obstacle {}", hit.id);
            state.end_run();
            return false;
        }
        touching.insert(hit.id);
        if !state.shielded_contacts.contains(&hit.id) {
            state.push_event(GameEvent::ShieldBlocked {
                obstacle_id: hit.id,
            });
        }
    }

    state.shielded_contacts = touching;
    true
}

/// General engine pass: pickups overlapping solid obstacles are pushed out
fn push_power_ups_out_of_obstacles(state: &mut GameState) {
    let events = state.collisions.check_collisions(state.time_ms);
    for event in events {
        let kind_of = |id: u32| {
            state
                .collisions
                .colliders()
                .iter()
                .find(|c| c.id == id)
                .map(|c| (c.kind, c.shape))
        };
        let (Some((kind_a, shape_a)), Some((kind_b, shape_b))) = (kind_of(event.a), kind_of(event.b))
        else {
            continue;
        };
        let (pickup_id, mut pickup, obstacle_id, obstacle) = match (kind_a, kind_b) {
            (ColliderKind::PowerUp, ColliderKind::Obstacle) => (event.a, shape_a, event.b, shape_b),
            (ColliderKind::Obstacle, ColliderKind::PowerUp) => (event.b, shape_b, event.a, shape_a),
            _ => continue,
        };
        let solid = state
            .spawner
            .obstacles()
            .iter()
            .any(|o| o.id == obstacle_id && o.solid);
        if !solid {
            continue;
        }

        let push = resolve_collision(&mut pickup, &obstacle);
        if let Some(p) = state
            .power_ups
            .power_ups_mut()
            .iter_mut()
            .find(|p| p.id == pickup_id)
        {
            p.pos += push;
        }
        state.collisions.mark_handled(event.a, event.b);
    }
}

/// One point per passed gap, scaled by the active score multiplier
fn score_passed_obstacles(state: &mut GameState) {
    let passed: Vec<(u32, u32)> = state
        .spawner
        .get_passable_obstacles(state.bird.pos.x)
        .iter()
        .map(|o| (o.id, o.gap_id))
        .collect();
    if passed.is_empty() {
        return;
    }

    let gaps: BTreeSet<u32> = passed.iter().map(|&(_, gap)| gap).collect();
    for (id, _) in &passed {
        state.spawner.mark_obstacle_scored(*id);
    }
    let multiplier = state.power_ups.effects.score_multiplier();
    state.pipes_passed += gaps.len() as u32;
    state.add_score(gaps.len() as u64 * multiplier);
}

/// Flap when the bird sinks below the next gap centre
fn autopilot_wants_flap(state: &GameState) -> bool {
    let bird = &state.bird;
    let target = state
        .spawner
        .next_obstacle_ahead(bird.pos.x - bird.radius)
        .map(|o| o.gap_center)
        .unwrap_or_else(|| (state.world.ceiling_y() + state.world.ground_y()) / 2.0);
    bird.pos.y > target + AUTOPILOT_MARGIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::obstacles::ObstaclePattern;
    use crate::sim::powerups::PowerUpKind;
    use glam::Vec2;

    const DT: f32 = 1000.0 / 60.0;

    /// State with random spawns switched off
    fn quiet_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.spawner.config.patterns.clear();
        state.world.params.power_up_spawn_rate = 0.0;
        state.world.params.coin_spawn_rate = 0.0;
        state
    }

    fn spawn_pipe(state: &mut GameState, x: f32) {
        let gap = state.world.params.pipe_gap;
        let pattern = ObstaclePattern::pipe(gap, gap, state.world.params.pipe_width);
        state.spawner.spawn_obstacle(
            &pattern,
            Some(x),
            &state.world,
            &mut state.rng,
            &mut state.ids,
            state.time_ms,
        );
    }

    #[test]
    fn test_falling_bird_dies_on_ground() {
        let mut state = quiet_state(1);
        for _ in 0..600 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(!state.bird.alive);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::Died { score: 0 }));
    }

    #[test]
    fn test_dead_bird_is_frozen() {
        let mut state = quiet_state(1);
        state.end_run();
        let pos = state.bird.pos;
        let ticks = state.time_ticks;
        tick(&mut state, &TickInput { flap: true, autopilot: false }, DT);
        assert_eq!(state.bird.pos, pos);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_shield_survives_ground() {
        let mut state = quiet_state(1);
        state.bird.activate_shield(Some(60_000.0));
        for _ in 0..300 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(state.bird.alive);
        assert!(state.bird.grounded);
    }

    #[test]
    fn test_passing_a_pipe_scores_once() {
        let mut state = quiet_state(3);
        state.bird.make_invulnerable(Some(60_000.0));
        let x = state.bird.pos.x + 40.0;
        spawn_pipe(&mut state, x);

        for _ in 0..120 {
            let flap = state.bird.pos.y > 300.0;
            tick(&mut state, &TickInput { flap, autopilot: false }, DT);
        }
        assert_eq!(state.score, 1);
        assert_eq!(state.pipes_passed, 1);
        let scored: Vec<_> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Scored { .. }))
            .collect();
        assert_eq!(scored.len(), 1);
    }

    #[test]
    fn test_double_multiplier_scales_gap_points() {
        let mut state = quiet_state(3);
        state.bird.make_invulnerable(Some(60_000.0));
        state.power_ups.effects.double_time_ms = 60_000.0;
        let x = state.bird.pos.x + 40.0;
        spawn_pipe(&mut state, x);
        for _ in 0..120 {
            let flap = state.bird.pos.y > 300.0;
            tick(&mut state, &TickInput { flap, autopilot: false }, DT);
        }
        assert_eq!(state.score, 2);
        assert_eq!(state.pipes_passed, 1);
    }

    #[test]
    fn test_shield_blocked_reported_once_per_contact() {
        let mut state = quiet_state(5);
        state.bird.activate_shield(Some(60_000.0));
        let x = state.bird.pos.x - 10.0;
        spawn_pipe(&mut state, x);
        // Pin the bird inside the top half
        let top = state.spawner.obstacles()[0].clone();
        state.bird.pos = Vec2::new(top.pos.x + top.size.x / 2.0, top.pos.y + top.size.y / 2.0);

        tick(&mut state, &TickInput::default(), 1.0);
        tick(&mut state, &TickInput::default(), 1.0);
        let blocked = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::ShieldBlocked { .. }))
            .count();
        assert_eq!(blocked, 1);
        assert!(state.bird.alive);
    }

    #[test]
    fn test_unshielded_bird_dies_in_pipe() {
        let mut state = quiet_state(5);
        let x = state.bird.pos.x - 10.0;
        spawn_pipe(&mut state, x);
        let top = state.spawner.obstacles()[0].clone();
        state.bird.pos = Vec2::new(top.pos.x + top.size.x / 2.0, top.pos.y + top.size.y / 2.0);
        let hazard = top.shape();
        assert!(state.bird.is_colliding_with(&hazard));

        tick(&mut state, &TickInput::default(), 1.0);
        assert!(!state.bird.alive);
        let events = state.drain_events();
        assert!(!events.iter().any(|e| matches!(e, GameEvent::ShieldBlocked { .. })));
        assert!(events.iter().any(|e| matches!(e, GameEvent::Died { .. })));
    }

    #[test]
    fn test_collecting_power_up_emits_event() {
        let mut state = quiet_state(2);
        let pos = state.bird.pos + Vec2::new(10.0, 0.0);
        state
            .power_ups
            .spawn_power_up(PowerUpKind::Score, pos, &mut state.ids);
        tick(&mut state, &TickInput::default(), DT);

        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PowerUpCollected {
            kind: PowerUpKind::Score
        }));
        assert_eq!(state.score, 5);
    }

    #[test]
    fn test_power_up_pushed_out_of_obstacle() {
        let mut state = quiet_state(4);
        spawn_pipe(&mut state, 300.0);
        let top = state.spawner.obstacles()[0].clone();
        let inside = Vec2::new(top.pos.x + 5.0, top.pos.y + top.size.y - 5.0);
        state
            .power_ups
            .spawn_power_up(PowerUpKind::Magnet, inside, &mut state.ids);

        tick(&mut state, &TickInput::default(), 1.0);
        let moved = state.power_ups.power_ups()[0].pos;
        assert_ne!(moved, inside);
        assert!(state.collisions.history().any(|e| e.handled));
    }

    #[test]
    fn test_autopilot_holds_altitude() {
        let mut state = quiet_state(42);
        for _ in 0..600 {
            tick(&mut state, &TickInput { flap: false, autopilot: true }, DT);
        }
        assert!(state.bird.alive);
        assert!(state.bird.streak.jumps > 0);
        let mid = (state.world.ceiling_y() + state.world.ground_y()) / 2.0;
        assert!((state.bird.pos.y - mid).abs() < 80.0);
    }

    #[test]
    fn test_autopilot_targets_next_gap() {
        let mut state = quiet_state(8);
        spawn_pipe(&mut state, 200.0);
        let centre = state.spawner.obstacles()[0].gap_center;

        state.bird.pos.y = centre + AUTOPILOT_MARGIN + 5.0;
        assert!(autopilot_wants_flap(&state));
        state.bird.pos.y = centre;
        assert!(!autopilot_wants_flap(&state));
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let mut state = GameState::new(seed);
            for i in 0..400 {
                let input = TickInput { flap: i % 25 == 0, autopilot: false };
                tick(&mut state, &input, DT);
            }
            (state.score, state.bird.pos, state.spawner.obstacles().len())
        };
        assert_eq!(run(11), run(11));
    }
}
