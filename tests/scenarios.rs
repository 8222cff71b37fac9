//! End-to-end runs through the public API

use glam::Vec2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use skyflap::sim::obstacles::ObstacleHalf;
use skyflap::sim::state::EntityIds;
use skyflap::sim::{
    Bird, BirdConfig, Combo, GameEvent, GamePhase, GameState, ObstaclePattern, ObstacleSpawner,
    PowerUpKind, SpawnerConfig, TickInput, World, tick,
};
use skyflap::{BestScores, Session, Settings};

const DT: f32 = 1000.0 / 60.0;

#[test]
fn flap_then_fall_for_one_second() {
    let world = World::default();
    let max_fall = world.params.bird_max_fall_speed;
    let mut bird = Bird::new(BirdConfig::default(), &world.params);

    bird.flap(0.0, &world.params);
    assert!(bird.vel.y < 0.0);

    let mut prev_vy = bird.vel.y;
    for _ in 0..60 {
        bird.move_bird(DT, &world);
        assert!(bird.vel.y <= max_fall + 1e-4);
        if bird.grounded {
            break;
        }
        assert!(bird.vel.y >= prev_vy - 1e-4, "vy fell from {prev_vy} to {}", bird.vel.y);
        prev_vy = bird.vel.y;
    }
    assert!(bird.pos.y > skyflap::consts::BIRD_START.y);
}

#[test]
fn unattended_run_ends_on_the_ground() {
    let mut state = GameState::new(42);
    let input = TickInput::default();
    for _ in 0..600 {
        tick(&mut state, &input, DT);
        if !state.bird.alive {
            break;
        }
    }
    assert!(!state.bird.alive);
    let events = state.drain_events();
    assert!(events.iter().any(|e| matches!(e, GameEvent::Died { .. })));
    assert!(state.bird.grounded || state.bird.pos.y > skyflap::consts::BIRD_START.y);
}

#[test]
fn same_seed_same_run() {
    let run = |seed| {
        let mut state = GameState::new(seed);
        let input = TickInput {
            flap: false,
            autopilot: true,
        };
        for _ in 0..900 {
            tick(&mut state, &input, DT);
        }
        (
            state.bird.pos,
            state.score,
            state.spawner.obstacles().len(),
            state.spawner.biome(),
        )
    };
    assert_eq!(run(7), run(7));
}

#[test]
fn combo_replaces_the_single_effect() {
    let mut state = GameState::new(3);
    let bird = &mut state.bird;
    let power_ups = &mut state.power_ups;

    let first = power_ups.collect(PowerUpKind::Slow, Vec2::ZERO, bird);
    assert_eq!(first.combo, None);
    assert!(power_ups.effects.is_slow());

    let second = power_ups.collect(PowerUpKind::Shield, Vec2::ZERO, bird);
    assert_eq!(second.combo, Some(Combo::SuperMode));
    assert_eq!(bird.shield_time, power_ups.config.super_shield_ms);
    assert_eq!(bird.last_power_up, None);

    // The window is spent; a third pickup starts over
    let third = power_ups.collect(PowerUpKind::Rainbow, Vec2::ZERO, bird);
    assert_eq!(third.combo, None);
    assert_eq!(power_ups.counters.combos_triggered, 1);
    assert_eq!(power_ups.counters.shields_used, 1);
}

#[test]
fn session_lifecycle() {
    let mut session = Session::new(Settings::default(), BestScores::new(), 11);
    assert_eq!(session.phase(), GamePhase::Menu);

    session.flap();
    assert_eq!(session.phase(), GamePhase::Run);
    assert!(session.toggle_pause());
    assert_eq!(session.phase(), GamePhase::Pause);
    assert!(session.update(DT, 0.0).is_empty());
    assert!(session.toggle_pause());

    session.state.add_score(2);
    for _ in 0..600 {
        session.update(DT, 5.0);
        if session.phase() == GamePhase::GameOver {
            break;
        }
    }
    assert_eq!(session.phase(), GamePhase::GameOver);
    assert_eq!(session.best_scores.top_score(), 2);
    assert!(session.go_to_menu());
    assert!(session.start());
    assert_eq!(session.state.best_score, 2);
}

proptest! {
    #[test]
    fn seeded_pipe_fills_the_playfield(seed in any::<u64>()) {
        let world = World::default();
        let mut spawner = ObstacleSpawner::new(SpawnerConfig::for_world(&world.params));
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut ids = EntityIds::default();
        let pattern = ObstaclePattern::pipe(80.0, 120.0, world.params.pipe_width);

        let created = spawner.spawn_obstacle(&pattern, Some(400.0), &world, &mut rng, &mut ids, 0.0);
        prop_assert!(!created.is_empty());

        let top = spawner.obstacles().iter().find(|o| o.half == ObstacleHalf::Top);
        let bottom = spawner.obstacles().iter().find(|o| o.half == ObstacleHalf::Bottom);
        if let (Some(top), Some(bottom)) = (top, bottom) {
            prop_assert_eq!(top.gap_id, bottom.gap_id);
            let gap = bottom.pos.y - (top.pos.y + top.size.y);
            prop_assert!((80.0 - 1e-3..=120.0 + 1e-3).contains(&gap));
            let total = top.size.y + gap + bottom.size.y;
            prop_assert!((total - (world.ground_y() - world.ceiling_y())).abs() < 1e-3);
        }
    }
}
