//! A play session: phase machine, simulation state and player settings
//!
//! Hosts feed input and frame deltas in; events and snapshots come out.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::SimResult;
use crate::highscores::BestScores;
use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, GameState, GameStateMachine, SpawnerConfig, TickInput, tick};

#[derive(Debug)]
pub struct Session {
    machine: GameStateMachine,
    pub state: GameState,
    pub settings: Settings,
    pub best_scores: BestScores,
    /// Seeds successive runs
    seeds: Pcg32,
    autopilot: bool,
    pending_flap: bool,
    last_rank: Option<usize>,
}

impl Session {
    pub fn new(settings: Settings, best_scores: BestScores, seed: u64) -> Self {
        let mut seeds = Pcg32::seed_from_u64(seed);
        let state = GameState::with_config(seeds.random(), settings.game_config());
        let mut session = Self {
            machine: GameStateMachine::new(),
            state,
            settings,
            best_scores,
            seeds,
            autopilot: false,
            pending_flap: false,
            last_rank: None,
        };
        session.sync_settings();
        session.state.best_score = session.best_scores.best_for(session.settings.difficulty);
        session
    }

    pub fn phase(&self) -> GamePhase {
        self.machine.current()
    }

    pub fn machine_mut(&mut self) -> &mut GameStateMachine {
        &mut self.machine
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        self.autopilot = enabled;
    }

    pub fn autopilot(&self) -> bool {
        self.autopilot
    }

    /// Rank of the last finished run in the best-score table
    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    /// Flap input. From the menu this starts a run.
    pub fn flap(&mut self) {
        match self.phase() {
            GamePhase::Menu => {
                self.start();
            }
            GamePhase::Run => self.pending_flap = true,
            GamePhase::Pause | GamePhase::GameOver => {}
        }
    }

    /// Menu -> Run with a fresh state
    pub fn start(&mut self) -> bool {
        if !self.machine.is(GamePhase::Menu) {
            return false;
        }
        self.new_run();
        self.machine.set_state(GamePhase::Run)
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.pending_flap = false;
        self.machine.toggle_pause()
    }

    /// Pause if running; used on focus loss
    pub fn pause(&mut self) -> bool {
        self.machine.is(GamePhase::Run) && self.toggle_pause()
    }

    /// New run from GameOver, Pause or Menu
    pub fn restart(&mut self) -> bool {
        if self.machine.is(GamePhase::Run) {
            return false;
        }
        self.new_run();
        self.machine.restart()
    }

    pub fn go_to_menu(&mut self) -> bool {
        self.machine.set_state(GamePhase::Menu)
    }

    fn new_run(&mut self) {
        self.pending_flap = false;
        self.last_rank = None;
        self.state.best_score = self.best_scores.best_for(self.settings.difficulty);
        let seed = self.seeds.random();
        self.state.reset(seed);
    }

    /// Advance one frame. Only simulates while running.
    ///
    /// `wall_clock_ms` timestamps a best-score entry if the run ends.
    pub fn update(&mut self, delta_ms: f32, wall_clock_ms: f64) -> Vec<GameEvent> {
        if !self.machine.is(GamePhase::Run) {
            return Vec::new();
        }
        let input = TickInput {
            flap: std::mem::take(&mut self.pending_flap),
            autopilot: self.autopilot,
        };
        tick(&mut self.state, &input, delta_ms);
        let events = self.state.drain_events();

        if !self.state.bird.alive {
            self.finish_run(wall_clock_ms);
        }
        events
    }

    fn finish_run(&mut self, wall_clock_ms: f64) {
        if !self.machine.set_state(GamePhase::GameOver) {
            return;
        }
        let stats = self.state.stats();
        log::info!(
            "Run over: score {} ({} pipes, {} coins)",
            stats.score,
            stats.pipes_passed,
            stats.coins_collected
        );
        self.last_rank = self.best_scores.record(
            &stats,
            self.settings.difficulty,
            self.settings.skin,
            wall_clock_ms,
        );
        if self.last_rank.is_some() {
            self.best_scores.save();
        }
    }

    /// Replace settings and push them into the simulation
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.settings.sanitize();
        self.sync_settings();
        self.settings.save();
    }

    /// Apply a difficulty preset by name
    pub fn set_difficulty(&mut self, name: &str) -> SimResult<()> {
        self.state.world.apply_preset_named(name)?;
        self.settings.difficulty = self.state.world.preset();
        self.state.spawner.refresh_patterns(&self.state.world.params);
        Ok(())
    }

    fn sync_settings(&mut self) {
        let state = &mut self.state;
        state.world.apply_preset(self.settings.difficulty);
        state.bird.skin = self.settings.skin;
        state.bird.config.double_jump_enabled = self.settings.double_jump;
        state.collisions.set_broad_phase(self.settings.broad_phase);
        state.spawner.refresh_patterns(&state.world.params);
    }

    /// Fit the world to the host viewport
    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.world.resize(width, height);
        let patterns = std::mem::take(&mut self.state.spawner.config.patterns);
        self.state.spawner.config = SpawnerConfig {
            patterns,
            ..SpawnerConfig::for_world(&self.state.world.params)
        };
    }
}
