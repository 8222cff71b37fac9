//! Coarse session state machine
//!
//! Gates which transitions are legal and notifies listeners in a fixed
//! order: exit(old), enter(new), change(old, new).

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing simulating
    #[default]
    Menu,
    /// Active gameplay
    Run,
    /// Game is paused
    Pause,
    /// Run ended
    GameOver,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Menu => "menu",
            GamePhase::Run => "run",
            GamePhase::Pause => "pause",
            GamePhase::GameOver => "gameover",
        }
    }

    /// Whitelisted targets from this phase
    pub fn allowed_targets(&self) -> &'static [GamePhase] {
        match self {
            GamePhase::Menu => &[GamePhase::Run],
            GamePhase::Run => &[GamePhase::Pause, GamePhase::GameOver, GamePhase::Menu],
            GamePhase::Pause => &[GamePhase::Run, GamePhase::Menu],
            GamePhase::GameOver => &[GamePhase::Menu, GamePhase::Run],
        }
    }

    pub fn can_transition_to(&self, to: GamePhase) -> bool {
        *self == to || self.allowed_targets().contains(&to)
    }
}

type PhaseCallback = Box<dyn FnMut(GamePhase) -> SimResult<()>>;
type ChangeCallback = Box<dyn FnMut(GamePhase, GamePhase) -> SimResult<()>>;

#[derive(Default)]
pub struct GameStateMachine {
    current: GamePhase,
    previous: Option<GamePhase>,
    on_enter: Vec<(GamePhase, PhaseCallback)>,
    on_exit: Vec<(GamePhase, PhaseCallback)>,
    on_change: Vec<ChangeCallback>,
}

impl std::fmt::Debug for GameStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStateMachine")
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("listeners", &(self.on_enter.len() + self.on_exit.len() + self.on_change.len()))
            .finish()
    }
}

impl GameStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> GamePhase {
        self.current
    }

    pub fn previous(&self) -> Option<GamePhase> {
        self.previous
    }

    pub fn is(&self, phase: GamePhase) -> bool {
        self.current == phase
    }

    pub fn on_enter<F>(&mut self, phase: GamePhase, callback: F)
    where
        F: FnMut(GamePhase) -> SimResult<()> + 'static,
    {
        self.on_enter.push((phase, Box::new(callback)));
    }

    pub fn on_exit<F>(&mut self, phase: GamePhase, callback: F)
    where
        F: FnMut(GamePhase) -> SimResult<()> + 'static,
    {
        self.on_exit.push((phase, Box::new(callback)));
    }

    pub fn on_change<F>(&mut self, callback: F)
    where
        F: FnMut(GamePhase, GamePhase) -> SimResult<()> + 'static,
    {
        self.on_change.push(Box::new(callback));
    }

    /// Transition, reporting rejected moves as an error
    pub fn try_set_state(&mut self, to: GamePhase) -> SimResult<()> {
        let from = self.current;
        if from == to {
            return Ok(());
        }
        if !from.can_transition_to(to) {
            log::warn!("Rejected phase transition {} -> {}", from.as_str(), to.as_str());
            return Err(SimError::InvalidTransition { from, to });
        }

        self.previous = Some(from);
        self.current = to;
        log::info!("Phase {} -> {}", from.as_str(), to.as_str());

        // Exit handlers receive the phase being entered, enter handlers the one left
        for (phase, callback) in &mut self.on_exit {
            if *phase == from {
                report(callback(to));
            }
        }
        for (phase, callback) in &mut self.on_enter {
            if *phase == to {
                report(callback(from));
            }
        }
        for callback in &mut self.on_change {
            report(callback(from, to));
        }
        Ok(())
    }

    /// Transition; false when the whitelist forbids it
    pub fn set_state(&mut self, to: GamePhase) -> bool {
        self.try_set_state(to).is_ok()
    }

    /// RUN <-> PAUSE; anything else is a no-op returning false
    pub fn toggle_pause(&mut self) -> bool {
        match self.current {
            GamePhase::Run => self.set_state(GamePhase::Pause),
            GamePhase::Pause => self.set_state(GamePhase::Run),
            _ => false,
        }
    }

    /// Back to RUN from GAMEOVER, PAUSE or MENU
    pub fn restart(&mut self) -> bool {
        match self.current {
            GamePhase::GameOver | GamePhase::Pause | GamePhase::Menu => {
                self.set_state(GamePhase::Run)
            }
            GamePhase::Run => false,
        }
    }
}

fn report(result: SimResult<()>) {
    if let Err(e) = result {
        log::error!("Phase callback failed: {e}");
    }
}
