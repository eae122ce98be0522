//! Session: the driver between an input surface and a `Game`.
//!
//! A session owns the current game and the background evaluation of the
//! computer seat, and implements the click semantics a front end wants:
//!
//! - a click after the game is won starts a fresh game
//! - a click while the computer is thinking is ignored
//! - any other click is submitted as the human's move, after which the
//!   computer seat (if it is next) starts thinking in the background
//!
//! A computer turn that fails leaves the session stalled: the error is
//! kept, clicks are refused, and nothing is rescheduled until
//! `retry_computer`, `set_seat` or `new_game`.
//!
//! The front end calls `poll` from its frame loop, or `wait` /
//! `run_computer_turns` when it can block.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::controller::Game;
use super::status::{MoveReport, SeatStatus};
use crate::ai::{BoundedRunner, EvaluationTask};
use crate::core::{ConfigError, GameRng, GameSettings, MoveRejected, Player, TurnError};
use crate::grid::Coord;
use crate::reaction::ReactionObserver;

/// What a click did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The finished game was replaced by a new one.
    NewGame,
    /// The human's move was applied.
    Moved(MoveReport),
    /// The click was refused; nothing changed.
    Ignored(MoveRejected),
}

/// Owns the current game, its computer evaluation and its observers.
pub struct Session {
    settings: GameSettings,
    game: Game,
    runner: BoundedRunner,
    pending: Option<EvaluationTask>,
    observers: Vec<Arc<dyn ReactionObserver>>,
    seeds: GameRng,
    games_started: u32,
    stalled: Option<TurnError>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("game", &self.game)
            .field("runner", &self.runner)
            .field("pending", &self.pending)
            .field("observers", &self.observers.len())
            .field("games_started", &self.games_started)
            .field("stalled", &self.stalled)
            .finish()
    }
}

impl Session {
    /// Start a session and its first game. If the first seat is a
    /// computer it starts thinking immediately.
    pub fn new(settings: GameSettings) -> Result<Self, ConfigError> {
        let game = Game::new(settings.clone())?;
        let runner = BoundedRunner::new(settings.evaluation_budget());
        let seeds = GameRng::new(settings.seed);

        let mut session = Self {
            settings,
            game,
            runner,
            pending: None,
            observers: Vec::new(),
            seeds,
            games_started: 1,
            stalled: None,
        };
        session.schedule_computer();
        Ok(session)
    }

    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[must_use]
    pub fn games_started(&self) -> u32 {
        self.games_started
    }

    /// Is the computer seat evaluating right now?
    #[must_use]
    pub fn is_thinking(&self) -> bool {
        self.pending.is_some()
    }

    /// The error of the last computer turn, if it failed and has not been
    /// retried.
    #[must_use]
    pub fn stalled(&self) -> Option<&TurnError> {
        self.stalled.as_ref()
    }

    /// Clear a failed computer turn and evaluate it again.
    pub fn retry_computer(&mut self) {
        if let Some(err) = self.stalled.take() {
            info!(%err, "retrying computer turn");
        }
        self.schedule_computer();
    }

    /// Register an observer on this and every later game.
    pub fn add_observer(&mut self, observer: Arc<dyn ReactionObserver>) {
        self.game.add_observer(observer.clone());
        self.observers.push(observer);
    }

    /// A human clicked the cell `(x, y)`.
    pub fn click(&mut self, x: usize, y: usize) -> ClickOutcome {
        if self.pending.is_some() {
            debug!(x, y, "click ignored while computer is thinking");
            return ClickOutcome::Ignored(MoveRejected::MovesBlocked);
        }
        if self.game.is_over() {
            self.new_game();
            return ClickOutcome::NewGame;
        }
        if self.stalled.is_some() {
            debug!(x, y, "click ignored while computer turn is stalled");
            return ClickOutcome::Ignored(MoveRejected::ComputerTurn {
                player: self.game.current_player(),
            });
        }
        match self.game.select_move(x, y) {
            Ok(report) => {
                self.schedule_computer();
                ClickOutcome::Moved(report)
            }
            Err(rejected) => {
                debug!(x, y, %rejected, "click ignored");
                ClickOutcome::Ignored(rejected)
            }
        }
    }

    /// Replace the current game with a fresh one. Seats go back to the
    /// configured defaults; registered observers carry over.
    pub fn new_game(&mut self) {
        self.abandon_pending();
        self.stalled = None;

        let seed = self.seeds.fork().seed();
        let settings = self.settings.clone().with_seed(seed);
        // Settings were validated when the session was built.
        let mut game = match Game::new(settings) {
            Ok(game) => game,
            Err(err) => unreachable!("validated settings rejected: {err}"),
        };
        for observer in &self.observers {
            game.add_observer(observer.clone());
        }
        self.game = game;
        self.games_started += 1;
        info!(game = self.games_started, seed, "new game started");

        self.schedule_computer();
    }

    /// Swap who plays a seat. Takes effect immediately: an evaluation for
    /// that seat is abandoned, a stall on it is cleared, and a new computer
    /// seat to move starts thinking.
    pub fn set_seat(&mut self, player: Player, seat: SeatStatus) {
        if self.pending.as_ref().is_some_and(|task| task.player() == player) {
            self.abandon_pending();
        }
        if player == self.game.current_player() {
            self.stalled = None;
        }
        self.game.set_seat(player, seat);
        self.schedule_computer();
    }

    /// Collect the computer's move if it is ready. Never blocks.
    pub fn poll(&mut self) -> Option<Result<MoveReport, TurnError>> {
        let result = self.pending.as_mut()?.try_result()?;
        self.pending = None;
        Some(self.finish_computer_turn(result.map_err(TurnError::from)))
    }

    /// Block until the pending computer move (if any) is applied.
    pub fn wait(&mut self) -> Option<Result<MoveReport, TurnError>> {
        let task = self.pending.take()?;
        let result = task.wait();
        Some(self.finish_computer_turn(result.map_err(TurnError::from)))
    }

    /// Play computer moves until a human is to move or the game is won.
    pub fn run_computer_turns(&mut self) -> Result<Vec<MoveReport>, TurnError> {
        let mut reports = Vec::new();
        while let Some(result) = self.wait() {
            reports.push(result?);
        }
        Ok(reports)
    }

    fn finish_computer_turn(&mut self, result: Result<Coord, TurnError>) -> Result<MoveReport, TurnError> {
        let applied = result.and_then(|coord| {
            self.game
                .complete_computer_turn(coord)
                .map_err(TurnError::from)
        });
        match applied {
            Ok(report) => {
                self.schedule_computer();
                Ok(report)
            }
            Err(err) => {
                self.game.cancel_computer_turn();
                warn!(player = %self.game.current_player(), %err, "computer turn failed");
                self.stalled = Some(err.clone());
                Err(err)
            }
        }
    }

    fn schedule_computer(&mut self) {
        if self.stalled.is_some() || self.pending.is_some() || !self.game.is_computer_turn() {
            return;
        }
        match self.game.begin_computer_turn() {
            Ok(turn) => {
                self.pending = Some(self.runner.spawn(turn.policy, turn.grid, turn.player, turn.rng));
            }
            Err(rejected) => debug!(%rejected, "computer turn not started"),
        }
    }

    fn abandon_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.cancel();
            self.game.cancel_computer_turn();
        }
    }
}
