//! Game controller: turn order, move legality and win detection.
//!
//! `Game` is the only thing that drives the reaction engine in response to
//! a player. It owns the live grid; computer seats only ever receive
//! snapshots of it.
//!
//! ## Computer turns
//!
//! A computer move is split in two so the evaluation can run elsewhere:
//!
//! 1. `begin_computer_turn` blocks further moves and returns a
//!    `ComputerTurn` (grid snapshot, policy, RNG fork)
//! 2. `complete_computer_turn` applies the chosen cell and unblocks
//!
//! While blocked, `select_move` refuses every request. It also refuses
//! to play a human move for a seat the computer holds.
//!
//! Not thread-safe: one `Game` has one writer at a time.

use std::sync::Arc;

use tracing::{debug, info};

use super::status::{GameStatus, MoveReport, SeatStatus};
use crate::ai::{BoundedRunner, MovePolicy};
use crate::core::{ConfigError, GameRng, GameSettings, MoveRejected, Player, PlayerMap, TurnError};
use crate::grid::{Coord, Grid};
use crate::reaction::{ReactionEngine, ReactionObserver};

/// Everything a computer seat needs to choose its move off the game thread.
pub struct ComputerTurn {
    pub player: Player,
    pub grid: Grid,
    pub policy: Arc<dyn MovePolicy>,
    pub rng: GameRng,
}

/// One game from the first placement to a winner.
#[derive(Debug)]
pub struct Game {
    settings: GameSettings,
    grid: Grid,
    engine: ReactionEngine,
    seats: PlayerMap<SeatStatus>,
    current: Player,
    status: GameStatus,
    moves_played: u32,
    moves_blocked: bool,
    rng: GameRng,
}

impl Game {
    /// Start a game. Seats are built from `settings`.
    pub fn new(settings: GameSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let grid = Grid::new(settings.width, settings.height)?;
        let seats = PlayerMap::new(|player| SeatStatus::from_config(&settings.seat(player)));
        let rng = GameRng::new(settings.seed);

        debug!(
            width = settings.width,
            height = settings.height,
            seed = settings.seed,
            first = ?seats[Player::First],
            second = ?seats[Player::Second],
            "new game"
        );

        Ok(Self {
            settings,
            grid,
            engine: ReactionEngine::new(),
            seats,
            current: Player::First,
            status: GameStatus::InProgress,
            moves_played: 0,
            moves_blocked: false,
            rng,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Read-only view of the live grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn current_player(&self) -> Player {
        self.current
    }

    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub fn winner(&self) -> Option<Player> {
        self.status.winner()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.status.is_over()
    }

    /// Placements accepted so far.
    #[must_use]
    pub fn moves_played(&self) -> u32 {
        self.moves_played
    }

    /// Is a computer turn in flight?
    #[must_use]
    pub fn moves_blocked(&self) -> bool {
        self.moves_blocked
    }

    #[must_use]
    pub fn seat(&self, player: Player) -> &SeatStatus {
        &self.seats[player]
    }

    /// Hand a seat to a human or a different policy.
    pub fn set_seat(&mut self, player: Player, seat: SeatStatus) {
        debug!(%player, ?seat, "seat changed");
        self.seats[player] = seat;
    }

    /// Does the player to move have a policy, and is the game still open?
    #[must_use]
    pub fn is_computer_turn(&self) -> bool {
        !self.is_over() && self.seats[self.current].is_computer()
    }

    /// Register an observer for every reaction from now on.
    pub fn add_observer(&mut self, observer: Arc<dyn ReactionObserver>) {
        self.engine.add_observer(observer);
    }

    /// Submit a human move for the player to move.
    ///
    /// Refused without side effects while a computer turn is in flight,
    /// after the game is won, when the seat to move belongs to the
    /// computer, or for a cell outside the grid or owned by the opponent.
    pub fn select_move(&mut self, x: usize, y: usize) -> Result<MoveReport, MoveRejected> {
        if self.moves_blocked {
            return Err(MoveRejected::MovesBlocked);
        }
        if self.is_computer_turn() {
            debug!(player = %self.current, x, y, "human move refused on computer seat");
            return Err(MoveRejected::ComputerTurn {
                player: self.current,
            });
        }
        self.play(Coord::new(x, y))
    }

    /// Block moves and hand out what the current computer seat needs.
    pub fn begin_computer_turn(&mut self) -> Result<ComputerTurn, MoveRejected> {
        if self.moves_blocked {
            return Err(MoveRejected::MovesBlocked);
        }
        if let GameStatus::Won(winner) = self.status {
            return Err(MoveRejected::GameOver { winner });
        }
        let policy = self.seats[self.current]
            .policy()
            .cloned()
            .ok_or(MoveRejected::NotComputerTurn)?;

        self.moves_blocked = true;
        Ok(ComputerTurn {
            player: self.current,
            grid: self.grid.clone(),
            policy,
            rng: self.rng.fork(),
        })
    }

    /// Apply the computer's chosen cell and unblock.
    ///
    /// An illegal choice is refused and leaves the game unblocked with the
    /// same player to move.
    pub fn complete_computer_turn(&mut self, coord: Coord) -> Result<MoveReport, MoveRejected> {
        if !self.moves_blocked {
            return Err(MoveRejected::NotComputerTurn);
        }
        self.moves_blocked = false;
        self.play(coord)
    }

    /// Abandon an in-flight computer turn.
    pub fn cancel_computer_turn(&mut self) {
        self.moves_blocked = false;
    }

    /// Run the current computer seat to completion on `runner`.
    pub fn play_computer_turn(&mut self, runner: &BoundedRunner) -> Result<MoveReport, TurnError> {
        let turn = self.begin_computer_turn()?;
        match runner.run(turn.policy, turn.grid, turn.player, turn.rng) {
            Ok(coord) => Ok(self.complete_computer_turn(coord)?),
            Err(err) => {
                self.cancel_computer_turn();
                Err(err.into())
            }
        }
    }

    fn check_move(&self, coord: Coord) -> Result<(), MoveRejected> {
        if let GameStatus::Won(winner) = self.status {
            return Err(MoveRejected::GameOver { winner });
        }
        let cell = self
            .grid
            .get(coord)
            .ok_or(MoveRejected::OutOfBounds { coord })?;
        match cell.owner {
            Some(owner) if owner != self.current => Err(MoveRejected::OpponentCell { coord, owner }),
            _ => Ok(()),
        }
    }

    fn play(&mut self, coord: Coord) -> Result<MoveReport, MoveRejected> {
        if let Err(rejected) = self.check_move(coord) {
            debug!(player = %self.current, %coord, %rejected, "move rejected");
            return Err(rejected);
        }

        let player = self.current;
        let opponent = player.opponent();
        let summary = self.engine.apply(&mut self.grid, player, coord);

        // The opponent's empty board only counts once they have moved.
        let opponent_has_moved = self.moves_played >= 1;
        self.moves_played += 1;
        if opponent_has_moved && self.grid.player_atoms(opponent) == 0 {
            self.status = GameStatus::Won(player);
            info!(winner = %player, moves = self.moves_played, "game won");
        }
        self.current = opponent;

        debug!(
            %player,
            %coord,
            generations = summary.generations,
            transfers = summary.transfers,
            "move applied"
        );

        Ok(MoveReport {
            player,
            coord,
            summary,
            status: self.status,
        })
    }
}
