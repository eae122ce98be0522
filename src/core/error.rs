//! Error types.
//!
//! Recoverable failures only. Broken preconditions inside the reaction
//! engine (out-of-bounds placement, placing on an opponent's cell) are
//! caller bugs and panic instead.

use std::path::PathBuf;

use thiserror::Error;

use super::player::Player;
use crate::grid::Coord;

/// Invalid grid shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be at least 1x1, got {width}x{height}")]
    EmptyDimension { width: usize, height: usize },

    #[error("a {width}x{height} grid has a single cell with no neighbours")]
    SingleCell { width: usize, height: usize },

    #[error("malformed grid: {0}")]
    Parse(String),
}

/// Failure to load or validate `GameSettings`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid grid: {0}")]
    Grid(#[from] GridError),

    #[error("a game needs a board at least 2x2, got {width}x{height}")]
    NarrowBoard { width: usize, height: usize },

    #[error("evaluation budget must be positive")]
    ZeroBudget,
}

/// A move request the controller refused. The game is left untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejected {
    #[error("a move is already being resolved")]
    MovesBlocked,

    #[error("the game is over, {winner} won")]
    GameOver { winner: Player },

    #[error("{coord} is outside the grid")]
    OutOfBounds { coord: Coord },

    #[error("{coord} belongs to {owner}")]
    OpponentCell { coord: Coord, owner: Player },

    #[error("{player} is played by the computer")]
    ComputerTurn { player: Player },

    #[error("it is not a computer player's turn")]
    NotComputerTurn,
}

/// Failure of a move policy or of the thread running it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("{player} has no legal cell to play")]
    NoLegalMove { player: Player },

    #[error("evaluation thread exited without a result")]
    Disconnected,
}

/// Failure to play a computer turn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error(transparent)]
    Rejected(#[from] MoveRejected),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Failure of a headless self-play run.
#[derive(Error, Debug)]
pub enum SelfPlayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("game {game} failed: {source}")]
    Turn {
        game: usize,
        #[source]
        source: TurnError,
    },
}
