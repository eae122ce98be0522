//! # chain-reaction
//!
//! A two-player chain reaction game on a rectangular grid, with a
//! heuristic computer opponent.
//!
//! Players take turns adding an atom to an empty cell or one of their own.
//! A cell holding as many atoms as it has neighbours explodes: it sends one
//! atom to each neighbour and captures it. Explosions cascade until the
//! board settles. A player whose last atom is captured loses.
//!
//! ## Design Principles
//!
//! 1. **Cheap snapshots**: `Grid` stores cells in an `im::Vector`, so the
//!    evaluator clones it once per candidate move.
//!
//! 2. **Deterministic**: every random draw goes through `GameRng`. A seed
//!    replays a whole game, computer moves included.
//!
//! 3. **Owned by one writer**: the live grid belongs to `Game`. Computer
//!    seats think on their own thread over a snapshot and hand back a cell.
//!
//! ## Modules
//!
//! - `core`: players, RNG, settings, errors
//! - `grid`: cells, coordinates, neighbourhoods, critical masses
//! - `reaction`: cascade resolution and reaction events
//! - `ai`: move policies and the bounded evaluation runner
//! - `game`: turn order, win detection, the session driver
//! - `selfplay`: headless computer-vs-computer games

pub mod ai;
pub mod core;
pub mod game;
pub mod grid;
pub mod reaction;
pub mod selfplay;

// Re-export commonly used types
pub use crate::core::{
    ConfigError, Controller, EvaluationError, GameRng, GameSettings, GridError, MoveRejected,
    Player, PlayerMap, PolicyKind, SeatConfig, SelfPlayError, TurnError,
};

pub use crate::grid::{Cell, Coord, Grid};

pub use crate::reaction::{EventLog, Move, ReactionEngine, ReactionEvent, ReactionObserver, ReactionSummary};

pub use crate::ai::{BoundedRunner, HeuristicEvaluator, MovePolicy, RandomPolicy, TieBreak};

pub use crate::game::{ClickOutcome, Game, GameStatus, MoveReport, SeatStatus, Session};

pub use crate::selfplay::{SelfPlayConfig, SelfPlaySummary};
