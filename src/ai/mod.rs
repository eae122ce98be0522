//! Computer opponents.
//!
//! ## Overview
//!
//! - `MovePolicy`: the seam between the game and a computer seat
//! - `HeuristicEvaluator`: scores every legal placement by simulating it
//!   on a private clone of the grid
//! - `RandomPolicy`: baseline opponent
//! - `BoundedRunner`: runs a policy on its own thread under a deadline,
//!   with cooperative cancellation
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use chain_reaction::ai::{BoundedRunner, HeuristicEvaluator};
//! use chain_reaction::core::{GameRng, Player};
//! use chain_reaction::grid::Grid;
//!
//! let grid = Grid::new(6, 5).unwrap();
//! let runner = BoundedRunner::new(Duration::from_millis(1500));
//! let coord = runner
//!     .run(Arc::new(HeuristicEvaluator::default()), grid.clone(), Player::First, GameRng::new(42))
//!     .unwrap();
//! assert!(grid.can_place(Player::First, coord));
//! ```

pub mod evaluator;
pub mod policy;
pub mod runner;

pub use evaluator::{danger, endangered_cells, HeuristicEvaluator, TieBreak};
pub use policy::{CancelToken, MovePolicy, RandomPolicy};
pub use runner::{BoundedRunner, EvaluationTask, DEFAULT_BUDGET};
