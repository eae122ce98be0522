//! Move policies for computer-controlled seats.
//!
//! Policies are trait objects so a seat can hold any of them:
//! - `HeuristicEvaluator`: one-ply lookahead with a danger heuristic
//! - `RandomPolicy`: uniformly random legal cell
//!
//! A policy is a pure function of the grid, the seat it plays for, its RNG
//! stream and a cancellation token. It never sees the live grid, only a
//! snapshot handed out by the controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::{EvaluationError, GameRng, Player};
use crate::grid::{Coord, Grid};

/// Cooperative cancellation flag shared between a runner and a policy.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the policy to stop and answer with what it has.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Chooses a placement for a computer seat.
pub trait MovePolicy: Send + Sync {
    /// Short name for logs and CLI output.
    fn name(&self) -> &str;

    /// Choose a legal cell for `player` on `grid`.
    ///
    /// Policies check `cancel` between candidates and return their best
    /// answer so far once it is set. `NoLegalMove` is only possible on a
    /// board the caller should already have recognised as decided.
    fn choose_move(
        &self,
        grid: &Grid,
        player: Player,
        rng: &mut GameRng,
        cancel: &CancelToken,
    ) -> Result<Coord, EvaluationError>;
}

/// Picks uniformly among legal cells.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPolicy;

impl MovePolicy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_move(
        &self,
        grid: &Grid,
        player: Player,
        rng: &mut GameRng,
        _cancel: &CancelToken,
    ) -> Result<Coord, EvaluationError> {
        let legal = grid.legal_cells(player);
        rng.choose(&legal)
            .copied()
            .ok_or(EvaluationError::NoLegalMove { player })
    }
}
