//! Bounded evaluation: run a move policy on its own thread under a
//! wall-clock budget.
//!
//! `BoundedRunner::spawn` hands the policy a private grid snapshot and
//! returns an `EvaluationTask` right away. The task can be polled with
//! `try_result` or finished with `wait`. When the budget runs out the task
//! raises the policy's `CancelToken`; the policy then answers with its best
//! candidate so far, so `wait` always ends shortly after the deadline.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::policy::{CancelToken, MovePolicy};
use crate::core::{EvaluationError, GameRng, Player};
use crate::grid::{Coord, Grid};

/// Default thinking time for one computer move.
pub const DEFAULT_BUDGET: Duration = Duration::from_millis(1500);

/// Starts policy evaluations with a fixed budget.
#[derive(Clone, Copy, Debug)]
pub struct BoundedRunner {
    budget: Duration,
}

impl Default for BoundedRunner {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET)
    }
}

impl BoundedRunner {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    #[must_use]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Start evaluating on a background thread.
    pub fn spawn(
        &self,
        policy: Arc<dyn MovePolicy>,
        grid: Grid,
        player: Player,
        mut rng: GameRng,
    ) -> EvaluationTask {
        let cancel = CancelToken::new();
        let (sender, receiver) = mpsc::channel();
        let worker_cancel = cancel.clone();
        let policy_name = policy.name().to_string();

        debug!(%player, policy = %policy_name, budget_ms = self.budget.as_millis() as u64, "evaluation started");

        thread::spawn(move || {
            let result = policy.choose_move(&grid, player, &mut rng, &worker_cancel);
            // The task may have been dropped; nobody is waiting then.
            let _ = sender.send(result);
        });

        let started = Instant::now();
        EvaluationTask {
            receiver,
            cancel,
            player,
            policy_name,
            started,
            deadline: started + self.budget,
        }
    }

    /// Evaluate and block until the answer is in.
    pub fn run(
        &self,
        policy: Arc<dyn MovePolicy>,
        grid: Grid,
        player: Player,
        rng: GameRng,
    ) -> Result<Coord, EvaluationError> {
        self.spawn(policy, grid, player, rng).wait()
    }
}

/// A running evaluation. Dropping it cancels the policy.
#[derive(Debug)]
pub struct EvaluationTask {
    receiver: Receiver<Result<Coord, EvaluationError>>,
    cancel: CancelToken,
    player: Player,
    policy_name: String,
    started: Instant,
    deadline: Instant,
}

impl EvaluationTask {
    /// Seat being evaluated for.
    #[must_use]
    pub fn player(&self) -> Player {
        self.player
    }

    #[must_use]
    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }

    /// Has the budget run out?
    #[must_use]
    pub fn is_overdue(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Ask the policy to stop early.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Non-blocking check. Returns `None` while the policy is still
    /// thinking; raises cancellation once the deadline has passed.
    pub fn try_result(&mut self) -> Option<Result<Coord, EvaluationError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(self.finish(result)),
            Err(TryRecvError::Empty) => {
                if self.is_overdue() && !self.cancel.is_cancelled() {
                    self.overdue();
                }
                None
            }
            Err(TryRecvError::Disconnected) => Some(Err(EvaluationError::Disconnected)),
        }
    }

    /// Block until the policy answers, cancelling it at the deadline.
    pub fn wait(self) -> Result<Coord, EvaluationError> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        match self.receiver.recv_timeout(remaining) {
            Ok(result) => self.finish(result),
            Err(RecvTimeoutError::Timeout) => {
                self.overdue();
                match self.receiver.recv() {
                    Ok(result) => self.finish(result),
                    Err(_) => Err(EvaluationError::Disconnected),
                }
            }
            Err(RecvTimeoutError::Disconnected) => Err(EvaluationError::Disconnected),
        }
    }

    fn overdue(&self) {
        warn!(
            player = %self.player,
            policy = %self.policy_name,
            "evaluation exceeded its budget, cancelling"
        );
        self.cancel.cancel();
    }

    fn finish(
        &self,
        result: Result<Coord, EvaluationError>,
    ) -> Result<Coord, EvaluationError> {
        debug!(
            player = %self.player,
            policy = %self.policy_name,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "evaluation finished"
        );
        result
    }
}

impl Drop for EvaluationTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
