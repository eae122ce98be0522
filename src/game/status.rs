//! Game state machine values and per-seat status.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::{HeuristicEvaluator, MovePolicy, RandomPolicy};
use crate::core::{Controller, Player, PolicyKind, SeatConfig};
use crate::grid::Coord;
use crate::reaction::ReactionSummary;

/// Where a game stands. `Won` is terminal: a finished game is replaced,
/// never reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    InProgress,
    Won(Player),
}

impl GameStatus {
    #[must_use]
    pub fn winner(self) -> Option<Player> {
        match self {
            GameStatus::InProgress => None,
            GameStatus::Won(player) => Some(player),
        }
    }

    #[must_use]
    pub fn is_over(self) -> bool {
        matches!(self, GameStatus::Won(_))
    }
}

/// Result of an accepted move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub player: Player,
    pub coord: Coord,
    pub summary: ReactionSummary,
    /// Status after the move.
    pub status: GameStatus,
}

/// Who plays a seat: a human, or a computer with its policy.
#[derive(Clone)]
pub struct SeatStatus {
    policy: Option<Arc<dyn MovePolicy>>,
}

impl SeatStatus {
    pub fn human() -> Self {
        Self { policy: None }
    }

    pub fn computer(policy: Arc<dyn MovePolicy>) -> Self {
        Self {
            policy: Some(policy),
        }
    }

    /// Build the seat a configuration describes.
    pub fn from_config(config: &SeatConfig) -> Self {
        match config.controller {
            Controller::Human => Self::human(),
            Controller::Computer => {
                let policy: Arc<dyn MovePolicy> = match config.policy {
                    PolicyKind::Heuristic => Arc::new(HeuristicEvaluator::new(config.tie_break)),
                    PolicyKind::Random => Arc::new(RandomPolicy),
                };
                Self::computer(policy)
            }
        }
    }

    #[must_use]
    pub fn is_computer(&self) -> bool {
        self.policy.is_some()
    }

    /// The policy of a computer seat.
    #[must_use]
    pub fn policy(&self) -> Option<&Arc<dyn MovePolicy>> {
        self.policy.as_ref()
    }
}

impl std::fmt::Debug for SeatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.policy {
            Some(policy) => write!(f, "Computer({})", policy.name()),
            None => write!(f, "Human"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::TieBreak;

    #[test]
    fn test_status_winner() {
        assert_eq!(GameStatus::InProgress.winner(), None);
        assert!(!GameStatus::InProgress.is_over());
        assert_eq!(GameStatus::Won(Player::Second).winner(), Some(Player::Second));
        assert!(GameStatus::Won(Player::First).is_over());
    }

    #[test]
    fn test_seat_from_config() {
        let human = SeatStatus::from_config(&SeatConfig::human());
        assert!(!human.is_computer());
        assert!(human.policy().is_none());

        let heuristic = SeatStatus::from_config(
            &SeatConfig::computer(PolicyKind::Heuristic).with_tie_break(TieBreak::CoinFlip),
        );
        assert_eq!(heuristic.policy().unwrap().name(), "heuristic");

        let random = SeatStatus::from_config(&SeatConfig::computer(PolicyKind::Random));
        assert_eq!(format!("{random:?}"), "Computer(random)");
    }
}
