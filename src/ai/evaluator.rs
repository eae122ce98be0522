//! One-ply heuristic move evaluator.
//!
//! For every cell the acting player may play, the evaluator clones the
//! grid, places an atom there, lets the reaction engine settle the clone and
//! scores the result:
//!
//! ```text
//! score = own cells + own atoms
//!       + opponent atoms destroyed
//!       + 1 if the move is in a corner
//!       - 4 * danger at the placed cell
//!       - own cells in danger
//! ```
//!
//! A cell is in danger when an orthogonal neighbour owned by the opponent
//! is one atom short of exploding.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::policy::{CancelToken, MovePolicy};
use crate::core::{EvaluationError, GameRng, Player};
use crate::grid::{Coord, Grid};
use crate::reaction::ReactionEngine;

/// Weight of the danger at the placed cell.
const DANGER_WEIGHT: i64 = 4;

/// How equal-scoring candidates are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Each equal candidate is picked with the same probability
    /// (the k-th tie replaces the best with probability 1/k).
    #[default]
    Uniform,
    /// A fair coin is flipped for every candidate that is not strictly
    /// better; an equal candidate replaces the best on heads. Later ties
    /// are favoured.
    CoinFlip,
}

/// Number of opponent-owned neighbours of `coord` that are one atom short
/// of exploding.
#[must_use]
pub fn danger(grid: &Grid, player: Player, coord: Coord) -> usize {
    grid.neighbors(coord)
        .into_iter()
        .filter(|&n| {
            grid.cell(n).owner.is_some_and(|owner| owner != player) && grid.is_critical(n)
        })
        .count()
}

/// Number of `player`'s cells with at least one dangerous neighbour.
#[must_use]
pub fn endangered_cells(grid: &Grid, player: Player) -> usize {
    grid.coords()
        .filter(|&c| grid.cell(c).is_owned_by(player) && danger(grid, player, c) > 0)
        .count()
}

/// The single-ply lookahead policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicEvaluator {
    tie_break: TieBreak,
}

impl HeuristicEvaluator {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    #[must_use]
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Score placing `player`'s atom at `coord`. `coord` must be legal.
    #[must_use]
    pub fn score_move(&self, grid: &Grid, player: Player, coord: Coord) -> i64 {
        let opponent_before = grid.player_atoms(player.opponent());
        score_candidate(&ReactionEngine::new(), grid, player, coord, opponent_before)
    }

    /// Scores of every legal cell, in candidate order.
    #[must_use]
    pub fn scores(&self, grid: &Grid, player: Player) -> Vec<(Coord, i64)> {
        let engine = ReactionEngine::new();
        let opponent_before = grid.player_atoms(player.opponent());
        grid.legal_cells(player)
            .into_iter()
            .map(|coord| {
                let score = score_candidate(&engine, grid, player, coord, opponent_before);
                (coord, score)
            })
            .collect()
    }
}

fn score_candidate(
    engine: &ReactionEngine,
    grid: &Grid,
    player: Player,
    coord: Coord,
    opponent_before: u32,
) -> i64 {
    let mut after = grid.clone();
    engine.apply(&mut after, player, coord);

    let opponent_lost = i64::from(opponent_before) - i64::from(after.player_atoms(player.opponent()));
    let corner_bonus = i64::from(grid.is_corner(coord));

    count(after.player_cells(player)) + i64::from(after.player_atoms(player)) + opponent_lost
        + corner_bonus
        - DANGER_WEIGHT * count(danger(&after, player, coord))
        - count(endangered_cells(&after, player))
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl MovePolicy for HeuristicEvaluator {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn choose_move(
        &self,
        grid: &Grid,
        player: Player,
        rng: &mut GameRng,
        cancel: &CancelToken,
    ) -> Result<Coord, EvaluationError> {
        let engine = ReactionEngine::new();
        let opponent_before = grid.player_atoms(player.opponent());

        let mut best: Option<(Coord, i64)> = None;
        let mut ties = 0u32;
        let mut evaluated = 0usize;

        for coord in grid.coords().filter(|&c| grid.can_place(player, c)) {
            if cancel.is_cancelled() {
                match best {
                    Some((chosen, score)) => {
                        debug!(%player, %chosen, score, evaluated, "evaluation cancelled");
                        return Ok(chosen);
                    }
                    None => {
                        debug!(%player, %coord, "evaluation cancelled before scoring");
                        return Ok(coord);
                    }
                }
            }

            let score = score_candidate(&engine, grid, player, coord, opponent_before);
            evaluated += 1;

            let replace = match best {
                None => {
                    ties = 1;
                    true
                }
                Some((_, best_score)) => match self.tie_break {
                    TieBreak::Uniform => {
                        if score > best_score {
                            ties = 1;
                            true
                        } else if score == best_score {
                            ties += 1;
                            rng.one_in(ties)
                        } else {
                            false
                        }
                    }
                    TieBreak::CoinFlip => {
                        score > best_score || (rng.coin_flip() && score == best_score)
                    }
                },
            };
            if replace {
                best = Some((coord, score));
            }
        }

        match best {
            Some((chosen, score)) => {
                debug!(%player, %chosen, score, evaluated, "heuristic move chosen");
                Ok(chosen)
            }
            None => {
                error!(%player, "no legal cell to evaluate");
                Err(EvaluationError::NoLegalMove { player })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choose(grid: &Grid, player: Player, seed: u64, tie_break: TieBreak) -> Coord {
        HeuristicEvaluator::new(tie_break)
            .choose_move(grid, player, &mut GameRng::new(seed), &CancelToken::new())
            .unwrap()
    }

    #[test]
    fn test_danger_counts_critical_opponent_neighbours() {
        let grid: Grid = "1b .\n. .".parse().unwrap();

        assert_eq!(danger(&grid, Player::First, Coord::new(1, 0)), 1);
        assert_eq!(danger(&grid, Player::First, Coord::new(0, 1)), 1);
        assert_eq!(danger(&grid, Player::First, Coord::new(1, 1)), 0);
        // Own critical cells are not a threat
        assert_eq!(danger(&grid, Player::Second, Coord::new(1, 0)), 0);
    }

    #[test]
    fn test_endangered_cells() {
        let grid: Grid = "1b 1a\n1a .".parse().unwrap();
        assert_eq!(endangered_cells(&grid, Player::First), 2);
        // Second has a single cell, threatened from both sides
        assert_eq!(endangered_cells(&grid, Player::Second), 1);

        let calm: Grid = "1b . .\n. . .\n. . 1a".parse().unwrap();
        assert_eq!(endangered_cells(&calm, Player::First), 0);
    }

    #[test]
    fn test_score_of_empty_corner() {
        let grid = Grid::new(3, 3).unwrap();
        let evaluator = HeuristicEvaluator::default();

        // 1 cell + 1 atom + corner bonus
        assert_eq!(evaluator.score_move(&grid, Player::First, Coord::new(0, 0)), 3);
        // 1 cell + 1 atom
        assert_eq!(evaluator.score_move(&grid, Player::First, Coord::new(1, 1)), 2);
    }

    #[test]
    fn test_score_penalises_danger() {
        let grid: Grid = "1b . .\n. . .\n. . .".parse().unwrap();
        let evaluator = HeuristicEvaluator::default();

        // Next to a critical opponent corner: 1 + 1 - 4 - 1
        assert_eq!(evaluator.score_move(&grid, Player::First, Coord::new(1, 0)), -3);
    }

    #[test]
    fn test_prefers_capture() {
        let grid: Grid = "1a 1b .\n. . .\n. . .".parse().unwrap();

        for seed in 0..10 {
            assert_eq!(choose(&grid, Player::First, seed, TieBreak::Uniform), Coord::new(0, 0));
        }
    }

    #[test]
    fn test_avoids_dangerous_cells() {
        let grid: Grid = "1b . .\n. . .\n. . .".parse().unwrap();

        for seed in 0..20 {
            let coord = choose(&grid, Player::First, seed, TieBreak::Uniform);
            assert_ne!(coord, Coord::new(1, 0));
            assert_ne!(coord, Coord::new(0, 1));
        }
    }

    #[test]
    fn test_scores_cover_legal_cells() {
        let grid: Grid = "1b .\n. 1a".parse().unwrap();
        let scores = HeuristicEvaluator::default().scores(&grid, Player::First);
        let coords: Vec<_> = scores.iter().map(|(c, _)| *c).collect();
        assert_eq!(coords, grid.legal_cells(Player::First));
    }

    #[test]
    fn test_does_not_touch_input_grid() {
        let grid: Grid = "1a 1b .\n. . .\n. . .".parse().unwrap();
        let before = grid.clone();
        let _ = choose(&grid, Player::First, 1, TieBreak::Uniform);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_cancelled_before_start_returns_first_legal_cell() {
        let grid: Grid = "1b .\n. .".parse().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let coord = HeuristicEvaluator::default()
            .choose_move(&grid, Player::First, &mut GameRng::new(0), &cancel)
            .unwrap();
        assert_eq!(coord, Coord::new(0, 1));
    }

    #[test]
    fn test_no_legal_move() {
        let grid: Grid = "1b 1b\n1b 1b".parse().unwrap();
        let result = HeuristicEvaluator::default().choose_move(
            &grid,
            Player::First,
            &mut GameRng::new(0),
            &CancelToken::new(),
        );
        assert_eq!(
            result,
            Err(EvaluationError::NoLegalMove {
                player: Player::First
            })
        );
    }

    #[test]
    fn test_tie_break_serde_names() {
        assert_eq!(serde_json::to_string(&TieBreak::CoinFlip).unwrap(), "\"coin_flip\"");
        assert_eq!(serde_json::to_string(&TieBreak::Uniform).unwrap(), "\"uniform\"");
    }
}
