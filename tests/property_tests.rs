//! Property-based tests for cascade resolution.
//!
//! Games are generated as sequences of cell picks; each pick is mapped onto
//! the mover's legal cells so every generated game is playable.

use std::sync::Arc;

use proptest::prelude::*;

use chain_reaction::core::Player;
use chain_reaction::grid::{Coord, Grid};
use chain_reaction::reaction::{EventLog, ReactionEngine, ReactionEvent};

/// Play `picks` from an empty board until one side is wiped out. Returns
/// the grid after each move and whether its cascade halted early.
fn play(width: usize, height: usize, picks: &[usize], engine: &ReactionEngine) -> Vec<(Grid, bool)> {
    let mut grid = Grid::new(width, height).unwrap();
    let mut player = Player::First;
    let mut history = Vec::new();

    for (played, &pick) in picks.iter().enumerate() {
        let legal = grid.legal_cells(player);
        let coord = legal[pick % legal.len()];
        let summary = engine.apply(&mut grid, player, coord);
        history.push((grid.clone(), summary.halted_early));
        if played > 0 && grid.player_atoms(player.opponent()) == 0 {
            break;
        }
        player = player.opponent();
    }
    history
}

/// Game-sized boards; one-wide boards are refused by `GameSettings`.
fn shape() -> impl Strategy<Value = (usize, usize)> {
    (2usize..=6, 2usize..=6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every move adds exactly one atom, however far it cascades.
    #[test]
    fn prop_atoms_are_conserved(
        (width, height) in shape(),
        picks in prop::collection::vec(any::<usize>(), 1..60),
    ) {
        let history = play(width, height, &picks, &ReactionEngine::new());
        for (moves, (grid, _)) in history.iter().enumerate() {
            prop_assert_eq!(grid.total_atoms(), moves as u32 + 1);
        }
    }

    /// Unless the cascade stopped because a side was wiped out, the board
    /// is left with every cell below its critical mass.
    #[test]
    fn prop_cascades_settle(
        (width, height) in shape(),
        picks in prop::collection::vec(any::<usize>(), 1..60),
    ) {
        for (grid, halted_early) in play(width, height, &picks, &ReactionEngine::new()) {
            prop_assert_eq!(grid.is_quiescent(), !halted_early);
        }
    }

    /// Owned cells always hold atoms; empty cells never do.
    #[test]
    fn prop_cells_stay_consistent(
        (width, height) in shape(),
        picks in prop::collection::vec(any::<usize>(), 1..60),
    ) {
        for (grid, _) in play(width, height, &picks, &ReactionEngine::new()) {
            for coord in grid.coords() {
                prop_assert!(grid.cell(coord).is_consistent(), "bad cell at {}", coord);
            }
        }
    }

    /// The same moves give the same boards and the same event stream.
    #[test]
    fn prop_resolution_is_deterministic(
        (width, height) in shape(),
        picks in prop::collection::vec(any::<usize>(), 1..40),
    ) {
        let run = || {
            let log = Arc::new(EventLog::new());
            let mut engine = ReactionEngine::new();
            engine.add_observer(log.clone());
            let grids: Vec<Grid> = play(width, height, &picks, &engine)
                .into_iter()
                .map(|(grid, _)| grid)
                .collect();
            (grids, log.take())
        };
        prop_assert_eq!(run(), run());
    }

    /// Every transfer goes between orthogonal neighbours.
    #[test]
    fn prop_transfers_are_orthogonal(
        (width, height) in shape(),
        picks in prop::collection::vec(any::<usize>(), 1..40),
    ) {
        let log = Arc::new(EventLog::new());
        let mut engine = ReactionEngine::new();
        engine.add_observer(log.clone());
        play(width, height, &picks, &engine);

        for event in log.events() {
            if let ReactionEvent::AtomsMoved(moves) = event {
                for mv in moves {
                    let distance = mv.from.x.abs_diff(mv.to.x) + mv.from.y.abs_diff(mv.to.y);
                    prop_assert_eq!(distance, 1, "non-adjacent transfer {}", mv);
                    prop_assert!(mv.to.x < width && mv.to.y < height);
                }
            }
        }
    }
}

#[test]
fn test_corner_bonus_cells() {
    let grid = Grid::new(4, 3).unwrap();
    let corners: Vec<Coord> = grid.coords().filter(|&c| grid.is_corner(c)).collect();
    assert_eq!(
        corners,
        vec![Coord::new(0, 0), Coord::new(0, 2), Coord::new(3, 0), Coord::new(3, 2)]
    );
}
