//! Cascade resolution.
//!
//! `ReactionEngine::apply` adds one atom and resolves every explosion it
//! causes, generation by generation, until the grid is quiescent:
//!
//! 1. Snapshot all unstable cells (scan order: x outer, y inner).
//! 2. Debit each of them by its critical mass; a cell left with zero
//!    atoms is cleared.
//! 3. Credit one atom to every neighbour (up, down, left, right), which
//!    takes the exploding player's colour.
//! 4. Repeat while any cell is unstable.
//!
//! Debiting every exploding cell before crediting any neighbour makes the
//! outcome independent of iteration order and keeps the atom count exact.
//! If the opponent has no atoms left after a generation, the cascade stops:
//! the game is decided and an all-one-colour board may never settle.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::event::{Move, ReactionEvent, ReactionObserver};
use crate::core::Player;
use crate::grid::{Coord, Grid};

/// What one `apply` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSummary {
    /// Cascade generations run (0 if the placement did not explode).
    pub generations: u32,
    /// Atoms carried between cells.
    pub transfers: usize,
    /// Stopped because the opponent was wiped out while cells were still
    /// unstable.
    pub halted_early: bool,
}

/// Applies placements to a grid and notifies observers.
///
/// Not synchronized: callers guarantee exclusive access to the grid for
/// the duration of `apply`.
#[derive(Clone, Default)]
pub struct ReactionEngine {
    observers: Vec<Arc<dyn ReactionObserver>>,
}

impl std::fmt::Debug for ReactionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionEngine")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ReactionEngine {
    /// An engine with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Observers are called in registration order.
    pub fn add_observer(&mut self, observer: Arc<dyn ReactionObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Place one atom of `player` at `coord` and resolve the cascade.
    ///
    /// # Panics
    ///
    /// If `coord` is out of bounds or owned by the other player. Turn
    /// legality is the controller's job; reaching here with an illegal
    /// placement is a bug in the caller.
    pub fn apply(&self, grid: &mut Grid, player: Player, coord: Coord) -> ReactionSummary {
        assert!(
            grid.in_bounds(coord),
            "placement at {coord} outside {}x{} grid",
            grid.width(),
            grid.height()
        );
        assert!(
            grid.can_place(player, coord),
            "{player} cannot place on {coord} owned by {:?}",
            grid.cell(coord).owner
        );

        let cell = grid.cell_mut(coord);
        cell.atoms += 1;
        cell.owner = Some(player);
        self.emit(&ReactionEvent::AtomAdded { player, coord });

        self.resolve(grid, player)
    }

    /// Run cascade generations until the grid is quiescent or `player`'s
    /// opponent has no atoms left.
    pub fn resolve(&self, grid: &mut Grid, player: Player) -> ReactionSummary {
        let mut summary = ReactionSummary::default();

        loop {
            let unstable: Vec<(Coord, Player)> = grid
                .coords()
                .filter(|&c| grid.is_unstable(c))
                .filter_map(|c| grid.cell(c).owner.map(|owner| (c, owner)))
                .collect();
            if unstable.is_empty() {
                break;
            }
            summary.generations += 1;

            let mut moves = Vec::new();
            let mut follow_ups = Vec::new();

            for &(source, owner) in &unstable {
                let critical = grid.critical_mass(source);
                let cell = grid.cell_mut(source);
                cell.atoms -= critical;
                if cell.atoms == 0 {
                    cell.owner = None;
                    follow_ups.push(ReactionEvent::CellCleared { coord: source });
                }
                moves.extend(
                    grid.neighbors(source)
                        .into_iter()
                        .map(|target| Move::new(source, target, owner)),
                );
            }

            for mv in &moves {
                let target = grid.cell_mut(mv.to);
                target.atoms += 1;
                if target.owner != Some(mv.player) {
                    target.owner = Some(mv.player);
                    follow_ups.push(ReactionEvent::OwnerChanged {
                        player: mv.player,
                        coord: mv.to,
                    });
                }
            }

            trace!(
                generation = summary.generations,
                exploded = unstable.len(),
                transfers = moves.len(),
                "cascade generation"
            );
            summary.transfers += moves.len();

            self.emit(&ReactionEvent::AtomsMoved(moves));
            for event in &follow_ups {
                self.emit(event);
            }

            if grid.player_atoms(player.opponent()) == 0 {
                summary.halted_early = !grid.is_quiescent();
                break;
            }
        }

        summary
    }

    fn emit(&self, event: &ReactionEvent) {
        for observer in &self.observers {
            event.dispatch(observer.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::reaction::EventLog;

    fn logged_engine() -> (ReactionEngine, Arc<EventLog>) {
        let log = Arc::new(EventLog::new());
        let mut engine = ReactionEngine::new();
        engine.add_observer(log.clone());
        (engine, log)
    }

    #[test]
    fn test_first_atom_in_corner_is_stable() {
        let (engine, log) = logged_engine();
        let mut grid = Grid::new(3, 3).unwrap();

        let summary = engine.apply(&mut grid, Player::First, Coord::new(0, 0));

        assert_eq!(grid.cell(Coord::new(0, 0)), Cell::owned(Player::First, 1));
        assert_eq!(summary, ReactionSummary::default());
        assert_eq!(
            log.events(),
            vec![ReactionEvent::AtomAdded {
                player: Player::First,
                coord: Coord::new(0, 0)
            }]
        );
    }

    #[test]
    fn test_corner_explodes_into_neighbours() {
        let (engine, log) = logged_engine();
        let mut grid: Grid = "1a . .\n. . .\n. . 1b".parse().unwrap();

        let summary = engine.apply(&mut grid, Player::First, Coord::new(0, 0));

        assert_eq!(grid.cell(Coord::new(0, 0)), Cell::EMPTY);
        assert_eq!(grid.cell(Coord::new(0, 1)), Cell::owned(Player::First, 1));
        assert_eq!(grid.cell(Coord::new(1, 0)), Cell::owned(Player::First, 1));
        assert_eq!(summary.generations, 1);
        assert_eq!(summary.transfers, 2);
        assert!(!summary.halted_early);

        let origin = Coord::new(0, 0);
        assert_eq!(
            log.events(),
            vec![
                ReactionEvent::AtomAdded {
                    player: Player::First,
                    coord: origin
                },
                ReactionEvent::AtomsMoved(vec![
                    Move::new(origin, Coord::new(0, 1), Player::First),
                    Move::new(origin, Coord::new(1, 0), Player::First),
                ]),
                ReactionEvent::CellCleared { coord: origin },
                ReactionEvent::OwnerChanged {
                    player: Player::First,
                    coord: Coord::new(0, 1)
                },
                ReactionEvent::OwnerChanged {
                    player: Player::First,
                    coord: Coord::new(1, 0)
                },
            ]
        );
    }

    #[test]
    fn test_explosion_converts_opponent_cells() {
        let (engine, _log) = logged_engine();
        let mut grid: Grid = "1a 1b .\n1b . .\n. . 1b".parse().unwrap();

        engine.apply(&mut grid, Player::First, Coord::new(0, 0));

        assert_eq!(grid.cell(Coord::new(1, 0)), Cell::owned(Player::First, 2));
        assert_eq!(grid.cell(Coord::new(0, 1)), Cell::owned(Player::First, 2));
        assert_eq!(grid.player_atoms(Player::Second), 1);
    }

    #[test]
    fn test_two_generation_chain_emits_two_batches() {
        let (engine, log) = logged_engine();
        // (0,0) explodes into (1,0), which then reaches 3 and explodes too
        let mut grid: Grid = "1a 2a .\n. . .\n. . 1b".parse().unwrap();

        let summary = engine.apply(&mut grid, Player::First, Coord::new(0, 0));

        assert_eq!(summary.generations, 2);
        let batches = log.move_batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert!(batches[1].iter().all(|m| m.from == Coord::new(1, 0)));
        assert_eq!(batches[1].len(), 3);
        assert!(grid.is_quiescent());
    }

    #[test]
    fn test_simultaneous_explosions_keep_surplus() {
        let engine = ReactionEngine::new();
        // Both corners of the top row explode in the same generation, and
        // the middle cell receives two atoms at once.
        let mut grid: Grid = "2a 2a 2a\n. . .\n. . 1b".parse().unwrap();
        let before = grid.total_atoms();

        engine.apply(&mut grid, Player::First, Coord::new(1, 0));

        assert_eq!(grid.total_atoms(), before + 1);
        assert!(grid.is_quiescent());
    }

    #[test]
    fn test_halts_when_opponent_wiped_out() {
        let engine = ReactionEngine::new();
        // The first explosion captures Second's only atom and leaves two
        // unstable cells behind; the cascade stops there.
        let mut grid: Grid = "1a 1b\n1a 1a".parse().unwrap();

        let summary = engine.apply(&mut grid, Player::First, Coord::new(0, 0));

        assert_eq!(grid.player_atoms(Player::Second), 0);
        assert_eq!(summary.generations, 1);
        assert!(summary.halted_early);
        assert!(!grid.is_quiescent());
        assert_eq!(grid.total_atoms(), 5);
    }

    #[test]
    fn test_observers_called_in_registration_order() {
        struct Tagger {
            tag: u8,
            sink: Arc<std::sync::Mutex<Vec<u8>>>,
        }
        impl ReactionObserver for Tagger {
            fn on_atom_added(&self, _player: Player, _coord: Coord) {
                self.sink.lock().unwrap().push(self.tag);
            }
        }

        let sink = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut engine = ReactionEngine::new();
        for tag in [1, 2, 3] {
            engine.add_observer(Arc::new(Tagger {
                tag,
                sink: sink.clone(),
            }));
        }

        let mut grid = Grid::new(2, 2).unwrap();
        engine.apply(&mut grid, Player::Second, Coord::new(1, 1));

        assert_eq!(*sink.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(engine.observer_count(), 3);
    }

    #[test]
    #[should_panic(expected = "cannot place")]
    fn test_placing_on_opponent_cell_panics() {
        let engine = ReactionEngine::new();
        let mut grid: Grid = "1b .\n. .".parse().unwrap();
        engine.apply(&mut grid, Player::First, Coord::new(0, 0));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_out_of_bounds_panics() {
        let engine = ReactionEngine::new();
        let mut grid = Grid::new(2, 2).unwrap();
        engine.apply(&mut grid, Player::First, Coord::new(5, 0));
    }
}
