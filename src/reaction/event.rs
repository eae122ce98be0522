//! Reaction events and observers.
//!
//! The engine reports everything it does to the grid as a stream of
//! `ReactionEvent`s. Renderers and loggers implement `ReactionObserver`;
//! `EventLog` records the stream for tests and replays.
//!
//! ## Ordering
//!
//! For one `apply` call observers receive:
//! 1. `AtomAdded` for the placement (a first atom also claims the cell)
//! 2. per cascade generation, one `AtomsMoved` batch, then the
//!    `CellCleared` events of cells that emptied, then `OwnerChanged`
//!    events of cells that switched owner
//!
//! All of it is delivered before `apply` returns.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::core::Player;
use crate::grid::Coord;

/// One atom carried from an exploding cell to a neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
    /// Owner of the exploding cell, and so of the atom.
    pub player: Player,
}

impl Move {
    #[must_use]
    pub const fn new(from: Coord, to: Coord, player: Player) -> Self {
        Self { from, to, player }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A state change made by the reaction engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionEvent {
    /// `player` placed an atom at `coord`.
    AtomAdded { player: Player, coord: Coord },
    /// Every transfer of one cascade generation.
    AtomsMoved(Vec<Move>),
    /// `coord` now belongs to `player`.
    OwnerChanged { player: Player, coord: Coord },
    /// `coord` exploded down to zero atoms.
    CellCleared { coord: Coord },
}

impl ReactionEvent {
    /// Deliver this event to the matching observer method.
    pub fn dispatch(&self, observer: &dyn ReactionObserver) {
        match self {
            ReactionEvent::AtomAdded { player, coord } => observer.on_atom_added(*player, *coord),
            ReactionEvent::AtomsMoved(moves) => observer.on_atoms_moved(moves),
            ReactionEvent::OwnerChanged { player, coord } => {
                observer.on_owner_changed(*player, *coord);
            }
            ReactionEvent::CellCleared { coord } => observer.on_cell_cleared(*coord),
        }
    }
}

/// Receives reaction events synchronously, in registration order.
///
/// All methods default to no-ops. Observers must not touch the game from
/// inside a callback.
pub trait ReactionObserver: Send + Sync {
    fn on_atom_added(&self, _player: Player, _coord: Coord) {}

    /// Called once per cascade generation.
    fn on_atoms_moved(&self, _moves: &[Move]) {}

    fn on_owner_changed(&self, _player: Player, _coord: Coord) {}

    fn on_cell_cleared(&self, _coord: Coord) {}
}

/// Observer that records every event it receives.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<ReactionEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ReactionEvent> {
        self.lock().clone()
    }

    /// Take the recorded events, leaving the log empty.
    pub fn take(&self) -> Vec<ReactionEvent> {
        std::mem::take(&mut *self.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The `AtomsMoved` batches, one per generation.
    #[must_use]
    pub fn move_batches(&self) -> Vec<Vec<Move>> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ReactionEvent::AtomsMoved(moves) => Some(moves.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ReactionEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ReactionEvent>> {
        // A panicking observer elsewhere must not hide the log
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ReactionObserver for EventLog {
    fn on_atom_added(&self, player: Player, coord: Coord) {
        self.push(ReactionEvent::AtomAdded { player, coord });
    }

    fn on_atoms_moved(&self, moves: &[Move]) {
        self.push(ReactionEvent::AtomsMoved(moves.to_vec()));
    }

    fn on_owner_changed(&self, player: Player, coord: Coord) {
        self.push(ReactionEvent::OwnerChanged { player, coord });
    }

    fn on_cell_cleared(&self, coord: Coord) {
        self.push(ReactionEvent::CellCleared { coord });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_roundtrip() {
        let log = EventLog::new();
        let events = vec![
            ReactionEvent::AtomAdded {
                player: Player::First,
                coord: Coord::new(0, 0),
            },
            ReactionEvent::AtomsMoved(vec![Move::new(
                Coord::new(0, 0),
                Coord::new(1, 0),
                Player::First,
            )]),
            ReactionEvent::CellCleared {
                coord: Coord::new(0, 0),
            },
            ReactionEvent::OwnerChanged {
                player: Player::First,
                coord: Coord::new(1, 0),
            },
        ];

        for event in &events {
            event.dispatch(&log);
        }

        assert_eq!(log.events(), events);
        assert_eq!(log.move_batches().len(), 1);
    }

    #[test]
    fn test_take_empties_log() {
        let log = EventLog::new();
        log.on_cell_cleared(Coord::new(1, 1));
        assert_eq!(log.len(), 1);

        let taken = log.take();
        assert_eq!(taken.len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_default_observer_ignores_everything() {
        struct Silent;
        impl ReactionObserver for Silent {}

        ReactionEvent::CellCleared {
            coord: Coord::new(0, 0),
        }
        .dispatch(&Silent);
    }

    #[test]
    fn test_event_serde() {
        let event = ReactionEvent::AtomsMoved(vec![Move::new(
            Coord::new(0, 1),
            Coord::new(0, 0),
            Player::Second,
        )]);
        let json = serde_json::to_string(&event).unwrap();
        let restored: ReactionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, restored);
    }
}
