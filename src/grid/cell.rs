//! Cells and coordinates.

use serde::{Deserialize, Serialize};

use crate::core::Player;

/// A position on the grid. `x` is the column, `y` the row; `(0, 0)` is the
/// top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl From<(usize, usize)> for Coord {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Contents of one grid square.
///
/// `atoms == 0` exactly when `owner` is `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub atoms: u32,
    pub owner: Option<Player>,
}

impl Cell {
    /// An unclaimed cell.
    pub const EMPTY: Cell = Cell {
        atoms: 0,
        owner: None,
    };

    /// A cell holding `atoms` atoms of `owner`.
    #[must_use]
    pub const fn owned(owner: Player, atoms: u32) -> Self {
        Self {
            atoms,
            owner: Some(owner),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms == 0
    }

    /// Does the atoms/owner pairing hold?
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        (self.atoms == 0) == self.owner.is_none()
    }

    /// Is this cell owned by `player`?
    #[must_use]
    pub fn is_owned_by(&self, player: Player) -> bool {
        self.owner == Some(player)
    }
}
