//! The playing grid.
//!
//! A `Grid` is a fixed `width x height` rectangle of cells. Each cell's
//! critical mass (its number of orthogonal neighbours: 2 in corners, 3 on
//! edges, 4 inside) is computed once at construction and shared between
//! clones.
//!
//! Cells live in an `im::Vector`, so cloning a grid is O(1) and the move
//! evaluator can afford one clone per candidate cell.

use std::str::FromStr;
use std::sync::Arc;

use im::Vector;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::cell::{Cell, Coord};
use crate::core::{GridError, Player};

/// Orthogonal neighbours of a cell, in the fixed order up, down, left, right.
pub type Neighbors = SmallVec<[Coord; 4]>;

/// Rectangular board of cells with precomputed critical masses.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "GridSnapshot", into = "GridSnapshot")]
pub struct Grid {
    width: usize,
    height: usize,
    /// Row-major: index = y * width + x.
    cells: Vector<Cell>,
    critical: Arc<[u32]>,
}

impl Grid {
    /// Create an empty grid.
    ///
    /// Both dimensions must be at least 1 and the grid must have at least
    /// two cells: a lone cell has no neighbours and could never be stable.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        Self::check_shape(width, height)?;

        let critical: Arc<[u32]> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| neighbor_count(width, height, x, y))
            .collect();

        Ok(Self {
            width,
            height,
            cells: std::iter::repeat(Cell::EMPTY).take(width * height).collect(),
            critical,
        })
    }

    /// Validate a grid shape without building it.
    pub fn check_shape(width: usize, height: usize) -> Result<(), GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyDimension { width, height });
        }
        if width * height < 2 {
            return Err(GridError::SingleCell { width, height });
        }
        Ok(())
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    fn index(&self, coord: Coord) -> usize {
        assert!(
            self.in_bounds(coord),
            "coordinate {coord} outside {}x{} grid",
            self.width,
            self.height
        );
        coord.y * self.width + coord.x
    }

    /// Get a cell. Panics if `coord` is out of bounds.
    #[must_use]
    pub fn cell(&self, coord: Coord) -> Cell {
        self.cells[self.index(coord)]
    }

    /// Get a cell, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, coord: Coord) -> Option<Cell> {
        self.in_bounds(coord).then(|| self.cell(coord))
    }

    pub(crate) fn cell_mut(&mut self, coord: Coord) -> &mut Cell {
        let index = self.index(coord);
        &mut self.cells[index]
    }

    /// Overwrite a cell, for setting up positions.
    ///
    /// Panics if the cell breaks the atoms/owner pairing. The result may
    /// be unstable; the engine resolves it on the next `apply`.
    pub fn set_cell(&mut self, coord: Coord, cell: Cell) {
        assert!(cell.is_consistent(), "inconsistent cell {cell:?} at {coord}");
        *self.cell_mut(coord) = cell;
    }

    /// Number of atoms at which the cell at `coord` explodes.
    #[must_use]
    pub fn critical_mass(&self, coord: Coord) -> u32 {
        self.critical[self.index(coord)]
    }

    /// One atom short of exploding.
    #[must_use]
    pub fn is_critical(&self, coord: Coord) -> bool {
        self.cell(coord).atoms + 1 == self.critical_mass(coord)
    }

    /// At or above critical mass.
    #[must_use]
    pub fn is_unstable(&self, coord: Coord) -> bool {
        self.cell(coord).atoms >= self.critical_mass(coord)
    }

    /// No cell is unstable.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.cells
            .iter()
            .zip(self.critical.iter())
            .all(|(cell, &critical)| cell.atoms < critical)
    }

    /// Orthogonal neighbours in the order up, down, left, right.
    #[must_use]
    pub fn neighbors(&self, coord: Coord) -> Neighbors {
        let mut out = Neighbors::new();
        if coord.y > 0 {
            out.push(Coord::new(coord.x, coord.y - 1));
        }
        if coord.y + 1 < self.height {
            out.push(Coord::new(coord.x, coord.y + 1));
        }
        if coord.x > 0 {
            out.push(Coord::new(coord.x - 1, coord.y));
        }
        if coord.x + 1 < self.width {
            out.push(Coord::new(coord.x + 1, coord.y));
        }
        out
    }

    /// Every coordinate, column by column (x outer, y inner).
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let height = self.height;
        (0..self.width).flat_map(move |x| (0..height).map(move |y| Coord::new(x, y)))
    }

    /// Is `coord` at both a horizontal and a vertical edge?
    #[must_use]
    pub fn is_corner(&self, coord: Coord) -> bool {
        (coord.x == 0 || coord.x + 1 == self.width) && (coord.y == 0 || coord.y + 1 == self.height)
    }

    /// Total atoms owned by `player`.
    #[must_use]
    pub fn player_atoms(&self, player: Player) -> u32 {
        self.cells
            .iter()
            .filter(|cell| cell.is_owned_by(player))
            .map(|cell| cell.atoms)
            .sum()
    }

    /// Number of cells owned by `player`.
    #[must_use]
    pub fn player_cells(&self, player: Player) -> usize {
        self.cells.iter().filter(|cell| cell.is_owned_by(player)).count()
    }

    /// Atoms on the whole board.
    #[must_use]
    pub fn total_atoms(&self) -> u32 {
        self.cells.iter().map(|cell| cell.atoms).sum()
    }

    /// May `player` add an atom at `coord`? In bounds and empty or own.
    #[must_use]
    pub fn can_place(&self, player: Player, coord: Coord) -> bool {
        self.get(coord)
            .is_some_and(|cell| cell.owner.map_or(true, |owner| owner == player))
    }

    /// Cells `player` may play, in `coords()` order.
    #[must_use]
    pub fn legal_cells(&self, player: Player) -> Vec<Coord> {
        self.coords().filter(|&c| self.can_place(player, c)).collect()
    }
}

fn neighbor_count(width: usize, height: usize, x: usize, y: usize) -> u32 {
    u32::from(x > 0) + u32::from(x + 1 < width) + u32::from(y > 0) + u32::from(y + 1 < height)
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.cells == other.cells
    }
}

impl Eq for Grid {}

/// Rows top to bottom, `.` for empty cells, otherwise atoms followed by the
/// owner marker (`a` first, `b` second), e.g. `2a`.
impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cell(Coord::new(x, y));
                let token = match cell.owner {
                    Some(owner) => format!("{}{}", cell.atoms, owner.marker()),
                    None => ".".to_string(),
                };
                if x == 0 {
                    write!(f, "{token}")?;
                } else {
                    write!(f, "{token:>3}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parses the `Display` format. Used to set up positions in tests and tools.
impl FromStr for Grid {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<Vec<&str>> = s
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>())
            .filter(|row| !row.is_empty())
            .collect();

        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut grid = Grid::new(width, height)?;

        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(GridError::Parse(format!(
                    "row {y} has {} cells, expected {width}",
                    row.len()
                )));
            }
            for (x, token) in row.iter().enumerate() {
                let cell = parse_cell(token)?;
                *grid.cell_mut(Coord::new(x, y)) = cell;
            }
        }
        Ok(grid)
    }
}

fn parse_cell(token: &str) -> Result<Cell, GridError> {
    if token == "." {
        return Ok(Cell::EMPTY);
    }
    let owner = match token.chars().last() {
        Some('a') => Player::First,
        Some('b') => Player::Second,
        _ => return Err(GridError::Parse(format!("bad cell token {token:?}"))),
    };
    let atoms: u32 = token[..token.len() - 1]
        .parse()
        .map_err(|_| GridError::Parse(format!("bad atom count in {token:?}")))?;
    if atoms == 0 {
        return Err(GridError::Parse(format!("owned cell {token:?} has no atoms")));
    }
    Ok(Cell::owned(owner, atoms))
}

/// Serialized form: shape plus row-major cells. Critical masses are
/// recomputed on load so they always match the shape.
#[derive(Serialize, Deserialize)]
struct GridSnapshot {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl From<Grid> for GridSnapshot {
    fn from(grid: Grid) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            cells: grid.cells.iter().copied().collect(),
        }
    }
}

impl TryFrom<GridSnapshot> for Grid {
    type Error = GridError;

    fn try_from(snapshot: GridSnapshot) -> Result<Self, Self::Error> {
        let mut grid = Grid::new(snapshot.width, snapshot.height)?;
        if snapshot.cells.len() != snapshot.width * snapshot.height {
            return Err(GridError::Parse(format!(
                "{} cells for a {}x{} grid",
                snapshot.cells.len(),
                snapshot.width,
                snapshot.height
            )));
        }
        if let Some(bad) = snapshot.cells.iter().find(|cell| !cell.is_consistent()) {
            return Err(GridError::Parse(format!("inconsistent cell {bad:?}")));
        }
        grid.cells = snapshot.cells.into_iter().collect();
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_masses_3x3() {
        let grid = Grid::new(3, 3).unwrap();
        assert_eq!(grid.critical_mass(Coord::new(0, 0)), 2);
        assert_eq!(grid.critical_mass(Coord::new(2, 2)), 2);
        assert_eq!(grid.critical_mass(Coord::new(1, 0)), 3);
        assert_eq!(grid.critical_mass(Coord::new(0, 1)), 3);
        assert_eq!(grid.critical_mass(Coord::new(1, 1)), 4);
    }

    #[test]
    fn test_critical_masses_single_row() {
        let grid = Grid::new(3, 1).unwrap();
        assert_eq!(grid.critical_mass(Coord::new(0, 0)), 1);
        assert_eq!(grid.critical_mass(Coord::new(1, 0)), 2);
        assert_eq!(grid.critical_mass(Coord::new(2, 0)), 1);
    }

    #[test]
    fn test_rejects_degenerate_shapes() {
        assert_eq!(
            Grid::new(0, 4).unwrap_err(),
            GridError::EmptyDimension { width: 0, height: 4 }
        );
        assert_eq!(
            Grid::new(1, 1).unwrap_err(),
            GridError::SingleCell { width: 1, height: 1 }
        );
        assert!(Grid::new(1, 2).is_ok());
    }

    #[test]
    fn test_neighbor_order() {
        let grid = Grid::new(3, 3).unwrap();
        let center: Vec<_> = grid.neighbors(Coord::new(1, 1)).into_iter().collect();
        assert_eq!(
            center,
            vec![
                Coord::new(1, 0),
                Coord::new(1, 2),
                Coord::new(0, 1),
                Coord::new(2, 1)
            ]
        );

        let corner: Vec<_> = grid.neighbors(Coord::new(0, 0)).into_iter().collect();
        assert_eq!(corner, vec![Coord::new(0, 1), Coord::new(1, 0)]);
    }

    #[test]
    fn test_coords_column_major() {
        let grid = Grid::new(2, 3).unwrap();
        let coords: Vec<_> = grid.coords().collect();
        assert_eq!(coords[0], Coord::new(0, 0));
        assert_eq!(coords[1], Coord::new(0, 1));
        assert_eq!(coords[3], Coord::new(1, 0));
        assert_eq!(coords.len(), 6);
    }

    #[test]
    fn test_counts_and_legality() {
        let grid: Grid = "1a . 2b\n. 1a .".parse().unwrap();

        assert_eq!(grid.player_atoms(Player::First), 2);
        assert_eq!(grid.player_cells(Player::First), 2);
        assert_eq!(grid.player_atoms(Player::Second), 2);
        assert_eq!(grid.total_atoms(), 4);

        assert!(grid.can_place(Player::First, Coord::new(0, 0)));
        assert!(grid.can_place(Player::First, Coord::new(1, 0)));
        assert!(!grid.can_place(Player::First, Coord::new(2, 0)));
        assert!(!grid.can_place(Player::First, Coord::new(3, 0)));
        assert_eq!(grid.legal_cells(Player::Second).len(), 4);
    }

    #[test]
    fn test_critical_and_unstable() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.set_cell(Coord::new(0, 0), Cell::owned(Player::First, 1));
        assert!(grid.is_critical(Coord::new(0, 0)));
        assert!(grid.is_quiescent());

        grid.set_cell(Coord::new(0, 0), Cell::owned(Player::First, 2));
        assert!(grid.is_unstable(Coord::new(0, 0)));
        assert!(!grid.is_quiescent());
    }

    #[test]
    #[should_panic(expected = "inconsistent cell")]
    fn test_set_cell_rejects_inconsistent() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.set_cell(Coord::new(0, 0), Cell::owned(Player::First, 0));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_out_of_bounds_panics() {
        let grid = Grid::new(2, 2).unwrap();
        let _ = grid.cell(Coord::new(2, 0));
    }

    #[test]
    fn test_corners() {
        let grid = Grid::new(4, 3).unwrap();
        assert!(grid.is_corner(Coord::new(0, 0)));
        assert!(grid.is_corner(Coord::new(3, 2)));
        assert!(!grid.is_corner(Coord::new(1, 0)));
        assert!(!grid.is_corner(Coord::new(0, 1)));
    }

    #[test]
    fn test_display_parse_roundtrip() {
        let text = "1a  .\n .  3b\n";
        let grid: Grid = text.parse().unwrap();
        let rendered = grid.to_string();
        assert_eq!(rendered, "1a  .\n. 3b\n");
        assert_eq!(rendered.parse::<Grid>().unwrap(), grid);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("1a .\n.".parse::<Grid>(), Err(GridError::Parse(_))));
        assert!(matches!("1c .".parse::<Grid>(), Err(GridError::Parse(_))));
        assert!(matches!("0a .".parse::<Grid>(), Err(GridError::Parse(_))));
    }

    #[test]
    fn test_clone_is_independent() {
        let grid = Grid::new(3, 3).unwrap();
        let mut copy = grid.clone();
        copy.set_cell(Coord::new(1, 1), Cell::owned(Player::Second, 3));

        assert!(grid.cell(Coord::new(1, 1)).is_empty());
        assert_ne!(grid, copy);
    }

    #[test]
    fn test_serde_recomputes_critical_mass() {
        let grid: Grid = "2b .\n. 1a".parse().unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        let restored: Grid = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, grid);
        assert_eq!(restored.critical_mass(Coord::new(1, 1)), 2);

        let broken = r#"{"width":2,"height":1,"cells":[{"atoms":0,"owner":"First"},{"atoms":0,"owner":null}]}"#;
        assert!(serde_json::from_str::<Grid>(broken).is_err());
    }
}
