//! Grid and cell model.
//!
//! Pure data: per-cell atom count and owner, plus the critical mass each
//! cell derives from its position. Only the reaction engine mutates a live
//! grid; everything else reads it or works on a clone.

mod board;
mod cell;

pub use board::{Grid, Neighbors};
pub use cell::{Cell, Coord};
