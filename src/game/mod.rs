//! Game flow: turn order, win detection and the session driver.
//!
//! - `Game`: one game from the first placement to a winner
//! - `Session`: owns the current game, starts computer evaluations in the
//!   background and maps clicks to moves

pub mod controller;
pub mod session;
pub mod status;

pub use controller::{ComputerTurn, Game};
pub use session::{ClickOutcome, Session};
pub use status::{GameStatus, MoveReport, SeatStatus};
