//! Core types shared by every layer: players, RNG, configuration, errors.

pub mod config;
pub mod error;
pub mod player;
pub mod rng;

pub use config::{Controller, GameSettings, PolicyKind, SeatConfig};
pub use error::{ConfigError, EvaluationError, GridError, MoveRejected, SelfPlayError, TurnError};
pub use player::{Player, PlayerMap};
pub use rng::GameRng;
