//! Game configuration.
//!
//! `GameSettings` is read once when a `Game` is constructed: grid shape,
//! RNG seed, the computer's thinking budget and who sits in each seat.
//! Settings come from code (builder methods) or a TOML file:
//!
//! ```toml
//! width = 6
//! height = 5
//! seed = 42
//! evaluation_budget_ms = 1500
//!
//! [first]
//! controller = "human"
//!
//! [second]
//! controller = "computer"
//! policy = "heuristic"
//! tie_break = "uniform"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::player::{Player, PlayerMap};
use crate::ai::TieBreak;
use crate::grid::Grid;

/// Who makes the decisions for a seat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    /// Moves arrive through `Game::select_move`.
    #[default]
    Human,
    /// Moves are chosen by a `MovePolicy`.
    Computer,
}

/// Which move policy a computer seat uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// One-ply lookahead with the danger heuristic.
    #[default]
    Heuristic,
    /// Uniformly random legal cell.
    Random,
}

/// Configuration for one seat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatConfig {
    pub controller: Controller,
    /// Ignored for human seats.
    pub policy: PolicyKind,
    /// Ignored unless `policy` is `Heuristic`.
    pub tie_break: TieBreak,
}

impl SeatConfig {
    /// A human seat.
    #[must_use]
    pub fn human() -> Self {
        Self::default()
    }

    /// A computer seat using the given policy.
    #[must_use]
    pub fn computer(policy: PolicyKind) -> Self {
        Self {
            controller: Controller::Computer,
            policy,
            tie_break: TieBreak::default(),
        }
    }

    /// Set the tie-break rule (builder pattern).
    #[must_use]
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Is this seat played by a computer?
    #[must_use]
    pub fn is_computer(&self) -> bool {
        self.controller == Controller::Computer
    }
}

/// Settings consumed at `Game` construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Grid width (number of columns).
    pub width: usize,

    /// Grid height (number of rows).
    pub height: usize,

    /// Seed for computer tie-breaks.
    /// Same seed and same human moves replay the same game.
    pub seed: u64,

    /// Wall-clock budget for one computer move, in milliseconds.
    pub evaluation_budget_ms: u64,

    /// Seat that moves first.
    pub first: SeatConfig,

    /// Seat that moves second.
    pub second: SeatConfig,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            width: 6,
            height: 5,
            seed: 42,
            evaluation_budget_ms: 1500,
            first: SeatConfig::human(),
            second: SeatConfig::computer(PolicyKind::Heuristic),
        }
    }
}

impl GameSettings {
    /// Parse settings from TOML. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: GameSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check the values a `Game` cannot be built from.
    ///
    /// Games need both dimensions at least 2: a cell on a one-wide board
    /// can have critical mass 1 and explode on the opening placement.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Grid::check_shape(self.width, self.height)?;
        if self.width < 2 || self.height < 2 {
            return Err(ConfigError::NarrowBoard {
                width: self.width,
                height: self.height,
            });
        }
        if self.evaluation_budget_ms == 0 {
            return Err(ConfigError::ZeroBudget);
        }
        Ok(())
    }

    /// Set the grid size.
    #[must_use]
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the per-move evaluation budget.
    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.evaluation_budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Configure a seat.
    #[must_use]
    pub fn with_seat(mut self, player: Player, seat: SeatConfig) -> Self {
        match player {
            Player::First => self.first = seat,
            Player::Second => self.second = seat,
        }
        self
    }

    /// Per-move evaluation budget.
    #[must_use]
    pub fn evaluation_budget(&self) -> Duration {
        Duration::from_millis(self.evaluation_budget_ms)
    }

    /// Seat configuration for a player.
    #[must_use]
    pub fn seat(&self, player: Player) -> SeatConfig {
        self.seats()[player]
    }

    /// Both seats.
    #[must_use]
    pub fn seats(&self) -> PlayerMap<SeatConfig> {
        PlayerMap::new(|player| match player {
            Player::First => self.first,
            Player::Second => self.second,
        })
    }
}
