//! Headless computer-vs-computer games.
//!
//! Useful for comparing policies and for soak-testing the engine: every
//! game is driven through `Game::play_computer_turn`, so the same rules,
//! runner and budget apply as in an interactive session.

use serde::Serialize;
use tracing::{debug, info};

use crate::ai::BoundedRunner;
use crate::core::{GameSettings, Player, PlayerMap, SeatConfig, SelfPlayError};
use crate::game::Game;
use crate::grid::{Coord, Grid};

/// Configuration for a batch of self-play games.
#[derive(Clone, Debug)]
pub struct SelfPlayConfig {
    /// Number of games to play.
    pub games: usize,

    /// Games still open after this many moves are counted as unfinished.
    pub max_moves: u32,

    /// Added to the settings seed; game `i` uses `seed + seed_offset + i`.
    pub seed_offset: u64,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            games: 10,
            max_moves: 500,
            seed_offset: 0,
        }
    }
}

impl SelfPlayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_games(mut self, games: usize) -> Self {
        self.games = games;
        self
    }

    pub fn with_max_moves(mut self, max: u32) -> Self {
        self.max_moves = max;
        self
    }

    pub fn with_seed_offset(mut self, offset: u64) -> Self {
        self.seed_offset = offset;
        self
    }
}

/// One finished (or abandoned) game.
#[derive(Clone, Debug, Serialize)]
pub struct GameRecord {
    pub seed: u64,
    pub winner: Option<Player>,
    /// Cells played, in order.
    pub moves: Vec<Coord>,
    pub final_grid: Grid,
}

impl GameRecord {
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Aggregate over a batch of games.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SelfPlaySummary {
    pub games: usize,
    pub wins: PlayerMap<u32>,
    pub unfinished: usize,
    pub total_moves: usize,
}

impl SelfPlaySummary {
    /// Add a game to the totals.
    pub fn record(&mut self, record: &GameRecord) {
        self.games += 1;
        self.total_moves += record.len();
        match record.winner {
            Some(winner) => self.wins[winner] += 1,
            None => self.unfinished += 1,
        }
    }

    /// Mean game length in moves.
    #[must_use]
    pub fn avg_moves(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_moves as f64 / self.games as f64
        }
    }
}

impl std::fmt::Display for SelfPlaySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "games:      {}", self.games)?;
        for (player, wins) in self.wins.iter() {
            writeln!(f, "{player} wins: {wins}")?;
        }
        writeln!(f, "unfinished: {}", self.unfinished)?;
        write!(f, "avg moves:  {:.1}", self.avg_moves())
    }
}

/// Human seats are replaced by the default computer seat.
fn computer_seats(mut settings: GameSettings) -> GameSettings {
    for player in Player::ALL {
        if !settings.seat(player).is_computer() {
            settings = settings.with_seat(player, SeatConfig::computer(Default::default()));
        }
    }
    settings
}

/// Play one game with both seats on the computer.
pub fn play_game(settings: GameSettings, config: &SelfPlayConfig) -> Result<GameRecord, SelfPlayError> {
    let settings = computer_seats(settings);
    let seed = settings.seed;
    let runner = BoundedRunner::new(settings.evaluation_budget());
    let mut game = Game::new(settings)?;
    let mut moves = Vec::new();

    while !game.is_over() && game.moves_played() < config.max_moves {
        let report = game
            .play_computer_turn(&runner)
            .map_err(|source| SelfPlayError::Turn { game: 0, source })?;
        moves.push(report.coord);
    }

    debug!(seed, winner = ?game.winner(), moves = moves.len(), "self-play game finished");

    Ok(GameRecord {
        seed,
        winner: game.winner(),
        moves,
        final_grid: game.grid().clone(),
    })
}

/// Play `config.games` games and aggregate the results. `on_game` sees
/// every record as it completes.
pub fn play_games(
    settings: &GameSettings,
    config: &SelfPlayConfig,
    mut on_game: impl FnMut(usize, &GameRecord),
) -> Result<SelfPlaySummary, SelfPlayError> {
    settings.validate()?;
    let mut summary = SelfPlaySummary::default();

    for index in 0..config.games {
        let seed = settings
            .seed
            .wrapping_add(config.seed_offset)
            .wrapping_add(index as u64);
        let record = play_game(settings.clone().with_seed(seed), config).map_err(|err| match err {
            SelfPlayError::Turn { source, .. } => SelfPlayError::Turn { game: index, source },
            other => other,
        })?;
        on_game(index, &record);
        summary.record(&record);
    }

    info!(
        games = summary.games,
        first = summary.wins[Player::First],
        second = summary.wins[Player::Second],
        unfinished = summary.unfinished,
        "self-play finished"
    );
    Ok(summary)
}
