//! Headless self-play
//!
//! Plays computer-vs-computer games and prints the tally.

use std::path::PathBuf;
use std::process::ExitCode;

use chain_reaction::core::GameSettings;
use chain_reaction::selfplay::{play_games, SelfPlayConfig};
use clap::Parser;

/// Chain reaction self-play - computer vs computer
#[derive(Parser, Debug)]
#[command(name = "selfplay")]
#[command(about = "Play computer-vs-computer chain reaction games and report the results")]
struct Args {
    /// TOML settings file (grid size, seed, seats, budget)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Base seed; overrides the settings file
    #[arg(long)]
    seed: Option<u64>,

    /// Grid width; overrides the settings file
    #[arg(long)]
    width: Option<usize>,

    /// Grid height; overrides the settings file
    #[arg(long)]
    height: Option<usize>,

    /// Games still open after this many moves count as unfinished
    #[arg(long, default_value_t = 500)]
    max_moves: u32,

    /// Print the final board of every game
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chain_reaction=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => match GameSettings::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => GameSettings::default(),
    };
    if let Some(seed) = args.seed {
        settings = settings.with_seed(seed);
    }
    if args.width.is_some() || args.height.is_some() {
        let width = args.width.unwrap_or(settings.width);
        let height = args.height.unwrap_or(settings.height);
        settings = settings.with_size(width, height);
    }

    let config = SelfPlayConfig::new()
        .with_games(args.games)
        .with_max_moves(args.max_moves);

    let result = play_games(&settings, &config, |index, record| {
        let outcome = match record.winner {
            Some(winner) => format!("{winner} wins"),
            None => "unfinished".to_string(),
        };
        println!("game {:>3}  seed {:<20}  {:>4} moves  {outcome}", index + 1, record.seed, record.len());
        if args.verbose || index + 1 == args.games {
            println!("{}", record.final_grid);
        }
    });

    match result {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
