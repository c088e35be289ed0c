//! Command line entry point for the Zugol ladder
//!
//! Offers the rank and pairing calculations directly and can replay a ladder
//! scenario file through the ladder service.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use zugol::config::AppConfig;
use zugol::ladder::{
    ActivityFilter, InMemoryLadderStore, LadderService, SortDirection, SortField, StandingsSort,
};
use zugol::pairing::{cell_rating_difference, PairingCalculator, TablePosition};
use zugol::rank::{rank_to_rating, rating_to_rank};
use zugol::types::{GameSubmission, PairedPlayer, RatingPoints, Winner};
use zugol::utils::reverse_komi_hint;

/// Zugol - Go ladder ranks, handicaps and komi
#[derive(Parser)]
#[command(
    name = "zugol",
    version,
    about = "Go ladder tracker: rank conversion, rank hysteresis and handicap/komi pairing"
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        global = true,
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, global = true, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the rank for a number of rating points
    Rank { points: RatingPoints },
    /// Show the starting rating for a self-reported rank
    Seed { rank: String },
    /// Compute game settings for two ratings
    Pair { first: RatingPoints, second: RatingPoints },
    /// Print the handicap/komi reference table
    Table {
        /// Rating difference to highlight
        #[arg(long)]
        highlight: Option<RatingPoints>,
    },
    /// Replay a ladder scenario and print the standings
    Simulate {
        scenario: PathBuf,
        /// Activity filter: all, 1month, 3months, 6months, 1year
        #[arg(long, default_value = "6months")]
        filter: ActivityFilter,
        /// Sort field: rating, name, last-game
        #[arg(long, default_value = "rating")]
        sort: SortField,
        /// Sort ascending instead of descending
        #[arg(long)]
        ascending: bool,
    },
}

/// Players and games to replay through the ladder
#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    players: Vec<ScenarioPlayer>,
    #[serde(default)]
    games: Vec<ScenarioGame>,
}

#[derive(Debug, Deserialize)]
struct ScenarioPlayer {
    name: String,
    rank: String,
}

#[derive(Debug, Deserialize)]
struct ScenarioGame {
    black: String,
    white: String,
    winner: Winner,
    #[serde(default)]
    played_at: Option<DateTime<Utc>>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Serialize)]
struct RankOutput {
    points: RatingPoints,
    rank: String,
}

#[derive(Serialize)]
struct SeedOutput {
    rank: String,
    points: RatingPoints,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load configuration and apply CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(config_path) => AppConfig::from_file(config_path)?,
        None => AppConfig::from_env()?,
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_table(calculator: &PairingCalculator, highlight: Option<TablePosition>) -> String {
    let mut out = String::new();
    out.push_str("Points difference (rows: handicap stones, bottom: komi)\n");

    for (row_index, row) in calculator.rating_table().iter().enumerate() {
        for col_index in 0..row.komi_values.len() {
            let diff = cell_rating_difference(row_index, col_index);
            let cell = if highlight
                == Some(TablePosition {
                    handicap_stones: row.handicap_stones,
                    komi_index: col_index,
                }) {
                format!("[{}]", diff)
            } else {
                diff.to_string()
            };
            out.push_str(&format!("{:>6}", cell));
        }
        out.push_str(&format!("  | {}\n", row.handicap_stones));
    }

    if let Some(row) = calculator.rating_table().first() {
        for komi in &row.komi_values {
            out.push_str(&format!("{:>6}", komi.to_string()));
        }
        out.push_str("  | komi\n");
    }

    out
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse scenario {}", path.display()))
}

async fn run_simulation(
    config: &AppConfig,
    scenario: Scenario,
    filter: ActivityFilter,
    sort: StandingsSort,
    json: bool,
) -> Result<()> {
    let store = Arc::new(InMemoryLadderStore::new());
    let service = LadderService::new(store, config.ladder.clone())?;

    let mut ids = HashMap::new();
    for entry in &scenario.players {
        let player = service.register_player(&entry.name, &entry.rank).await?;
        ids.insert(entry.name.clone(), player.id);
    }

    let lookup = |name: &str| {
        ids.get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Scenario game references unknown player {}", name))
    };

    for game in scenario.games {
        let report = service
            .record_game(GameSubmission {
                black_player_id: lookup(&game.black)?,
                white_player_id: lookup(&game.white)?,
                winner: game.winner,
                played_at: game.played_at,
                notes: game.notes,
            })
            .await?;

        for (name, update) in [
            (&game.black, &report.black_update),
            (&game.white, &report.white_update),
        ] {
            if update.rank_changed && !json {
                println!(
                    "{} is now {} ({} points)",
                    name, update.state.last_rank_reached, update.state.rating_points
                );
            }
        }
    }

    let standings = service.standings(filter, sort, Utc::now()).await?;
    if json {
        return print_json(&standings);
    }

    println!("{:>4}  {:<20} {:>6}  {:<5} last game", "#", "name", "points", "rank");
    for row in standings {
        let last_game = row
            .last_game_played
            .map(|played| played.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}  {:<20} {:>6}  {:<5} {}",
            row.position,
            row.name,
            row.rating_points,
            row.display_rank.to_string(),
            last_game
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let calculator = PairingCalculator::new(config.ladder.pairing_config())?;

    match args.command {
        Command::Rank { points } => {
            let rank = rating_to_rank(points).to_string();
            if args.json {
                print_json(&RankOutput { points, rank })?;
            } else {
                println!("{} points = {}", points, rank);
            }
        }
        Command::Seed { rank } => {
            let points = rank_to_rating(&rank)?;
            if args.json {
                print_json(&SeedOutput { rank, points })?;
            } else {
                println!("{} starts at {} points", rank, points);
            }
        }
        Command::Pair { first, second } => {
            let first = PairedPlayer {
                id: "first".to_string(),
                name: "First".to_string(),
                rating_points: first,
            };
            let second = PairedPlayer {
                id: "second".to_string(),
                name: "Second".to_string(),
                rating_points: second,
            };
            let settings = calculator.compute_settings(&first, &second)?;

            if args.json {
                print_json(&settings)?;
            } else {
                if settings.is_nigiri {
                    println!("Equal ratings: decide colors by nigiri");
                }
                println!(
                    "Black: {} ({} points, {})",
                    settings.black_player.name,
                    settings.black_player.rating_points,
                    rating_to_rank(settings.black_player.rating_points)
                );
                println!(
                    "White: {} ({} points, {})",
                    settings.white_player.name,
                    settings.white_player.rating_points,
                    rating_to_rank(settings.white_player.rating_points)
                );
                println!("Rating difference: {}", settings.rating_difference);
                println!("Handicap stones: {}", settings.handicap_stones);
                println!("Komi: {}", settings.komi);
                if let Some(hint) = reverse_komi_hint(settings.komi) {
                    println!("  {}", hint);
                }
            }
        }
        Command::Table { highlight } => {
            let position = highlight.and_then(|diff| calculator.table_position(diff));
            if args.json {
                print_json(&calculator.rating_table())?;
            } else {
                print!("{}", render_table(&calculator, position));
            }
        }
        Command::Simulate {
            scenario,
            filter,
            sort,
            ascending,
        } => {
            info!("Replaying scenario {}", scenario.display());
            let scenario = load_scenario(&scenario)?;
            let sort = StandingsSort {
                field: sort,
                direction: if ascending {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                },
            };
            run_simulation(&config, scenario, filter, sort, args.json).await?;
        }
    }

    Ok(())
}
